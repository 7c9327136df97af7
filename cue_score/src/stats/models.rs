//! Statistics data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, btree_map};
use uuid::Uuid;

use crate::game::{Mode, Player, entities::percentage, state_machine::MatchState};

/// Weight of the win rate in the combined score; accuracy gets the rest.
const WIN_RATE_WEIGHT: f64 = 0.7;

/// Cumulative record for one tracked player.
///
/// Every counter only grows, except when all statistics are reset.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPlayerStats {
    pub total_shots: u64,
    pub total_pocketed: u64,
    pub games_played: u64,
    pub games_won: u64,
    pub total_game_time_seconds: u64,
}

impl GlobalPlayerStats {
    /// Pocketed balls per shot, as a percentage.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        percentage(self.total_pocketed, self.total_shots)
    }

    #[must_use]
    pub fn win_rate(&self) -> f64 {
        percentage(self.games_won, self.games_played)
    }

    /// 70% win rate plus 30% accuracy. Used to pick the best player.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.win_rate() * WIN_RATE_WEIGHT + self.accuracy() * (1.0 - WIN_RATE_WEIGHT)
    }

    #[must_use]
    pub fn accuracy_display(&self) -> String {
        format!("{:.1}", self.accuracy())
    }

    #[must_use]
    pub fn win_rate_display(&self) -> String {
        format!("{:.1}", self.win_rate())
    }
}

/// Player name to cumulative record. Serialized as a flat JSON object.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GlobalStats(BTreeMap<String, GlobalPlayerStats>);

impl GlobalStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` means the player has no record.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GlobalPlayerStats> {
        self.0.get(name)
    }

    /// Record for `name`, created with zeros on first sight.
    pub fn entry(&mut self, name: &str) -> &mut GlobalPlayerStats {
        self.0.entry(name.to_string()).or_default()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, GlobalPlayerStats> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Everyone ranked by games won, most first. Ties go alphabetically.
    #[must_use]
    pub fn leaderboard(&self) -> Vec<RankedPlayer> {
        let mut ranked: Vec<_> = self.0.iter().collect();
        // BTreeMap iteration is already alphabetical and the sort is stable.
        ranked.sort_by(|a, b| b.1.games_won.cmp(&a.1.games_won));
        ranked
            .into_iter()
            .enumerate()
            .map(|(i, (name, stats))| RankedPlayer {
                rank: i + 1,
                name: name.clone(),
                stats: *stats,
            })
            .collect()
    }

    #[must_use]
    pub fn top(&self, n: usize) -> Vec<RankedPlayer> {
        let mut board = self.leaderboard();
        board.truncate(n);
        board
    }

    /// Highest combined score. On a tie the alphabetically first name wins.
    #[must_use]
    pub fn best_player(&self) -> Option<RankedPlayer> {
        self.0
            .iter()
            .fold(None, |best: Option<(&String, &GlobalPlayerStats)>, candidate| {
                match best {
                    Some(current) if current.1.score() >= candidate.1.score() => Some(current),
                    _ => Some(candidate),
                }
            })
            .map(|(name, stats)| RankedPlayer {
                rank: 1,
                name: name.clone(),
                stats: *stats,
            })
    }
}

impl<'a> IntoIterator for &'a GlobalStats {
    type Item = (&'a String, &'a GlobalPlayerStats);
    type IntoIter = btree_map::Iter<'a, String, GlobalPlayerStats>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, GlobalPlayerStats)> for GlobalStats {
    fn from_iter<T: IntoIterator<Item = (String, GlobalPlayerStats)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RankedPlayer {
    /// 1-indexed.
    pub rank: usize,
    pub name: String,
    pub stats: GlobalPlayerStats,
}

/// Archived copy of a finished match.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedGame {
    pub id: Uuid,
    pub mode: Mode,
    pub players: Vec<Player>,
    pub winner_name: String,
    pub winner_index: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_seconds: u64,
}

impl CompletedGame {
    pub(crate) fn from_state(state: &MatchState, winner_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: state.mode,
            players: state.players.clone(),
            winner_name: state.winner.clone().unwrap_or_default(),
            winner_index,
            started_at: state.started_at,
            finished_at: state.finished_at.unwrap_or(state.started_at),
            duration_seconds: state.duration_secs.unwrap_or(0),
        }
    }

    #[must_use]
    pub fn winner(&self) -> Option<&Player> {
        self.players.get(self.winner_index)
    }

    /// Up to three players with the most pocketed balls. Seating order
    /// breaks ties.
    #[must_use]
    pub fn podium(&self) -> Vec<&Player> {
        let mut players: Vec<_> = self.players.iter().collect();
        players.sort_by(|a, b| b.pocketed.cmp(&a.pocketed));
        players.truncate(3);
        players
    }
}

/// `1h 2m 3s`, `2m 3s` or `3s`.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(shots: u64, pocketed: u64, played: u64, won: u64) -> GlobalPlayerStats {
        GlobalPlayerStats {
            total_shots: shots,
            total_pocketed: pocketed,
            games_played: played,
            games_won: won,
            total_game_time_seconds: 0,
        }
    }

    #[test]
    fn test_accuracy_formula() {
        assert_eq!(stats(10, 4, 0, 0).accuracy_display(), "40.0");
        assert_eq!(stats(3, 1, 0, 0).accuracy_display(), "33.3");
    }

    #[test]
    fn test_zero_denominators() {
        let empty = GlobalPlayerStats::default();
        assert_eq!(empty.accuracy(), 0.0);
        assert_eq!(empty.win_rate(), 0.0);
        assert_eq!(empty.win_rate_display(), "0.0");
    }

    #[test]
    fn test_win_rate_and_score() {
        let s = stats(10, 5, 4, 1);
        assert_eq!(s.win_rate_display(), "25.0");
        assert!((s.score() - (25.0 * 0.7 + 50.0 * 0.3)).abs() < 1e-9);
    }

    #[test]
    fn test_serialized_as_flat_object() {
        let mut global = GlobalStats::new();
        *global.entry("alice") = stats(2, 1, 1, 1);
        let json = serde_json::to_value(&global).unwrap();
        assert_eq!(json["alice"]["totalShots"], 2);
        assert_eq!(json["alice"]["totalGameTimeSeconds"], 0);
        let back: GlobalStats = serde_json::from_value(json).unwrap();
        assert_eq!(back, global);
    }

    #[test]
    fn test_leaderboard_order() {
        let global: GlobalStats = [
            ("carol".to_string(), stats(1, 1, 3, 1)),
            ("alice".to_string(), stats(1, 1, 3, 2)),
            ("bob".to_string(), stats(1, 1, 3, 1)),
        ]
        .into_iter()
        .collect();

        let names: Vec<_> = global.leaderboard().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["alice", "bob", "carol"]);
        assert_eq!(global.top(1)[0].rank, 1);
        assert_eq!(global.top(10).len(), 3);
    }

    #[test]
    fn test_best_player_uses_combined_score() {
        let global: GlobalStats = [
            ("alice".to_string(), stats(10, 1, 2, 2)),
            ("bob".to_string(), stats(10, 10, 2, 1)),
        ]
        .into_iter()
        .collect();
        // alice: 100*0.7 + 10*0.3 = 73; bob: 50*0.7 + 100*0.3 = 65
        assert_eq!(global.best_player().unwrap().name, "alice");
        assert!(GlobalStats::new().best_player().is_none());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(3600), "1h 0m 0s");
        assert_eq!(format_duration(3723), "1h 2m 3s");
    }

    #[test]
    fn test_podium() {
        let mut players: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|n| Player::new(n, false))
            .collect();
        players[0].pocketed = 1;
        players[1].pocketed = 4;
        players[2].pocketed = 2;
        players[3].pocketed = 4;
        let game = CompletedGame {
            id: Uuid::new_v4(),
            mode: Mode::Tournament,
            players,
            winner_name: "b".to_string(),
            winner_index: 1,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            duration_seconds: 0,
        };
        let podium: Vec<_> = game.podium().into_iter().map(|p| p.name.as_str()).collect();
        assert_eq!(podium, ["b", "d", "c"]);
        assert_eq!(game.winner().unwrap().name, "b");
    }
}
