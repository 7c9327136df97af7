//! Folds finished matches into the cumulative statistics.

use log::debug;

use super::models::{CompletedGame, GlobalStats};

/// Adds a finished match to the global statistics.
///
/// Only tracked players are counted. Untracked players still appear in
/// the archived game but leave no trace here.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatsAggregator;

impl StatsAggregator {
    /// Folds `game` into `stats` and returns how many players were updated.
    ///
    /// Call this once per match. Folding the same game twice counts it twice.
    pub fn fold(stats: &mut GlobalStats, game: &CompletedGame) -> usize {
        let mut updated = 0;
        for (index, player) in game.players.iter().enumerate() {
            if !player.tracked {
                continue;
            }
            let record = stats.entry(&player.name);
            record.total_shots += u64::from(player.shots);
            record.total_pocketed += u64::from(player.pocketed);
            record.games_played += 1;
            record.total_game_time_seconds += game.duration_seconds;
            if index == game.winner_index {
                record.games_won += 1;
            }
            updated += 1;
            debug!("Folded match {} into stats for {}", game.id, player.name);
        }
        updated
    }
}
