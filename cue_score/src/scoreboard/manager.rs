//! Scoreboard: the command surface the operator UI talks to.

use log::{error, info, warn};

use crate::db::{JsonFileStore, KeyValueStore, StatsRepository, StoreConfig, StoreResult};
use crate::game::{
    BallNumber, BallType, CommandOutcome, GameSession, IgnoreReason, MatchSetup, Player,
    SessionPhase, ValidationError,
};
use crate::stats::{
    CompletedGame, GlobalPlayerStats, GlobalStats, RankedPlayer, StatsAggregator,
};

/// Owns the active match, the in-memory global statistics and the
/// repository they are persisted through.
///
/// Commands run one at a time to completion. When a command finishes the
/// match, the result is folded into the statistics exactly once and
/// written through. A failed write is logged and not retried; the
/// in-memory statistics keep the result either way.
///
/// Saved statistics are never overwritten by a set that wasn't loaded
/// from the store. If the initial load failed, every save first re-reads
/// the stored set and replays the results finished since then on top of
/// it; while the store stays unreadable nothing is saved.
#[derive(Debug)]
pub struct Scoreboard<S: KeyValueStore> {
    repository: StatsRepository<S>,
    global: GlobalStats,
    /// Results not yet merged into a stored set. Only used while
    /// `stats_loaded` is false.
    unmerged: Vec<CompletedGame>,
    stats_loaded: bool,
    session: Option<GameSession>,
}

impl Scoreboard<JsonFileStore> {
    /// Scoreboard backed by JSON files in `config.data_dir`.
    pub fn open(config: &StoreConfig) -> Self {
        let store = JsonFileStore::new(&config.data_dir);
        Self::new(StatsRepository::new(store).pretty(config.pretty_json))
    }
}

impl<S: KeyValueStore> Scoreboard<S> {
    /// Loads the saved statistics. Unreadable statistics are logged and
    /// replaced by an empty set.
    pub fn new(repository: StatsRepository<S>) -> Self {
        let (global, stats_loaded) = match repository.load_global_stats() {
            Ok(global) => {
                info!("Loaded stats for {} tracked player(s)", global.len());
                (global, true)
            }
            Err(e) => {
                error!("Failed to load global stats, starting empty: {e}");
                (GlobalStats::new(), false)
            }
        };
        Self {
            repository,
            global,
            unmerged: Vec::new(),
            stats_loaded,
            session: None,
        }
    }

    /// `false` while the saved statistics couldn't be read.
    pub fn stats_loaded(&self) -> bool {
        self.stats_loaded
    }

    pub fn repository(&self) -> &StatsRepository<S> {
        &self.repository
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.session
            .as_ref()
            .map_or(SessionPhase::AwaitingNames, GameSession::phase)
    }

    /// Starts a new match, replacing any previous one along with its undo
    /// history.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] from the setup; the previous match
    /// is kept in that case.
    pub fn start_match(&mut self, setup: MatchSetup) -> Result<&GameSession, ValidationError> {
        let session = GameSession::start(setup)?;
        if let Some(previous) = &self.session
            && !previous.is_finished()
        {
            warn!("Abandoning unfinished {} match", previous.mode());
        }
        Ok(&*self.session.insert(session))
    }

    pub fn select_ball_type(&mut self, ball_type: BallType) -> CommandOutcome {
        self.dispatch(|session| session.select_ball_type(ball_type))
    }

    pub fn record_pocket(&mut self, ball: BallNumber) -> CommandOutcome {
        self.dispatch(|session| session.record_pocket(ball))
    }

    pub fn record_final_ball_pocketed(&mut self) -> CommandOutcome {
        self.dispatch(GameSession::record_final_ball_pocketed)
    }

    pub fn record_final_ball_foul(&mut self) -> CommandOutcome {
        self.dispatch(GameSession::record_final_ball_foul)
    }

    pub fn pass_turn(&mut self) -> CommandOutcome {
        self.dispatch(GameSession::pass_turn)
    }

    pub fn undo(&mut self) -> CommandOutcome {
        self.dispatch(GameSession::undo)
    }

    /// Ends the match with an explicit winner.
    pub fn finish(&mut self, winner_index: usize) -> CommandOutcome {
        self.dispatch(|session| session.finish(winner_index))
    }

    /// Wipes every persisted key and the in-memory statistics, and drops
    /// the active match.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the persisted keys could not be
    /// removed. The in-memory state is cleared regardless.
    pub fn reset_all_statistics(&mut self) -> StoreResult<()> {
        self.global.clear();
        self.unmerged.clear();
        self.stats_loaded = true;
        self.session = None;
        self.repository.clear()?;
        info!("All statistics reset");
        Ok(())
    }

    pub fn global_stats(&self) -> &GlobalStats {
        &self.global
    }

    /// `None` when the player has never been tracked.
    pub fn player_stats(&self, name: &str) -> Option<&GlobalPlayerStats> {
        self.global.get(name)
    }

    pub fn leaderboard(&self) -> Vec<RankedPlayer> {
        self.global.leaderboard()
    }

    pub fn best_player(&self) -> Option<RankedPlayer> {
        self.global.best_player()
    }

    pub fn completed_games(&self) -> StoreResult<Vec<CompletedGame>> {
        self.repository.load_completed_games()
    }

    /// Top three of the most recent match by pocketed balls.
    pub fn last_game_podium(&self) -> StoreResult<Vec<Player>> {
        Ok(self
            .repository
            .last_completed_game()?
            .map(|game| game.podium().into_iter().cloned().collect())
            .unwrap_or_default())
    }

    fn dispatch<F>(&mut self, command: F) -> CommandOutcome
    where
        F: FnOnce(&mut GameSession) -> CommandOutcome,
    {
        let Some(session) = self.session.as_mut() else {
            return CommandOutcome::Ignored(IgnoreReason::NoActiveMatch);
        };
        let outcome = command(session);
        if let CommandOutcome::Finished(game) = &outcome {
            self.record_result(game);
        }
        outcome
    }

    fn record_result(&mut self, game: &CompletedGame) {
        let updated = StatsAggregator::fold(&mut self.global, game);
        info!(
            "Recorded {} win for {} ({updated} tracked player(s) updated)",
            game.mode, game.winner_name
        );

        if (self.stats_loaded || self.merge_stored_stats(game))
            && let Err(e) = self.repository.save_global_stats(&self.global)
        {
            error!("Failed to save global stats: {e}");
        }
        if let Err(e) = self.repository.append_completed_game(game) {
            error!("Failed to archive match {}: {e}", game.id);
        }
    }

    /// Re-reads the stored statistics and replays every result finished
    /// since the failed load on top of them. Returns `false`, keeping
    /// `game` for the next attempt, if the store is still unreadable.
    fn merge_stored_stats(&mut self, game: &CompletedGame) -> bool {
        self.unmerged.push(game.clone());
        match self.repository.load_global_stats() {
            Ok(mut stored) => {
                for pending in self.unmerged.drain(..) {
                    StatsAggregator::fold(&mut stored, &pending);
                }
                info!(
                    "Recovered stored stats for {} tracked player(s)",
                    stored.len()
                );
                self.global = stored;
                self.stats_loaded = true;
                true
            }
            Err(e) => {
                error!(
                    "Stored stats still unreadable, keeping {} result(s) in memory only: {e}",
                    self.unmerged.len()
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{GLOBAL_STATS_KEY, MemoryStore, StoreError};
    use crate::game::Mode;
    use std::cell::Cell;

    fn scoreboard() -> Scoreboard<MemoryStore> {
        Scoreboard::new(StatsRepository::new(MemoryStore::new()))
    }

    fn duo(tracked: [bool; 2]) -> MatchSetup {
        MatchSetup::with_players(Mode::Standard, ["alice", "bob"], tracked.to_vec())
    }

    #[test]
    fn test_commands_without_match_are_ignored() {
        let mut board = scoreboard();
        assert_eq!(board.phase(), SessionPhase::AwaitingNames);
        assert_eq!(
            board.pass_turn(),
            CommandOutcome::Ignored(IgnoreReason::NoActiveMatch)
        );
        assert_eq!(
            board.undo(),
            CommandOutcome::Ignored(IgnoreReason::NoActiveMatch)
        );
    }

    #[test]
    fn test_invalid_setup_keeps_previous_match() {
        let mut board = scoreboard();
        board.start_match(duo([false, false])).unwrap();
        board.record_pocket(1);
        let err = board
            .start_match(MatchSetup::with_players(Mode::Standard, ["", "x"], vec![false; 2]))
            .unwrap_err();
        assert_eq!(err, ValidationError::BlankName { index: 0 });
        assert_eq!(board.session().unwrap().history_len(), 1);
    }

    #[test]
    fn test_finish_persists_once() {
        let mut board = scoreboard();
        board.start_match(duo([true, true])).unwrap();
        board.record_pocket(3);
        board.pass_turn();
        assert!(board.record_final_ball_foul().completed_game().is_some());

        // second finishing command is absorbed, stats unchanged
        assert_eq!(
            board.record_final_ball_pocketed(),
            CommandOutcome::Ignored(IgnoreReason::SessionFinished)
        );

        let alice = board.player_stats("alice").unwrap();
        assert_eq!(alice.games_won, 1);
        assert_eq!(alice.games_played, 1);
        assert_eq!((alice.total_shots, alice.total_pocketed), (2, 1));

        let bob = board.player_stats("bob").unwrap();
        assert_eq!(bob.games_won, 0);

        assert_eq!(board.completed_games().unwrap().len(), 1);
        assert_eq!(
            board.repository().load_global_stats().unwrap(),
            *board.global_stats()
        );
    }

    #[test]
    fn test_new_match_clears_history() {
        let mut board = scoreboard();
        board.start_match(duo([false, false])).unwrap();
        board.record_pocket(1);
        board.start_match(duo([false, false])).unwrap();
        assert_eq!(board.session().unwrap().history_len(), 0);
        assert_eq!(
            board.undo(),
            CommandOutcome::Ignored(IgnoreReason::NothingToUndo)
        );
    }

    #[test]
    fn test_loads_existing_stats() {
        let mut board = scoreboard();
        board.start_match(duo([true, false])).unwrap();
        board.record_final_ball_pocketed();
        let store = board.repository().store().clone();

        let reopened = Scoreboard::new(StatsRepository::new(store));
        assert_eq!(reopened.player_stats("alice").unwrap().games_won, 1);
        assert!(reopened.player_stats("bob").is_none());
    }

    #[test]
    fn test_unreadable_stats_start_empty() {
        let mut store = MemoryStore::new();
        store.set(GLOBAL_STATS_KEY, "garbage").unwrap();
        let mut board = Scoreboard::new(StatsRepository::new(store));
        assert!(board.global_stats().is_empty());
        assert!(!board.stats_loaded());

        // the malformed value is left for the operator to inspect or reset
        board.start_match(duo([true, false])).unwrap();
        board.record_final_ball_pocketed();
        assert_eq!(board.player_stats("alice").unwrap().games_won, 1);
        assert_eq!(
            board.repository().store().get(GLOBAL_STATS_KEY).unwrap(),
            Some("garbage".to_string())
        );

        board.reset_all_statistics().unwrap();
        assert!(board.stats_loaded());
        board.start_match(duo([true, false])).unwrap();
        board.record_final_ball_pocketed();
        let stored = board.repository().load_global_stats().unwrap();
        assert_eq!(stored.get("alice").unwrap().games_played, 1);
    }

    /// Memory store whose next `failing_reads` reads fail.
    #[derive(Debug)]
    struct FlakyStore {
        inner: MemoryStore,
        failing_reads: Cell<usize>,
    }

    impl FlakyStore {
        fn with_history(failing_reads: usize) -> Self {
            let mut seed = StatsRepository::new(MemoryStore::new());
            let mut stats = GlobalStats::new();
            *stats.entry("carol") = GlobalPlayerStats {
                games_played: 10,
                games_won: 4,
                ..Default::default()
            };
            seed.save_global_stats(&stats).unwrap();
            Self {
                inner: seed.store().clone(),
                failing_reads: Cell::new(failing_reads),
            }
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            let remaining = self.failing_reads.get();
            if remaining > 0 {
                self.failing_reads.set(remaining - 1);
                return Err(StoreError::io(
                    key,
                    std::io::Error::new(std::io::ErrorKind::TimedOut, "device busy"),
                ));
            }
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> StoreResult<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_failed_load_keeps_stored_history() {
        let mut board = Scoreboard::new(StatsRepository::new(FlakyStore::with_history(1)));
        assert!(!board.stats_loaded());
        assert!(board.player_stats("carol").is_none());

        board.start_match(duo([true, false])).unwrap();
        board.record_final_ball_pocketed();

        assert!(board.stats_loaded());
        assert_eq!(board.player_stats("carol").unwrap().games_played, 10);
        assert_eq!(board.player_stats("alice").unwrap().games_won, 1);

        let stored = board.repository().load_global_stats().unwrap();
        assert_eq!(stored.get("carol").unwrap().games_played, 10);
        assert_eq!(stored.get("carol").unwrap().games_won, 4);
        assert_eq!(stored.get("alice").unwrap().games_played, 1);
        assert_eq!(stored, *board.global_stats());
    }

    #[test]
    fn test_unreadable_store_is_not_overwritten() {
        let mut board =
            Scoreboard::new(StatsRepository::new(FlakyStore::with_history(usize::MAX)));
        for _ in 0..2 {
            board.start_match(duo([true, false])).unwrap();
            board.record_final_ball_pocketed();
        }
        assert!(!board.stats_loaded());
        assert_eq!(board.player_stats("alice").unwrap().games_played, 2);

        let inner = &board.repository().store().inner;
        let stored: GlobalStats =
            serde_json::from_str(&inner.get(GLOBAL_STATS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.get("carol").unwrap().games_played, 10);

        // store comes back: both earlier results land on top of carol's
        board.repository().store().failing_reads.set(0);
        board.start_match(duo([true, false])).unwrap();
        board.record_final_ball_pocketed();

        let stored = board.repository().load_global_stats().unwrap();
        assert_eq!(stored.get("carol").unwrap().games_played, 10);
        assert_eq!(stored.get("alice").unwrap().games_played, 3);
        assert_eq!(stored.get("alice").unwrap().games_won, 3);
    }

    #[test]
    fn test_reset_all_statistics() {
        let mut board = scoreboard();
        board.start_match(duo([true, true])).unwrap();
        board.record_final_ball_pocketed();
        board.reset_all_statistics().unwrap();

        assert!(board.player_stats("alice").is_none());
        assert!(board.session().is_none());
        assert!(board.completed_games().unwrap().is_empty());
        assert!(board.repository().load_global_stats().unwrap().is_empty());
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::io(
                key,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ))
        }

        fn remove(&mut self, _key: &str) -> StoreResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_keeps_memory_stats() {
        let mut board = Scoreboard::new(StatsRepository::new(BrokenStore));
        board.start_match(duo([true, false])).unwrap();
        let outcome = board.record_final_ball_pocketed();
        assert!(outcome.completed_game().is_some());
        assert_eq!(board.player_stats("alice").unwrap().games_won, 1);
    }

    #[test]
    fn test_last_game_podium() {
        let mut board = scoreboard();
        assert!(board.last_game_podium().unwrap().is_empty());
        board.start_match(duo([false, false])).unwrap();
        board.pass_turn();
        board.record_pocket(9);
        board.record_pocket(10);
        board.finish(1);
        let podium = board.last_game_podium().unwrap();
        assert_eq!(podium[0].name, "bob");
        assert_eq!(podium.len(), 2);
    }
}
