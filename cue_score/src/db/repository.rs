//! Typed access to the persisted statistics.

use serde::{Serialize, de::DeserializeOwned};

use super::errors::{StoreError, StoreResult};
use super::store::KeyValueStore;
use crate::stats::{CompletedGame, GlobalStats};

/// Key holding the name → cumulative stats object.
pub const GLOBAL_STATS_KEY: &str = "globalPlayerStats";

/// Key holding the append-only list of archived matches.
pub const COMPLETED_GAMES_KEY: &str = "completedGames";

/// Reads and writes the two persisted keys through any [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct StatsRepository<S> {
    store: S,
    pretty: bool,
}

impl<S: KeyValueStore> StatsRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            pretty: false,
        }
    }

    /// Indent JSON on write.
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Empty map when nothing was ever saved.
    pub fn load_global_stats(&self) -> StoreResult<GlobalStats> {
        Ok(self.read(GLOBAL_STATS_KEY)?.unwrap_or_default())
    }

    pub fn save_global_stats(&mut self, stats: &GlobalStats) -> StoreResult<()> {
        self.write(GLOBAL_STATS_KEY, stats)
    }

    pub fn load_completed_games(&self) -> StoreResult<Vec<CompletedGame>> {
        Ok(self.read(COMPLETED_GAMES_KEY)?.unwrap_or_default())
    }

    /// Reads the list, appends and writes it back.
    pub fn append_completed_game(&mut self, game: &CompletedGame) -> StoreResult<()> {
        let mut games = self.load_completed_games()?;
        games.push(game.clone());
        self.write(COMPLETED_GAMES_KEY, &games)
    }

    pub fn last_completed_game(&self) -> StoreResult<Option<CompletedGame>> {
        Ok(self.load_completed_games()?.pop())
    }

    /// Deletes both keys.
    pub fn clear(&mut self) -> StoreResult<()> {
        self.store.remove(GLOBAL_STATS_KEY)?;
        self.store.remove(COMPLETED_GAMES_KEY)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        self.store
            .get(key)?
            .map(|raw| serde_json::from_str(&raw).map_err(|e| StoreError::serialization(key, e)))
            .transpose()
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> StoreResult<()> {
        let raw = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
        .map_err(|e| StoreError::serialization(key, e))?;
        self.store.set(key, &raw)
    }
}
