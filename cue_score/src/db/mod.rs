//! Persistence gateway.
//!
//! Global statistics and the archive of completed matches live under two
//! keys of a plain key-value store. The storage technology is pluggable
//! through [`KeyValueStore`]; [`JsonFileStore`] keeps one JSON document per
//! key on disk and [`MemoryStore`] keeps everything in process.

pub mod config;
pub mod errors;
pub mod repository;
pub mod store;

pub use config::StoreConfig;
pub use errors::{StoreError, StoreResult};
pub use repository::{COMPLETED_GAMES_KEY, GLOBAL_STATS_KEY, StatsRepository};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
