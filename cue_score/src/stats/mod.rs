//! Cross-match statistics for tracked players.
//!
//! A finished match is archived as a [`CompletedGame`] and folded into the
//! [`GlobalStats`] map by the [`StatsAggregator`]. Accuracy, win rate and
//! the combined score are derived when read and never stored.

pub mod aggregator;
pub mod models;

pub use aggregator::StatsAggregator;
pub use models::{CompletedGame, GlobalPlayerStats, GlobalStats, RankedPlayer, format_duration};
