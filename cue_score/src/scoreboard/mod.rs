//! Engine façade for the operator UI.
//!
//! ## Example
//!
//! ```
//! use cue_score::db::{MemoryStore, StatsRepository};
//! use cue_score::game::{MatchSetup, Mode};
//! use cue_score::scoreboard::Scoreboard;
//!
//! let mut board = Scoreboard::new(StatsRepository::new(MemoryStore::new()));
//! board
//!     .start_match(MatchSetup::with_players(
//!         Mode::NineBallDuo,
//!         ["alice", "bob"],
//!         vec![true, true],
//!     ))
//!     .unwrap();
//!
//! board.record_pocket(1);
//! board.pass_turn();
//! let outcome = board.record_pocket(9);
//!
//! assert_eq!(outcome.completed_game().unwrap().winner_name, "bob");
//! assert_eq!(board.player_stats("bob").unwrap().games_won, 1);
//! ```

pub mod manager;

pub use manager::Scoreboard;
