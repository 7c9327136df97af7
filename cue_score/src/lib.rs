//! # Cue Score
//!
//! Scorekeeping engine for a single pool table, driven by an operator who
//! records what happens on the felt one event at a time.
//!
//! The engine tracks the rack, whose turn it is, which group each shooter
//! is after and how every match ends. Results of players who opted in are
//! folded into cumulative statistics that survive restarts.
//!
//! ## Modes
//!
//! - **Standard**: two players, solids against stripes, 8-ball to win
//! - **9-Ball (2 or 3 players)**: sequential rack, the 9 wins whenever it drops
//! - **Free-for-all**: three players, every ball counts, 8-ball once the table is clear
//! - **Team**: two pairs sharing one group
//! - **Tournament**: open table of four or more
//!
//! ## Core Modules
//!
//! - [`game`]: Rack, per-mode rules, session state machine and undo
//! - [`stats`]: Cumulative per-player statistics and rankings
//! - [`db`]: Key-value persistence for statistics and archived matches
//! - [`scoreboard`]: The command surface tying the three together
//!
//! ## Example
//!
//! ```
//! use cue_score::{GameSession, MatchSetup, Mode};
//!
//! let setup = MatchSetup::with_players(Mode::Standard, ["alice", "bob"], vec![false, false]);
//! let mut session = GameSession::start(setup).unwrap();
//!
//! session.record_pocket(3);
//! assert_eq!(session.state().ball_type.unwrap().to_string(), "solid");
//! ```

/// Match engine.
pub mod game;
pub use game::{
    BallPool, BallType, CommandOutcome, GameSession, IgnoreReason, MatchSetup, Mode, Player,
    SessionPhase, ValidationError,
    constants::{self, EIGHT_BALL, NINE_BALL},
};

/// Statistics aggregation.
pub mod stats;
pub use stats::{CompletedGame, GlobalPlayerStats, GlobalStats, StatsAggregator};

/// Persistence gateway.
pub mod db;
pub use db::{JsonFileStore, KeyValueStore, MemoryStore, StatsRepository, StoreConfig};

pub mod scoreboard;
pub use scoreboard::Scoreboard;
