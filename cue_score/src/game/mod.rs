//! Match engine: rack, rules, turn order and undo.
//!
//! - Six modes, each backed by one [`ModeRules`] variant
//! - Name entry and validation before the break
//! - Command-driven session with full-state undo

pub mod constants;
pub mod entities;
pub mod history;
pub mod rules;
pub mod setup;
pub mod state_machine;

pub use entities::{
    BallGroup, BallNumber, BallPool, BallType, Mode, ParseModeError, Player, PlayerCount,
};
pub use history::{ActionHistory, ActionKind, ActionSnapshot};
pub use rules::{GameOutcome, ModeRules, Rules};
pub use setup::{MatchSetup, ValidationError};
pub use state_machine::{CommandOutcome, GameSession, IgnoreReason, MatchState, SessionPhase};
