//! Undo stack.
//!
//! Every mutating command stores a full copy of the match state taken
//! right before it runs. Undo restores that copy wholesale, so undoing N
//! times walks back exactly N commands.

use std::fmt;

use super::entities::{BallNumber, BallType};
use super::state_machine::MatchState;

/// The command a snapshot precedes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionKind {
    SelectBallType(BallType),
    Pocket(BallNumber),
    PassTurn,
    FinalBallPocketed,
    FinalBallFoul,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectBallType(ball_type) => write!(f, "select {ball_type}"),
            Self::Pocket(ball) => write!(f, "pocket {ball}"),
            Self::PassTurn => write!(f, "pass turn"),
            Self::FinalBallPocketed => write!(f, "final ball pocketed"),
            Self::FinalBallFoul => write!(f, "final ball foul"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActionSnapshot {
    pub action: ActionKind,
    pub state: MatchState,
}

/// Unbounded LIFO of snapshots. Each match starts with a fresh one.
#[derive(Clone, Debug, Default)]
pub struct ActionHistory {
    snapshots: Vec<ActionSnapshot>,
}

impl ActionHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: ActionKind, state: &MatchState) {
        self.snapshots.push(ActionSnapshot {
            action,
            state: state.clone(),
        });
    }

    pub fn pop(&mut self) -> Option<ActionSnapshot> {
        self.snapshots.pop()
    }

    #[must_use]
    pub fn last_action(&self) -> Option<ActionKind> {
        self.snapshots.last().map(|snapshot| snapshot.action)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
