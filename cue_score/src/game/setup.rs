//! Name entry before a match starts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{Mode, Player};

/// Reasons a match refuses to start. The operator has to fix the setup.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum ValidationError {
    #[error("player {} needs a name", index + 1)]
    BlankName { index: usize },
    #[error("{mode} needs {expected} players, got {got}")]
    PlayerCount {
        mode: Mode,
        expected: String,
        got: usize,
    },
    #[error("{names} players but {flags} tracking flags")]
    TrackedFlagsMismatch { names: usize, flags: usize },
}

/// Players and tracking flags collected before a match starts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatchSetup {
    pub mode: Mode,
    names: Vec<String>,
    tracked: Vec<bool>,
}

impl MatchSetup {
    /// Blank names for the mode's minimum player count, nobody tracked.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        let count = mode.player_count().min();
        Self {
            mode,
            names: vec![String::new(); count],
            tracked: vec![false; count],
        }
    }

    pub fn with_players<I, S>(mode: Mode, names: I, tracked: Vec<bool>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode,
            names: names.into_iter().map(Into::into).collect(),
            tracked,
        }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn tracked(&self) -> &[bool] {
        &self.tracked
    }

    /// Returns `false` if there is no seat at `index`.
    pub fn set_name(&mut self, index: usize, name: impl Into<String>) -> bool {
        match self.names.get_mut(index) {
            Some(slot) => {
                *slot = name.into();
                true
            }
            None => false,
        }
    }

    pub fn toggle_tracking(&mut self, index: usize) -> bool {
        match self.tracked.get_mut(index) {
            Some(flag) => {
                *flag = !*flag;
                true
            }
            None => false,
        }
    }

    /// Adds an empty seat. Only tournaments have a variable table.
    pub fn add_player(&mut self) -> bool {
        if self.mode != Mode::Tournament {
            return false;
        }
        self.names.push(String::new());
        self.tracked.push(false);
        true
    }

    /// Removes a seat, never going below the tournament minimum.
    pub fn remove_player(&mut self, index: usize) -> bool {
        if self.mode != Mode::Tournament
            || self.names.len() <= self.mode.player_count().min()
            || index >= self.names.len()
        {
            return false;
        }
        self.names.remove(index);
        if index < self.tracked.len() {
            self.tracked.remove(index);
        }
        true
    }

    /// # Errors
    ///
    /// Fails on the first blank name, a seat count the mode can't play
    /// with, or tracking flags that don't line up with the names.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let count = self.mode.player_count();
        if !count.accepts(self.names.len()) {
            return Err(ValidationError::PlayerCount {
                mode: self.mode,
                expected: count.to_string(),
                got: self.names.len(),
            });
        }
        if self.tracked.len() != self.names.len() {
            return Err(ValidationError::TrackedFlagsMismatch {
                names: self.names.len(),
                flags: self.tracked.len(),
            });
        }
        if let Some(index) = self.names.iter().position(|name| name.trim().is_empty()) {
            return Err(ValidationError::BlankName { index });
        }
        Ok(())
    }

    /// Validated, trimmed players in seating order.
    pub(crate) fn into_players(self) -> Result<Vec<Player>, ValidationError> {
        self.validate()?;
        Ok(self
            .names
            .iter()
            .zip(self.tracked)
            .map(|(name, tracked)| Player::new(name.trim(), tracked))
            .collect())
    }
}
