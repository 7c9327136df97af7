use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};
use thiserror::Error;

use super::constants::{MIN_TOURNAMENT_PLAYERS, SEQUENTIAL_BALLS, SOLID_BALLS, STRIPED_BALLS};
use super::rules::{
    FreeForAllRules, ModeRules, NineBallRules, StandardRules, TeamRules, TournamentRules,
};

/// Numbered object ball. The cue ball is never tracked.
pub type BallNumber = u8;

/// Half of a grouped rack.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BallGroup {
    Solid,
    Striped,
}

impl BallGroup {
    /// Group a ball belongs to. The 8-ball belongs to neither.
    #[must_use]
    pub fn of(ball: BallNumber) -> Option<Self> {
        if SOLID_BALLS.contains(&ball) {
            Some(Self::Solid)
        } else if STRIPED_BALLS.contains(&ball) {
            Some(Self::Striped)
        } else {
            None
        }
    }
}

impl fmt::Display for BallGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solid => write!(f, "solid"),
            Self::Striped => write!(f, "striped"),
        }
    }
}

/// What the shooter is currently pursuing. Unassigned is `Option::None`
/// wherever a `BallType` is stored.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BallType {
    Solid,
    Striped,
    /// Free-for-all: every ball is fair game.
    All,
    /// Sequential 1-9 rack.
    NineBall,
}

impl BallType {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Solid => Self::Striped,
            Self::Striped => Self::Solid,
            other => other,
        }
    }

    /// The pool group this assignment targets, if it targets exactly one.
    #[must_use]
    pub fn group(self) -> Option<BallGroup> {
        match self {
            Self::Solid => Some(BallGroup::Solid),
            Self::Striped => Some(BallGroup::Striped),
            Self::All | Self::NineBall => None,
        }
    }
}

impl From<BallGroup> for BallType {
    fn from(value: BallGroup) -> Self {
        match value {
            BallGroup::Solid => Self::Solid,
            BallGroup::Striped => Self::Striped,
        }
    }
}

impl fmt::Display for BallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Solid => "solid",
            Self::Striped => "striped",
            Self::All => "all",
            Self::NineBall => "nine-ball",
        };
        write!(f, "{repr}")
    }
}

/// Balls still on the table.
///
/// Balls only ever leave the pool. The only way one comes back is by
/// restoring a whole snapshot through undo.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum BallPool {
    Grouped {
        solid: BTreeSet<BallNumber>,
        striped: BTreeSet<BallNumber>,
    },
    Sequential {
        remaining: BTreeSet<BallNumber>,
    },
}

impl BallPool {
    /// Full 15-ball rack split into solids and stripes. The 8-ball is
    /// handled by its own commands and never sits in the pool.
    #[must_use]
    pub fn grouped() -> Self {
        Self::Grouped {
            solid: SOLID_BALLS.collect(),
            striped: STRIPED_BALLS.collect(),
        }
    }

    /// Nine-ball rack, 1 through 9.
    #[must_use]
    pub fn sequential() -> Self {
        Self::Sequential {
            remaining: SEQUENTIAL_BALLS.collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, ball: BallNumber) -> bool {
        match self {
            Self::Grouped { solid, striped } => solid.contains(&ball) || striped.contains(&ball),
            Self::Sequential { remaining } => remaining.contains(&ball),
        }
    }

    /// Removes the ball from whichever group holds it. Returns `false`
    /// and leaves the pool untouched if the ball isn't there.
    pub fn remove(&mut self, ball: BallNumber) -> bool {
        match self {
            Self::Grouped { solid, striped } => match BallGroup::of(ball) {
                Some(BallGroup::Solid) => solid.remove(&ball),
                Some(BallGroup::Striped) => striped.remove(&ball),
                None => false,
            },
            Self::Sequential { remaining } => remaining.remove(&ball),
        }
    }

    /// Always `false` for sequential pools, which have no groups.
    #[must_use]
    pub fn is_group_depleted(&self, group: BallGroup) -> bool {
        match self {
            Self::Grouped { solid, striped } => match group {
                BallGroup::Solid => solid.is_empty(),
                BallGroup::Striped => striped.is_empty(),
            },
            Self::Sequential { .. } => false,
        }
    }

    /// Every group is empty.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        match self {
            Self::Grouped { solid, striped } => solid.is_empty() && striped.is_empty(),
            Self::Sequential { remaining } => remaining.is_empty(),
        }
    }

    /// Lowest ball left in a sequential rack, i.e. the only legal target.
    /// This is a display hint; nothing enforces it.
    #[must_use]
    pub fn lowest(&self) -> Option<BallNumber> {
        match self {
            Self::Sequential { remaining } => remaining.first().copied(),
            Self::Grouped { .. } => None,
        }
    }

    /// Remaining balls in ascending order.
    #[must_use]
    pub fn remaining(&self) -> Vec<BallNumber> {
        match self {
            Self::Grouped { solid, striped } => solid.iter().chain(striped).copied().collect(),
            Self::Sequential { remaining } => remaining.iter().copied().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Grouped { solid, striped } => solid.len() + striped.len(),
            Self::Sequential { remaining } => remaining.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Percentage with one decimal, `0.0` when nothing was attempted.
pub(crate) fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

/// A player's tally for one match.
///
/// `shots >= pocketed` always holds: every pocket also counts as a shot.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    pub shots: u32,
    pub pocketed: u32,
    pub is_current_turn: bool,
    /// Fixed at setup. Tracked players feed the global statistics.
    pub tracked: bool,
}

impl Player {
    #[must_use]
    pub fn new(name: impl Into<String>, tracked: bool) -> Self {
        Self {
            name: name.into(),
            shots: 0,
            pocketed: 0,
            is_current_turn: false,
            tracked,
        }
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        percentage(u64::from(self.pocketed), u64::from(self.shots))
    }

    #[must_use]
    pub fn accuracy_display(&self) -> String {
        format!("{:.1}", self.accuracy())
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} shots, {} pocketed, {}%)",
            self.name,
            self.shots,
            self.pocketed,
            self.accuracy_display()
        )
    }
}

/// How many players a mode seats.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlayerCount {
    Exactly(usize),
    AtLeast(usize),
}

impl PlayerCount {
    #[must_use]
    pub fn min(self) -> usize {
        match self {
            Self::Exactly(n) | Self::AtLeast(n) => n,
        }
    }

    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for PlayerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "{n}"),
            Self::AtLeast(n) => write!(f, "{n}+"),
        }
    }
}

/// Match variant.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Mode {
    #[serde(rename = "standard")]
    Standard,
    #[serde(rename = "nine-ball-2p")]
    NineBallDuo,
    #[serde(rename = "free-for-all-3p")]
    FreeForAll,
    #[serde(rename = "nine-ball-3p")]
    NineBallTrio,
    #[serde(rename = "team-4p")]
    Team,
    #[serde(rename = "tournament")]
    Tournament,
}

impl Mode {
    pub const ALL: [Self; 6] = [
        Self::Standard,
        Self::NineBallDuo,
        Self::FreeForAll,
        Self::NineBallTrio,
        Self::Team,
        Self::Tournament,
    ];

    #[must_use]
    pub fn player_count(self) -> PlayerCount {
        match self {
            Self::Standard | Self::NineBallDuo => PlayerCount::Exactly(2),
            Self::FreeForAll | Self::NineBallTrio => PlayerCount::Exactly(3),
            Self::Team => PlayerCount::Exactly(4),
            Self::Tournament => PlayerCount::AtLeast(MIN_TOURNAMENT_PLAYERS),
        }
    }

    #[must_use]
    pub fn is_nine_ball(self) -> bool {
        matches!(self, Self::NineBallDuo | Self::NineBallTrio)
    }

    /// Rule set for this mode, chosen once when a match starts.
    #[must_use]
    pub fn rules(self) -> ModeRules {
        match self {
            Self::Standard => StandardRules.into(),
            Self::NineBallDuo | Self::NineBallTrio => NineBallRules.into(),
            Self::FreeForAll => FreeForAllRules.into(),
            Self::Team => TeamRules.into(),
            Self::Tournament => TournamentRules.into(),
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Standard => "Duo",
            Self::NineBallDuo => "Duo - 9-ball",
            Self::FreeForAll => "Trio - Free for all",
            Self::NineBallTrio => "Trio - 9-ball",
            Self::Team => "Quartet",
            Self::Tournament => "Tournament",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Standard => "standard",
            Self::NineBallDuo => "nine-ball-2p",
            Self::FreeForAll => "free-for-all-3p",
            Self::NineBallTrio => "nine-ball-3p",
            Self::Team => "team-4p",
            Self::Tournament => "tournament",
        };
        write!(f, "{repr}")
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown mode '{0}'")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "duo" => Ok(Self::Standard),
            "nine-ball-2p" | "duo-9" => Ok(Self::NineBallDuo),
            "free-for-all-3p" | "trio" => Ok(Self::FreeForAll),
            "nine-ball-3p" | "trio-9" => Ok(Self::NineBallTrio),
            "team-4p" | "quartet" => Ok(Self::Team),
            "tournament" | "torneo" => Ok(Self::Tournament),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}
