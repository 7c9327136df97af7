use std::ops::RangeInclusive;

use super::entities::BallNumber;

pub const EIGHT_BALL: BallNumber = 8;
pub const NINE_BALL: BallNumber = 9;

pub const SOLID_BALLS: RangeInclusive<BallNumber> = 1..=7;
pub const STRIPED_BALLS: RangeInclusive<BallNumber> = 9..=15;
pub const SEQUENTIAL_BALLS: RangeInclusive<BallNumber> = 1..=9;

/// Tournaments seat at least this many players; more can be added at setup.
pub const MIN_TOURNAMENT_PLAYERS: usize = 4;
