//! Per-mode rule sets.
//!
//! Every mode-specific decision the session makes goes through one of the
//! [`Rules`] hooks. The session picks a [`ModeRules`] once at match start
//! and never branches on the mode itself.

use enum_dispatch::enum_dispatch;

use super::constants::{EIGHT_BALL, NINE_BALL};
use super::entities::{BallGroup, BallNumber, BallPool, BallType};
use super::state_machine::MatchState;

/// What a pocketing or foul event means for the match.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GameOutcome {
    Continues,
    /// The match ends and the player at this index wins.
    Wins(usize),
}

/// Hooks a mode variant implements.
#[enum_dispatch]
pub trait Rules {
    /// Rack at the start of the match.
    fn initial_pool(&self) -> BallPool;

    /// The ball that ends the match when pocketed.
    fn final_ball(&self) -> BallNumber;

    /// Assignment made by the mode itself before any ball falls.
    fn initial_ball_type(&self) -> Option<BallType> {
        None
    }

    /// Whether the operator may pick solid/striped by hand.
    fn accepts_ball_type_selection(&self) -> bool {
        true
    }

    /// Assignment implied by the first pocketed ball of the rack.
    fn on_first_pocket(&self, ball: BallNumber) -> Option<BallType> {
        BallGroup::of(ball).map(BallType::from)
    }

    /// Whether the shooter may legally go for the final ball. Display only.
    fn can_target_final_ball(&self, state: &MatchState) -> bool {
        state
            .ball_type
            .and_then(BallType::group)
            .is_some_and(|group| state.ball_pool.is_group_depleted(group))
    }

    fn on_pocket(&self, ball: BallNumber, state: &MatchState) -> GameOutcome {
        if ball == self.final_ball() && self.can_target_final_ball(state) {
            GameOutcome::Wins(state.current_shooter)
        } else {
            GameOutcome::Continues
        }
    }

    /// The shooter forfeits; the next player in rotation takes the match.
    fn on_foul_final_ball(&self, state: &MatchState) -> GameOutcome {
        GameOutcome::Wins(state.next_shooter())
    }

    fn toggles_on_turn_pass(&self, _state: &MatchState) -> bool {
        false
    }
}

/// Two players, solids against stripes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StandardRules;

impl Rules for StandardRules {
    fn initial_pool(&self) -> BallPool {
        BallPool::grouped()
    }

    fn final_ball(&self) -> BallNumber {
        EIGHT_BALL
    }

    /// With two players the assignment always follows the shooter, so it
    /// flips with every turn once it is known.
    fn toggles_on_turn_pass(&self, state: &MatchState) -> bool {
        matches!(state.ball_type, Some(BallType::Solid | BallType::Striped))
    }
}

/// Sequential 1-9 rack; the 9 wins whenever it drops.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NineBallRules;

impl Rules for NineBallRules {
    fn initial_pool(&self) -> BallPool {
        BallPool::sequential()
    }

    fn final_ball(&self) -> BallNumber {
        NINE_BALL
    }

    fn initial_ball_type(&self) -> Option<BallType> {
        Some(BallType::NineBall)
    }

    fn accepts_ball_type_selection(&self) -> bool {
        false
    }

    fn on_first_pocket(&self, _ball: BallNumber) -> Option<BallType> {
        None
    }

    fn can_target_final_ball(&self, _state: &MatchState) -> bool {
        true
    }

    fn on_pocket(&self, ball: BallNumber, state: &MatchState) -> GameOutcome {
        if ball == NINE_BALL {
            GameOutcome::Wins(state.current_shooter)
        } else {
            GameOutcome::Continues
        }
    }
}

/// Three players, every ball counts for whoever pockets it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FreeForAllRules;

impl Rules for FreeForAllRules {
    fn initial_pool(&self) -> BallPool {
        BallPool::grouped()
    }

    fn final_ball(&self) -> BallNumber {
        EIGHT_BALL
    }

    fn initial_ball_type(&self) -> Option<BallType> {
        Some(BallType::All)
    }

    fn accepts_ball_type_selection(&self) -> bool {
        false
    }

    fn on_first_pocket(&self, _ball: BallNumber) -> Option<BallType> {
        None
    }

    /// The 8 opens up only once all fourteen other balls are down.
    fn can_target_final_ball(&self, state: &MatchState) -> bool {
        state.ball_pool.is_cleared()
    }
}

/// Two teams of two. The assignment belongs to the team, so it stays put
/// as the turn rotates.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TeamRules;

impl Rules for TeamRules {
    fn initial_pool(&self) -> BallPool {
        BallPool::grouped()
    }

    fn final_ball(&self) -> BallNumber {
        EIGHT_BALL
    }
}

/// Open table of four or more players.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TournamentRules;

impl Rules for TournamentRules {
    fn initial_pool(&self) -> BallPool {
        BallPool::grouped()
    }

    fn final_ball(&self) -> BallNumber {
        EIGHT_BALL
    }
}

/// Rule set for one match.
#[enum_dispatch(Rules)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModeRules {
    Standard(StandardRules),
    NineBall(NineBallRules),
    FreeForAll(FreeForAllRules),
    Team(TeamRules),
    Tournament(TournamentRules),
}
