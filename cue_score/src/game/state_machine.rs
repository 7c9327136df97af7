//! Match session state machine.
//!
//! A [`GameSession`] is created from a validated [`MatchSetup`] and then
//! driven one operator command at a time. Commands mutate the session in
//! place and report what happened through [`CommandOutcome`]; anything the
//! operator is not allowed to do right now is absorbed as
//! [`CommandOutcome::Ignored`] rather than raised as an error.
//!
//! ```text
//! MatchSetup ──start──▶ AwaitingBallTypeSelection ──select/pocket──▶ InProgress ──▶ Finished
//!                       (grouped modes only)
//! ```

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::entities::{BallNumber, BallPool, BallType, Mode, Player};
use super::history::{ActionHistory, ActionKind};
use super::rules::{GameOutcome, ModeRules, Rules};
use super::setup::{MatchSetup, ValidationError};
use crate::stats::CompletedGame;

/// Why a command left the session untouched.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum IgnoreReason {
    #[error("match already finished")]
    SessionFinished,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("ball {0} is not on the table")]
    BallNotInPool(BallNumber),
    #[error("ball type already assigned")]
    BallTypeAlreadyAssigned,
    #[error("ball type can't be chosen in this mode")]
    BallTypeNotSelectable,
    #[error("no player at index {0}")]
    InvalidPlayerIndex(usize),
    #[error("no match in progress")]
    NoActiveMatch,
}

/// Result of one operator command.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandOutcome {
    Applied,
    /// The command ended the match. Carries the archival record.
    Finished(Box<CompletedGame>),
    Ignored(IgnoreReason),
}

impl CommandOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        !matches!(self, Self::Ignored(_))
    }

    #[must_use]
    pub fn completed_game(&self) -> Option<&CompletedGame> {
        match self {
            Self::Finished(game) => Some(game),
            _ => None,
        }
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => write!(f, "ok"),
            Self::Finished(game) => write!(f, "{} wins", game.winner_name),
            Self::Ignored(reason) => write!(f, "ignored: {reason}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionPhase {
    AwaitingNames,
    AwaitingBallTypeSelection,
    InProgress,
    Finished,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::AwaitingNames => "awaiting names",
            Self::AwaitingBallTypeSelection => "awaiting ball type",
            Self::InProgress => "in progress",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// Everything that undo has to put back.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub mode: Mode,
    pub players: Vec<Player>,
    pub ball_pool: BallPool,
    pub ball_type: Option<BallType>,
    pub current_shooter: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub winner: Option<String>,
    pub duration_secs: Option<u64>,
    pub is_finished: bool,
}

impl MatchState {
    /// Fresh rack for `mode` with the first player on the table.
    #[must_use]
    pub fn new(mode: Mode, mut players: Vec<Player>, started_at: DateTime<Utc>) -> Self {
        let rules = mode.rules();
        if let Some(first) = players.first_mut() {
            first.is_current_turn = true;
        }
        Self {
            mode,
            players,
            ball_pool: rules.initial_pool(),
            ball_type: rules.initial_ball_type(),
            current_shooter: 0,
            started_at,
            finished_at: None,
            winner: None,
            duration_secs: None,
            is_finished: false,
        }
    }

    /// Index of the player after the current shooter in rotation.
    #[must_use]
    pub fn next_shooter(&self) -> usize {
        match self.players.len() {
            0 => 0,
            n => (self.current_shooter + 1) % n,
        }
    }

    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_shooter)
    }

    fn current_player_mut(&mut self) -> Option<&mut Player> {
        self.players.get_mut(self.current_shooter)
    }
}

/// One match from first break to result.
///
/// The session only reacts to explicit commands. Pocketing a ball never
/// rotates the turn by itself; the shooter keeps the table until the
/// operator passes the turn.
#[derive(Debug)]
pub struct GameSession {
    state: MatchState,
    rules: ModeRules,
    history: ActionHistory,
}

impl GameSession {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if any name is blank or the seat count
    /// doesn't fit the mode. No session is created in that case.
    pub fn start(setup: MatchSetup) -> Result<Self, ValidationError> {
        Self::start_at(setup, Utc::now())
    }

    /// Same as [`GameSession::start`] with an explicit start time.
    ///
    /// # Errors
    ///
    /// See [`GameSession::start`].
    pub fn start_at(setup: MatchSetup, started_at: DateTime<Utc>) -> Result<Self, ValidationError> {
        let mode = setup.mode;
        let players = setup.into_players()?;
        info!(
            "Starting {} match with {}",
            mode,
            players
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self {
            state: MatchState::new(mode, players, started_at),
            rules: mode.rules(),
            history: ActionHistory::new(),
        })
    }

    #[must_use]
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.state.players
    }

    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.state.current_player()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.is_finished
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.state.is_finished {
            SessionPhase::Finished
        } else if self.state.ball_type.is_none() {
            SessionPhase::AwaitingBallTypeSelection
        } else {
            SessionPhase::InProgress
        }
    }

    #[must_use]
    pub fn can_target_final_ball(&self) -> bool {
        self.rules.can_target_final_ball(&self.state)
    }

    #[must_use]
    pub fn final_ball(&self) -> BallNumber {
        self.rules.final_ball()
    }

    /// Lowest ball left in a nine-ball rack.
    #[must_use]
    pub fn target_hint(&self) -> Option<BallNumber> {
        self.state.ball_pool.lowest()
    }

    /// Seconds since the break, frozen once the match is over.
    #[must_use]
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        let end = self.state.finished_at.unwrap_or(now);
        seconds_between(self.state.started_at, end)
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn last_action(&self) -> Option<ActionKind> {
        self.history.last_action()
    }

    /// Operator picks solids or stripes for the current shooter before the
    /// first ball drops.
    pub fn select_ball_type(&mut self, ball_type: BallType) -> CommandOutcome {
        if self.state.is_finished {
            return self.ignore(IgnoreReason::SessionFinished);
        }
        if !self.rules.accepts_ball_type_selection() || ball_type.group().is_none() {
            return self.ignore(IgnoreReason::BallTypeNotSelectable);
        }
        if self.state.ball_type.is_some() {
            return self.ignore(IgnoreReason::BallTypeAlreadyAssigned);
        }

        self.history
            .push(ActionKind::SelectBallType(ball_type), &self.state);
        self.state.ball_type = Some(ball_type);
        debug!("Ball type set to {ball_type}");
        CommandOutcome::Applied
    }

    /// Current shooter pocketed `ball`.
    pub fn record_pocket(&mut self, ball: BallNumber) -> CommandOutcome {
        if self.state.is_finished {
            return self.ignore(IgnoreReason::SessionFinished);
        }
        let outcome = self.rules.on_pocket(ball, &self.state);
        if outcome == GameOutcome::Continues && !self.state.ball_pool.contains(ball) {
            return self.ignore(IgnoreReason::BallNotInPool(ball));
        }

        self.history.push(ActionKind::Pocket(ball), &self.state);
        if let Some(shooter) = self.state.current_player_mut() {
            shooter.shots += 1;
            shooter.pocketed += 1;
        }

        match outcome {
            GameOutcome::Wins(winner) => self.conclude(winner, Utc::now()),
            GameOutcome::Continues => {
                if self.state.ball_type.is_none() {
                    self.state.ball_type = self.rules.on_first_pocket(ball);
                }
                self.state.ball_pool.remove(ball);
                debug!(
                    "Ball {ball} pocketed, {} left on the table",
                    self.state.ball_pool.len()
                );
                CommandOutcome::Applied
            }
        }
    }

    /// Current shooter sank the final ball. The operator's word is taken
    /// even when the shooter wasn't eligible yet.
    pub fn record_final_ball_pocketed(&mut self) -> CommandOutcome {
        if self.state.is_finished {
            return self.ignore(IgnoreReason::SessionFinished);
        }
        if !self.can_target_final_ball() {
            warn!(
                "Final ball recorded for {} before their group was cleared",
                self.current_name()
            );
        }

        // History holds one entry per applied command, finishing ones
        // included. Undo stops at the finish, so this entry is never popped.
        self.history
            .push(ActionKind::FinalBallPocketed, &self.state);
        self.conclude(self.state.current_shooter, Utc::now())
    }

    /// Current shooter fouled on the final ball; the next player wins.
    pub fn record_final_ball_foul(&mut self) -> CommandOutcome {
        if self.state.is_finished {
            return self.ignore(IgnoreReason::SessionFinished);
        }

        // Same as above: recorded for the log, never undone.
        self.history.push(ActionKind::FinalBallFoul, &self.state);
        match self.rules.on_foul_final_ball(&self.state) {
            GameOutcome::Wins(winner) => self.conclude(winner, Utc::now()),
            GameOutcome::Continues => CommandOutcome::Applied,
        }
    }

    /// Records a missed shot and hands the table to the next player.
    pub fn pass_turn(&mut self) -> CommandOutcome {
        if self.state.is_finished {
            return self.ignore(IgnoreReason::SessionFinished);
        }

        self.history.push(ActionKind::PassTurn, &self.state);
        if let Some(shooter) = self.state.current_player_mut() {
            shooter.shots += 1;
            shooter.is_current_turn = false;
        }
        self.state.current_shooter = self.state.next_shooter();
        if let Some(next) = self.state.current_player_mut() {
            next.is_current_turn = true;
        }
        if self.rules.toggles_on_turn_pass(&self.state) {
            self.state.ball_type = self.state.ball_type.map(BallType::toggled);
        }
        debug!("Turn passed to {}", self.current_name());
        CommandOutcome::Applied
    }

    /// Puts back the state from before the last command.
    pub fn undo(&mut self) -> CommandOutcome {
        if self.state.is_finished {
            return self.ignore(IgnoreReason::SessionFinished);
        }
        let Some(snapshot) = self.history.pop() else {
            return self.ignore(IgnoreReason::NothingToUndo);
        };
        self.state = snapshot.state;
        debug!("Undid {}", snapshot.action);
        CommandOutcome::Applied
    }

    /// Ends the match with the player at `winner_index` as winner.
    /// Calling it on a finished match changes nothing.
    pub fn finish(&mut self, winner_index: usize) -> CommandOutcome {
        self.finish_at(winner_index, Utc::now())
    }

    pub fn finish_at(&mut self, winner_index: usize, finished_at: DateTime<Utc>) -> CommandOutcome {
        if self.state.is_finished {
            return self.ignore(IgnoreReason::SessionFinished);
        }
        if winner_index >= self.state.players.len() {
            return self.ignore(IgnoreReason::InvalidPlayerIndex(winner_index));
        }
        self.conclude(winner_index, finished_at)
    }

    fn conclude(&mut self, winner_index: usize, finished_at: DateTime<Utc>) -> CommandOutcome {
        let winner = self
            .state
            .players
            .get(winner_index)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let duration = seconds_between(self.state.started_at, finished_at);

        self.state.is_finished = true;
        self.state.winner = Some(winner.clone());
        self.state.finished_at = Some(finished_at);
        self.state.duration_secs = Some(duration);
        info!("{} match won by {winner} after {duration}s", self.state.mode);

        CommandOutcome::Finished(Box::new(CompletedGame::from_state(
            &self.state,
            winner_index,
        )))
    }

    fn ignore(&self, reason: IgnoreReason) -> CommandOutcome {
        match reason {
            IgnoreReason::BallNotInPool(_) | IgnoreReason::InvalidPlayerIndex(_) => {
                warn!("Command ignored: {reason}");
            }
            _ => debug!("Command ignored: {reason}"),
        }
        CommandOutcome::Ignored(reason)
    }

    fn current_name(&self) -> &str {
        self.state
            .current_player()
            .map_or("<nobody>", |p| p.name.as_str())
    }
}

/// Whole seconds from `start` to `end`, never negative.
fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    u64::try_from((end - start).num_seconds()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn duo() -> GameSession {
        GameSession::start(MatchSetup::with_players(
            Mode::Standard,
            ["alice", "bob"],
            vec![true, false],
        ))
        .unwrap()
    }

    fn nine_ball_trio() -> GameSession {
        GameSession::start(MatchSetup::with_players(
            Mode::NineBallTrio,
            ["alice", "bob", "carol"],
            vec![false; 3],
        ))
        .unwrap()
    }

    #[test]
    fn test_start_rejects_blank_name() {
        let setup = MatchSetup::with_players(Mode::Standard, ["alice", ""], vec![false, false]);
        assert_eq!(
            GameSession::start(setup).unwrap_err(),
            ValidationError::BlankName { index: 1 }
        );
    }

    #[test]
    fn test_start_state() {
        let session = duo();
        assert_eq!(session.phase(), SessionPhase::AwaitingBallTypeSelection);
        assert_eq!(session.state().current_shooter, 0);
        assert!(session.players()[0].is_current_turn);
        assert!(!session.players()[1].is_current_turn);
        assert_eq!(session.state().ball_pool, BallPool::grouped());
        assert_eq!(session.history_len(), 0);
    }

    #[test]
    fn test_preassigned_modes_skip_selection() {
        assert_eq!(nine_ball_trio().phase(), SessionPhase::InProgress);
        let ffa = GameSession::start(MatchSetup::with_players(
            Mode::FreeForAll,
            ["a", "b", "c"],
            vec![false; 3],
        ))
        .unwrap();
        assert_eq!(ffa.state().ball_type, Some(BallType::All));
        assert_eq!(ffa.phase(), SessionPhase::InProgress);
    }

    #[test]
    fn test_first_pocket_assigns_type() {
        let mut session = duo();
        assert!(session.record_pocket(11).is_applied());
        assert_eq!(session.state().ball_type, Some(BallType::Striped));
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert!(!session.state().ball_pool.contains(11));

        let alice = &session.players()[0];
        assert_eq!((alice.shots, alice.pocketed), (1, 1));
    }

    #[test]
    fn test_later_pockets_keep_assignment() {
        let mut session = duo();
        session.record_pocket(2);
        session.record_pocket(12);
        assert_eq!(session.state().ball_type, Some(BallType::Solid));
    }

    #[test]
    fn test_missing_ball_is_ignored_without_snapshot() {
        let mut session = duo();
        session.record_pocket(4);
        let before = session.state().clone();
        assert_eq!(
            session.record_pocket(4),
            CommandOutcome::Ignored(IgnoreReason::BallNotInPool(4))
        );
        assert_eq!(
            session.record_pocket(8),
            CommandOutcome::Ignored(IgnoreReason::BallNotInPool(8))
        );
        assert_eq!(session.state(), &before);
        assert_eq!(session.history_len(), 1);
    }

    #[test]
    fn test_select_ball_type() {
        let mut session = duo();
        assert_eq!(
            session.select_ball_type(BallType::All),
            CommandOutcome::Ignored(IgnoreReason::BallTypeNotSelectable)
        );
        assert!(session.select_ball_type(BallType::Solid).is_applied());
        assert_eq!(
            session.select_ball_type(BallType::Striped),
            CommandOutcome::Ignored(IgnoreReason::BallTypeAlreadyAssigned)
        );
        assert!(session.undo().is_applied());
        assert_eq!(session.state().ball_type, None);
    }

    #[test]
    fn test_selection_not_offered_in_nine_ball() {
        let mut session = nine_ball_trio();
        assert_eq!(
            session.select_ball_type(BallType::Solid),
            CommandOutcome::Ignored(IgnoreReason::BallTypeNotSelectable)
        );
    }

    #[test]
    fn test_pass_turn_rotates_and_counts_miss() {
        let mut session = nine_ball_trio();
        session.pass_turn();
        session.pass_turn();
        assert_eq!(session.state().current_shooter, 2);
        session.pass_turn();
        assert_eq!(session.state().current_shooter, 0);
        assert!(session.players()[0].is_current_turn);
        assert_eq!(
            session
                .players()
                .iter()
                .filter(|p| p.is_current_turn)
                .count(),
            1
        );
        assert!(session.players().iter().all(|p| p.shots == 1 && p.pocketed == 0));
    }

    #[test]
    fn test_standard_pass_toggles_assignment() {
        let mut session = duo();
        session.pass_turn();
        assert_eq!(session.state().ball_type, None);

        session.record_pocket(3);
        assert_eq!(session.state().ball_type, Some(BallType::Solid));
        session.pass_turn();
        assert_eq!(session.state().ball_type, Some(BallType::Striped));
        session.pass_turn();
        assert_eq!(session.state().ball_type, Some(BallType::Solid));
    }

    #[test]
    fn test_pocket_does_not_rotate() {
        let mut session = duo();
        session.record_pocket(1);
        session.record_pocket(2);
        assert_eq!(session.state().current_shooter, 0);
    }

    #[test]
    fn test_nine_ball_immediate_win() {
        let mut session = nine_ball_trio();
        session.pass_turn();
        let outcome = session.record_pocket(9);
        let game = outcome.completed_game().unwrap();
        assert_eq!(game.winner_name, "bob");
        assert_eq!(game.winner_index, 1);
        assert!(session.is_finished());
        assert_eq!(session.players()[1].pocketed, 1);
        assert_eq!(session.state().ball_pool.len(), 9);
    }

    #[test]
    fn test_eight_ball_after_clearing_group_wins() {
        let mut session = duo();
        for ball in 1..=7 {
            session.record_pocket(ball);
        }
        assert!(session.can_target_final_ball());
        let outcome = session.record_pocket(8);
        assert_eq!(outcome.completed_game().unwrap().winner_name, "alice");
    }

    #[test]
    fn test_final_ball_pocketed() {
        let mut session = duo();
        session.pass_turn();
        let outcome = session.record_final_ball_pocketed();
        assert_eq!(outcome.completed_game().unwrap().winner_name, "bob");
        assert_eq!(session.state().winner.as_deref(), Some("bob"));
        assert_eq!(session.phase(), SessionPhase::Finished);
    }

    #[test]
    fn test_final_ball_foul_awards_next_player() {
        let mut session = nine_ball_trio();
        session.pass_turn();
        session.pass_turn();
        let outcome = session.record_final_ball_foul();
        assert_eq!(outcome.completed_game().unwrap().winner_name, "alice");
    }

    #[test]
    fn test_finished_session_ignores_commands() {
        let mut session = duo();
        session.record_pocket(1);
        session.record_final_ball_pocketed();
        let before = session.state().clone();

        let finished = CommandOutcome::Ignored(IgnoreReason::SessionFinished);
        assert_eq!(session.record_pocket(2), finished);
        assert_eq!(session.pass_turn(), finished);
        assert_eq!(session.undo(), finished);
        assert_eq!(session.record_final_ball_foul(), finished);
        assert_eq!(session.finish(1), finished);
        assert_eq!(session.select_ball_type(BallType::Solid), finished);
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn test_finishing_commands_are_logged() {
        let mut session = duo();
        session.record_pocket(1);
        session.record_final_ball_pocketed();
        assert_eq!(session.history_len(), 2);
        assert_eq!(session.last_action(), Some(ActionKind::FinalBallPocketed));
        assert_eq!(
            session.undo(),
            CommandOutcome::Ignored(IgnoreReason::SessionFinished)
        );
        assert_eq!(session.history_len(), 2);

        let mut session = nine_ball_trio();
        session.record_final_ball_foul();
        assert_eq!(session.last_action(), Some(ActionKind::FinalBallFoul));
        assert_eq!(session.history_len(), 1);
    }

    #[test]
    fn test_finish_duration() {
        let start = Utc::now();
        let mut session = GameSession::start_at(
            MatchSetup::with_players(Mode::Standard, ["a", "b"], vec![false; 2]),
            start,
        )
        .unwrap();
        let outcome = session.finish_at(1, start + Duration::seconds(125));
        let game = outcome.completed_game().unwrap();
        assert_eq!(game.duration_seconds, 125);
        assert_eq!(session.state().duration_secs, Some(125));
        assert_eq!(session.elapsed_secs(start + Duration::hours(3)), 125);
    }

    #[test]
    fn test_finish_rejects_bad_index() {
        let mut session = duo();
        assert_eq!(
            session.finish(5),
            CommandOutcome::Ignored(IgnoreReason::InvalidPlayerIndex(5))
        );
        assert!(!session.is_finished());
    }

    #[test]
    fn test_undo_restores_pool_and_assignment() {
        let mut session = duo();
        let initial = session.state().clone();
        session.record_pocket(5);
        session.pass_turn();
        session.record_pocket(13);

        for _ in 0..3 {
            assert!(session.undo().is_applied());
        }
        assert_eq!(session.state(), &initial);
        assert_eq!(
            session.undo(),
            CommandOutcome::Ignored(IgnoreReason::NothingToUndo)
        );
    }

    #[test]
    fn test_target_hint() {
        let mut session = nine_ball_trio();
        assert_eq!(session.target_hint(), Some(1));
        session.record_pocket(1);
        assert_eq!(session.target_hint(), Some(2));
        assert_eq!(duo().target_hint(), None);
    }
}
