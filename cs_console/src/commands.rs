use cue_score::{
    BallType, MatchSetup, Mode,
    game::{BallNumber, ParseModeError},
};
use std::fmt;

/// Marks a player as tracked when appended to the name.
pub const TRACKED_SUFFIX: char = '*';

/// Change to a setup that is still being filled in. Seats are 0-indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupEdit {
    Name { seat: usize, name: String },
    ToggleTracking(usize),
    /// Tournament only.
    AddSeat,
    /// Tournament only, never below the minimum table.
    RemoveSeat(usize),
}

impl SetupEdit {
    /// Returns `false` if the setup refused the change.
    pub fn apply(&self, setup: &mut MatchSetup) -> bool {
        match self {
            Self::Name { seat, name } => setup.set_name(*seat, name.as_str()),
            Self::ToggleTracking(seat) => setup.toggle_tracking(*seat),
            Self::AddSeat => setup.add_player(),
            Self::RemoveSeat(seat) => setup.remove_player(*seat),
        }
    }
}

impl fmt::Display for SetupEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name { seat, name } => write!(f, "name seat {} '{name}'", seat + 1),
            Self::ToggleTracking(seat) => write!(f, "toggle tracking for seat {}", seat + 1),
            Self::AddSeat => write!(f, "add a seat"),
            Self::RemoveSeat(seat) => write!(f, "remove seat {}", seat + 1),
        }
    }
}

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Start(MatchSetup),
    /// Begin filling in a setup seat by seat.
    Setup(Mode),
    Edit(SetupEdit),
    /// Start a match from the setup being filled in.
    Begin,
    Select(BallType),
    Pocket(BallNumber),
    FinalBall,
    Foul,
    Pass,
    Undo,
    Status,
    /// All tracked players, or just the named one.
    Stats(Option<String>),
    Leaderboard,
    Reset,
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Start command missing the mode.
    StartMissingMode,
    /// Unknown mode name.
    InvalidMode(String),
    /// Start command with a mode but no names.
    StartMissingPlayers,
    /// Select command with something other than solid or striped.
    InvalidBallType(String),
    /// Pocket command missing a ball or with a non-numeric one.
    InvalidBallNumber(String),
    /// Seat number missing, not a number, or zero.
    InvalidSeat(String),
    /// Name command without a name.
    NameMissing,
    /// Seat command other than "seat add" or "seat remove N".
    InvalidSeatCommand,
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartMissingMode => {
                write!(f, "Start requires a mode (e.g., 'start standard alice* bob')")
            }
            Self::InvalidMode(mode) => write!(
                f,
                "Unknown mode '{mode}'. Use one of: {}",
                Mode::ALL.map(|m| m.to_string()).join(", ")
            ),
            Self::StartMissingPlayers => write!(
                f,
                "Start requires player names; append '{TRACKED_SUFFIX}' to track a player"
            ),
            Self::InvalidBallType(value) => write!(
                f,
                "Invalid ball type '{value}'. Use 'select solid' or 'select striped'"
            ),
            Self::InvalidBallNumber(value) => write!(
                f,
                "Invalid ball '{value}'. Must be a ball number (e.g., 'pocket 3')"
            ),
            Self::InvalidSeat(value) => write!(
                f,
                "Invalid seat '{value}'. Seats are numbered from 1 (e.g., 'track 2')"
            ),
            Self::NameMissing => write!(f, "Name requires a seat and a name (e.g., 'name 1 alice')"),
            Self::InvalidSeatCommand => {
                write!(f, "Invalid seat command. Use 'seat add' or 'seat remove N'")
            }
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{cmd}'. Type 'help' to see available commands"
            ),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ParseModeError> for ParseError {
    fn from(value: ParseModeError) -> Self {
        Self::InvalidMode(value.0)
    }
}

/// Parse a line of operator input into an [`OperatorCommand`].
///
/// Command words are case-insensitive; player names keep their case.
///
/// # Examples
///
/// ```
/// use cs_console::commands::{OperatorCommand, parse_command};
/// use cue_score::BallType;
///
/// assert_eq!(parse_command("pass"), Ok(OperatorCommand::Pass));
/// assert_eq!(parse_command("pocket 3"), Ok(OperatorCommand::Pocket(3)));
/// assert_eq!(
///     parse_command("select striped"),
///     Ok(OperatorCommand::Select(BallType::Striped))
/// );
/// ```
pub fn parse_command(input: &str) -> Result<OperatorCommand, ParseError> {
    let trimmed = input.trim();

    match trimmed.to_ascii_lowercase().as_str() {
        "final" => return Ok(OperatorCommand::FinalBall),
        "foul" => return Ok(OperatorCommand::Foul),
        "pass" => return Ok(OperatorCommand::Pass),
        "undo" => return Ok(OperatorCommand::Undo),
        "status" => return Ok(OperatorCommand::Status),
        "leaderboard" => return Ok(OperatorCommand::Leaderboard),
        "reset" => return Ok(OperatorCommand::Reset),
        "begin" => return Ok(OperatorCommand::Begin),
        "help" | "?" => return Ok(OperatorCommand::Help),
        "quit" | "exit" => return Ok(OperatorCommand::Quit),
        _ => {}
    }

    let parts: Vec<&str> = trimmed.split_ascii_whitespace().collect();
    let keyword = parts.first().map(|word| word.to_ascii_lowercase());
    match keyword.as_deref() {
        Some("start") => parse_start_command(&parts),
        Some("setup") => {
            let mode: Mode = parts.get(1).ok_or(ParseError::StartMissingMode)?.parse()?;
            Ok(OperatorCommand::Setup(mode))
        }
        Some("name") => parse_name_command(&parts),
        Some("track") => Ok(OperatorCommand::Edit(SetupEdit::ToggleTracking(
            parse_seat(parts.get(1).copied())?,
        ))),
        Some("seat") => parse_seat_command(&parts),
        Some("select") => parse_select_command(&parts),
        Some("pocket") => parse_pocket_command(&parts),
        Some("stats") => Ok(OperatorCommand::Stats(
            (parts.len() > 1).then(|| parts[1..].join(" ")),
        )),
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

/// Parse a start command: "start MODE NAME[*] ..."
fn parse_start_command(parts: &[&str]) -> Result<OperatorCommand, ParseError> {
    let mode: Mode = parts.get(1).ok_or(ParseError::StartMissingMode)?.parse()?;
    let seats = &parts[2..];
    if seats.is_empty() {
        return Err(ParseError::StartMissingPlayers);
    }

    let (names, tracked): (Vec<&str>, Vec<bool>) = seats
        .iter()
        .map(|seat| match seat.strip_suffix(TRACKED_SUFFIX) {
            Some(name) => (name, true),
            None => (*seat, false),
        })
        .unzip();
    Ok(OperatorCommand::Start(MatchSetup::with_players(
        mode, names, tracked,
    )))
}

/// Parse a name command: "name SEAT NAME ..."
fn parse_name_command(parts: &[&str]) -> Result<OperatorCommand, ParseError> {
    let seat = parse_seat(parts.get(1).copied())?;
    if parts.len() < 3 {
        return Err(ParseError::NameMissing);
    }
    Ok(OperatorCommand::Edit(SetupEdit::Name {
        seat,
        name: parts[2..].join(" "),
    }))
}

/// Parse a seat command: "seat add" or "seat remove SEAT"
fn parse_seat_command(parts: &[&str]) -> Result<OperatorCommand, ParseError> {
    let action = parts.get(1).map(|word| word.to_ascii_lowercase());
    match action.as_deref() {
        Some("add") => Ok(OperatorCommand::Edit(SetupEdit::AddSeat)),
        Some("remove") => Ok(OperatorCommand::Edit(SetupEdit::RemoveSeat(parse_seat(
            parts.get(2).copied(),
        )?))),
        _ => Err(ParseError::InvalidSeatCommand),
    }
}

/// 1-based seat number from the operator, 0-based index for the setup.
fn parse_seat(value: Option<&str>) -> Result<usize, ParseError> {
    let value = value.unwrap_or_default();
    match value.parse::<usize>() {
        Ok(seat) if seat > 0 => Ok(seat - 1),
        _ => Err(ParseError::InvalidSeat(value.to_string())),
    }
}

/// Parse a select command: "select solid|striped"
fn parse_select_command(parts: &[&str]) -> Result<OperatorCommand, ParseError> {
    let value = parts.get(1).copied().unwrap_or_default();
    match value.to_ascii_lowercase().as_str() {
        "solid" | "solids" => Ok(OperatorCommand::Select(BallType::Solid)),
        "striped" | "stripes" => Ok(OperatorCommand::Select(BallType::Striped)),
        _ => Err(ParseError::InvalidBallType(value.to_string())),
    }
}

/// Parse a pocket command: "pocket BALL"
fn parse_pocket_command(parts: &[&str]) -> Result<OperatorCommand, ParseError> {
    let value = parts.get(1).copied().unwrap_or_default();
    value
        .parse::<BallNumber>()
        .map(OperatorCommand::Pocket)
        .map_err(|_| ParseError::InvalidBallNumber(value.to_string()))
}
