//! Line-oriented operator console for a single pool table.
//!
//! Reads one command per line from stdin, applies it to the scoreboard
//! and prints what changed.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Error};
use chrono::Utc;
use ctrlc::set_handler;
use cs_console::commands::{OperatorCommand, parse_command};
use cue_score::{
    CommandOutcome, CompletedGame, GameSession, KeyValueStore, MatchSetup, MemoryStore, Mode,
    Scoreboard, StatsRepository, StoreConfig,
    stats::{GlobalPlayerStats, format_duration},
};
use log::{info, warn};
use pico_args::Arguments;

const HELP: &str = "\
Keep score for a pool table from the terminal

USAGE:
  cs_console [OPTIONS]

OPTIONS:
  --data-dir   DIR         Statistics directory  [default: env CUE_SCORE_DATA_DIR or ./cue_score_data]

FLAGS:
  --memory                 Keep statistics in memory only
  -h, --help               Print help information

ENVIRONMENT:
  CUE_SCORE_DATA_DIR       Statistics directory
  CUE_SCORE_PRETTY_JSON    Indent stored JSON (true/false)
  RUST_LOG                 Log level (e.g., info, debug)
";

const COMMANDS: &str = "\
COMMANDS:
  start MODE NAME[*] ...   Start a match; '*' tracks a player's stats
  setup MODE               Fill in a match seat by seat instead
  name SEAT NAME           Name a seat (seats count from 1)
  track SEAT               Toggle stats tracking for a seat
  seat add | remove SEAT   Change the table size (tournament only)
  begin                    Start the match being set up
  select solid|striped     Assign the current shooter's group
  pocket N                 Current shooter pocketed ball N
  final                    Current shooter sank the final ball
  foul                     Current shooter fouled on the final ball
  pass                     Missed shot, next player's turn
  undo                     Revert the last command
  status                   Show the table
  stats [NAME]             Cumulative statistics
  leaderboard              Players ranked by games won
  reset                    Delete all statistics
  help                     Show this list
  quit                     Exit

MODES:
";

struct Args {
    data_dir: Option<PathBuf>,
    memory: bool,
}

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        data_dir: pargs.opt_value_from_str("--data-dir")?,
        memory: pargs.contains("--memory"),
    };
    let leftover = pargs.finish();

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();
    if !leftover.is_empty() {
        warn!("Ignoring unexpected arguments: {leftover:?}");
    }

    if args.memory {
        info!("Keeping statistics in memory");
        run(Scoreboard::new(StatsRepository::new(MemoryStore::new())))
    } else {
        let mut config = StoreConfig::from_env();
        if let Some(dir) = args.data_dir {
            config.data_dir = dir;
        }
        info!("Keeping statistics in {}", config.data_dir.display());
        run(Scoreboard::open(&config))
    }
}

fn run<S: KeyValueStore>(mut board: Scoreboard<S>) -> Result<(), Error> {
    print_commands();
    let mut draft: Option<MatchSetup> = None;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}> ", board.phase());
        stdout.flush().context("Failed to write prompt")?;

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read operator input")?;
        if read == 0 {
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(error) => {
                println!("{error}");
                continue;
            }
        };

        match command {
            OperatorCommand::Start(setup) => match board.start_match(setup) {
                Ok(session) => print_session(session),
                Err(error) => println!("Can't start: {error}"),
            },
            OperatorCommand::Setup(mode) => {
                print_draft(draft.insert(MatchSetup::new(mode)));
            }
            OperatorCommand::Edit(edit) => match draft.as_mut() {
                Some(setup) => {
                    if edit.apply(setup) {
                        print_draft(setup);
                    } else {
                        println!("Can't {edit} in a {} setup", setup.mode);
                    }
                }
                None => println!("No setup in progress. Use 'setup MODE' first."),
            },
            OperatorCommand::Begin => {
                let Some(setup) = draft.take() else {
                    println!("No setup in progress. Use 'setup MODE' first.");
                    continue;
                };
                match board.start_match(setup.clone()) {
                    Ok(session) => print_session(session),
                    Err(error) => {
                        println!("Can't start: {error}");
                        draft = Some(setup);
                    }
                }
            }
            OperatorCommand::Select(ball_type) => {
                let outcome = board.select_ball_type(ball_type);
                report(&board, &outcome);
            }
            OperatorCommand::Pocket(ball) => {
                let outcome = board.record_pocket(ball);
                report(&board, &outcome);
            }
            OperatorCommand::FinalBall => {
                let outcome = board.record_final_ball_pocketed();
                report(&board, &outcome);
            }
            OperatorCommand::Foul => {
                let outcome = board.record_final_ball_foul();
                report(&board, &outcome);
            }
            OperatorCommand::Pass => {
                let outcome = board.pass_turn();
                report(&board, &outcome);
            }
            OperatorCommand::Undo => {
                let outcome = board.undo();
                report(&board, &outcome);
            }
            OperatorCommand::Status => match board.session() {
                Some(session) => print_session(session),
                None => println!("No match in progress. Use 'start' to begin."),
            },
            OperatorCommand::Stats(Some(name)) => match board.player_stats(&name) {
                Some(stats) => print_player_stats(&name, stats),
                None => println!("No record for {name}"),
            },
            OperatorCommand::Stats(None) => {
                if board.global_stats().is_empty() {
                    println!("No statistics yet");
                }
                for (name, stats) in board.global_stats() {
                    print_player_stats(name, stats);
                }
            }
            OperatorCommand::Leaderboard => print_leaderboard(&board),
            OperatorCommand::Reset => match board.reset_all_statistics() {
                Ok(()) => println!("All statistics deleted"),
                Err(error) => println!("Reset incomplete: {error}"),
            },
            OperatorCommand::Help => print_commands(),
            OperatorCommand::Quit => return Ok(()),
        }
    }
}

fn report<S: KeyValueStore>(board: &Scoreboard<S>, outcome: &CommandOutcome) {
    match outcome {
        CommandOutcome::Applied => {
            if let Some(session) = board.session() {
                print_session(session);
            }
        }
        CommandOutcome::Finished(game) => print_result(board, game),
        CommandOutcome::Ignored(reason) => println!("Ignored: {reason}"),
    }
}

fn print_commands() {
    print!("{COMMANDS}");
    for mode in Mode::ALL {
        println!(
            "  {:<20} {} ({} players)",
            mode.to_string(),
            mode.display_name(),
            mode.player_count()
        );
    }
}

fn print_draft(setup: &MatchSetup) {
    println!(
        "Setting up {} ({} players)",
        setup.mode.display_name(),
        setup.mode.player_count()
    );
    for (i, (name, tracked)) in setup.names().iter().zip(setup.tracked()).enumerate() {
        let name = if name.trim().is_empty() { "<empty>" } else { name };
        let tracked = if *tracked { " (tracked)" } else { "" };
        println!("  {}. {name}{tracked}", i + 1);
    }
}

fn print_session(session: &GameSession) {
    let state = session.state();
    println!(
        "{} | {} | {}",
        session.mode().display_name(),
        session.phase(),
        format_duration(session.elapsed_secs(Utc::now()))
    );

    for (i, player) in session.players().iter().enumerate() {
        let marker = if player.is_current_turn { '>' } else { ' ' };
        let tracked = if player.tracked { "*" } else { "" };
        println!(
            "{marker} {}. {}{tracked}  shots {}  pocketed {}  accuracy {}%",
            i + 1,
            player.name,
            player.shots,
            player.pocketed,
            player.accuracy_display()
        );
    }

    let assignment = state
        .ball_type
        .map_or_else(|| "open table".to_string(), |t| t.to_string());
    println!("Shooting: {assignment}");

    let remaining: Vec<_> = state
        .ball_pool
        .remaining()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("On the table: {}", remaining.join(" "));

    if session.mode().is_nine_ball() {
        if let Some(target) = session.target_hint() {
            println!("Target: {target}");
        }
    } else if session.can_target_final_ball() {
        println!("The {} is open", session.final_ball());
    }
}

fn print_result<S: KeyValueStore>(board: &Scoreboard<S>, game: &CompletedGame) {
    println!(
        "{} wins {} after {}",
        game.winner_name,
        game.mode.display_name(),
        format_duration(game.duration_seconds)
    );
    for (place, player) in game.podium().into_iter().enumerate() {
        println!(
            "  {}. {} ({} pocketed, {}%)",
            place + 1,
            player.name,
            player.pocketed,
            player.accuracy_display()
        );
    }
    if let Some(best) = board.best_player() {
        println!("Best player so far: {}", best.name);
    }
}

fn print_player_stats(name: &str, stats: &GlobalPlayerStats) {
    println!(
        "{name}: {} played, {} won ({}%), accuracy {}%, {} at the table",
        stats.games_played,
        stats.games_won,
        stats.win_rate_display(),
        stats.accuracy_display(),
        format_duration(stats.total_game_time_seconds)
    );
}

fn print_leaderboard<S: KeyValueStore>(board: &Scoreboard<S>) {
    let ranked = board.leaderboard();
    if ranked.is_empty() {
        println!("No statistics yet");
        return;
    }
    for entry in ranked {
        println!(
            "{:>3}. {:<20} {:>3} won / {:>3} played  {:>5}%",
            entry.rank,
            entry.name,
            entry.stats.games_won,
            entry.stats.games_played,
            entry.stats.win_rate_display()
        );
    }
}
