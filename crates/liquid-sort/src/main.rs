//! CLI entry point for the liquid sort solver.
//!
//! Usage:
//!   liquid-sort solve <puzzle.json> [options]
//!   liquid-sort solve --stdin [options]
//!   liquid-sort verify <puzzle.json> --moves '[[0,2],[1,0]]' [options]
//!
//! The puzzle file is a JSON array of tubes, each an array of labels
//! (any JSON numbers or strings), bottom drop first: `[[1,2],[2,1],[]]`.
//! `1`, `1.0` and `"1"` are three different liquids.
//!
//! Set `RUST_LOG=debug` for search progress.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;

use liquid_sort::{
    replay, replay_states, solve, Configuration, GoalRule, Move, PuzzleInput,
    SearchStats, SolveError, SolverConfig,
};

#[derive(Parser)]
#[command(name = "liquid-sort")]
#[command(about = "Depth-first solver for liquid sorting puzzles")]
#[command(
    long_about = "Depth-first solver for liquid sorting puzzles.\n\nA puzzle is a JSON array of tubes, each an array of labels, bottom drop first. Labels are JSON numbers or strings; 1, 1.0 and \"1\" are different liquids."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a move sequence that sorts the puzzle
    Solve {
        /// Path to puzzle JSON file (use --stdin to read from stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Read puzzle from stdin instead of file
        #[arg(long)]
        stdin: bool,

        /// When a configuration counts as sorted
        #[arg(long, value_enum, default_value = "monochrome")]
        goal: GoalArg,

        /// Also try pouring single-color tubes into empty tubes
        #[arg(long)]
        no_prune: bool,

        /// Maximum search time in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Maximum configurations to expand
        #[arg(long)]
        max_expansions: Option<usize>,

        /// Log every intermediate configuration of the solution
        #[arg(long)]
        show_states: bool,
    },
    /// Check that a move list sorts the puzzle
    Verify {
        /// Path to puzzle JSON file (use --stdin to read from stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Read puzzle from stdin instead of file
        #[arg(long)]
        stdin: bool,

        /// Moves as a JSON array of [from, to] pairs
        #[arg(long)]
        moves: String,

        /// When a configuration counts as sorted
        #[arg(long, value_enum, default_value = "monochrome")]
        goal: GoalArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GoalArg {
    Monochrome,
    FullOrEmpty,
}

impl From<GoalArg> for GoalRule {
    fn from(arg: GoalArg) -> Self {
        match arg {
            GoalArg::Monochrome => GoalRule::Monochrome,
            GoalArg::FullOrEmpty => GoalRule::FullOrEmpty,
        }
    }
}

/// Output format for a solve run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveOutput {
    solved: bool,
    moves: Vec<Move>,
    move_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    stats: SearchStats,
}

/// Output format for a verify run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOutput {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Solve {
            file,
            stdin,
            goal,
            no_prune,
            timeout,
            max_expansions,
            show_states,
        } => {
            let config = SolverConfig {
                goal: goal.into(),
                prune_monochrome_into_empty: !no_prune,
                timeout: timeout.map(Duration::from_secs),
                max_expansions,
            };
            match load_puzzle(file, stdin) {
                Ok(puzzle) => run_solve(&puzzle, &config, show_states),
                Err(message) => fail(&message),
            }
        }
        Commands::Verify {
            file,
            stdin,
            moves,
            goal,
        } => {
            let moves: Vec<Move> = match serde_json::from_str(&moves) {
                Ok(m) => m,
                Err(e) => process::exit(fail(&format!("Error parsing moves JSON: {}", e))),
            };
            match load_puzzle(file, stdin) {
                Ok(puzzle) => run_verify(&puzzle, &moves, goal.into()),
                Err(message) => fail(&message),
            }
        }
    };
    process::exit(code);
}

fn run_solve(puzzle: &PuzzleInput, config: &SolverConfig, show_states: bool) -> i32 {
    let (output, code) = match solve(puzzle, config) {
        Ok(solution) => {
            if show_states {
                log_states(puzzle, &solution.moves);
            }
            let output = SolveOutput {
                solved: true,
                move_count: solution.moves.len(),
                moves: solution.moves,
                reason: None,
                message: None,
                stats: solution.stats,
            };
            (output, 0)
        }
        Err(SolveError::Search(err)) => {
            let output = SolveOutput {
                solved: false,
                moves: Vec::new(),
                move_count: 0,
                reason: Some(err.reason().to_string()),
                message: Some(err.to_string()),
                stats: err.stats().clone(),
            };
            (output, 1)
        }
        Err(SolveError::Validation(err)) => {
            return fail(&format!("Invalid puzzle: {}", err));
        }
    };
    print_json(&output);
    code
}

fn run_verify(puzzle: &PuzzleInput, moves: &[Move], goal: GoalRule) -> i32 {
    let output = match replay(puzzle, moves) {
        Ok(end) if end.is_goal(goal) => VerifyOutput {
            valid: true,
            reason: None,
        },
        Ok(_) => VerifyOutput {
            valid: false,
            reason: Some("moves do not sort the puzzle".to_string()),
        },
        Err(err) => VerifyOutput {
            valid: false,
            reason: Some(err.to_string()),
        },
    };
    print_json(&output);
    if output.valid {
        0
    } else {
        1
    }
}

fn log_states(puzzle: &PuzzleInput, moves: &[Move]) {
    let Ok((start, palette)) = Configuration::from_input(puzzle) else {
        return;
    };
    match replay_states(&start, moves) {
        Ok(states) => {
            info!("start:\n{}", states[0].render(&palette));
            for (mv, state) in moves.iter().zip(states.iter().skip(1)) {
                info!("pour {}:\n{}", mv, state.render(&palette));
            }
        }
        Err(err) => info!("could not replay solution: {}", err),
    }
}

fn load_puzzle(file: Option<PathBuf>, stdin: bool) -> Result<PuzzleInput, String> {
    let json_content = if stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        buffer
    } else if let Some(path) = file {
        fs::read_to_string(&path).map_err(|e| format!("Failed to read file {:?}: {}", path, e))?
    } else {
        return Err("Must provide either a file path or --stdin".to_string());
    };

    serde_json::from_str(&json_content).map_err(|e| format!("Error parsing puzzle JSON: {}", e))
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to serialize output: {}", e),
    }
}

fn fail(message: &str) -> i32 {
    eprintln!("Error: {}", message);
    2
}
