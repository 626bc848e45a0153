//! Solver library for liquid sorting puzzles.
//!
//! Each tube holds a stack of colored drops. A pour moves the top run of
//! one color onto an empty tube or onto the same color. The solver runs a
//! depth-first search over tube configurations, never revisiting one, and
//! returns the pours that leave every tube holding a single color.

pub mod error;
pub mod executor;
pub mod pruning;
pub mod puzzle;
pub mod solver;

// Re-export main types
pub use error::{ReplayError, SearchError, SolveError, ValidationError};
pub use executor::{pour, replay, replay_states, verify_solution};
pub use puzzle::{Color, Configuration, DropLabel, Fingerprint, GoalRule, Move, Palette, PuzzleInput, Tube};
pub use solver::{find_moves, solve, SearchSession, SearchStats, Solution, SolverConfig, Step};
