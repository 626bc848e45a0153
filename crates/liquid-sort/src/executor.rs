//! Pour execution and move-list replay.
//!
//! [`pour`] is the only function that changes a tube. Replay applies a
//! caller's move list one pour at a time and reports the first bad move.

use crate::error::ReplayError;
use crate::pruning::can_pour;
use crate::puzzle::{top, Configuration, DropLabel, GoalRule, Move, Tube};

/// Move the top run of same-colored drops from `from` into `to`, as far as
/// `to`'s free space allows. Returns the number of drops moved.
pub fn pour(from: &mut Tube, to: &mut Tube, capacity: usize) -> usize {
    let mut moved = 0;
    while let Some(color) = top(from) {
        if to.len() >= capacity {
            break;
        }
        if let Some(dest_top) = top(to) {
            if dest_top != color {
                break;
            }
        }
        from.pop();
        to.push(color);
        moved += 1;
    }
    moved
}

/// Apply `moves` in order, returning every configuration along the way
/// (starting configuration first).
///
/// The search's pruning rule is not enforced here; any physically
/// possible pour is accepted.
pub fn replay_states(
    start: &Configuration,
    moves: &[Move],
) -> Result<Vec<Configuration>, ReplayError> {
    let mut states = Vec::with_capacity(moves.len() + 1);
    states.push(start.clone());
    for (step, &mv) in moves.iter().enumerate() {
        let current = &states[states.len() - 1];
        let tube_count = current.tube_count();
        if mv.from >= tube_count || mv.to >= tube_count {
            return Err(ReplayError::MoveOutOfRange {
                step,
                mv,
                tube_count,
            });
        }
        if mv.from == mv.to {
            return Err(ReplayError::SameTube {
                step,
                tube: mv.from,
            });
        }
        if !can_pour(
            &current.tubes()[mv.from],
            &current.tubes()[mv.to],
            current.capacity(),
        ) {
            return Err(ReplayError::IllegalPour { step, mv });
        }
        let next = current.with_pour(mv);
        states.push(next);
    }
    Ok(states)
}

/// Validate `input` and apply `moves` to it, returning the final configuration.
pub fn replay(input: &[Vec<DropLabel>], moves: &[Move]) -> Result<Configuration, ReplayError> {
    let (start, _) = Configuration::from_input(input)?;
    let mut states = replay_states(&start, moves)?;
    Ok(states.pop().unwrap_or(start))
}

/// Does the move list sort the puzzle?
pub fn verify_solution(input: &[Vec<DropLabel>], moves: &[Move], rule: GoalRule) -> bool {
    match replay(input, moves) {
        Ok(end) => end.is_goal(rule),
        Err(_) => false,
    }
}
