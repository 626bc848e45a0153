use crate::puzzle::Move;
use crate::solver::SearchStats;

/// Malformed puzzle input, reported before any search starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("puzzle has no tubes")]
    Empty,

    #[error("tube count mismatch: expected {expected} tubes, found {actual}")]
    TubeCountMismatch { expected: usize, actual: usize },

    #[error("tube volume mismatch: tube {tube} holds {actual} drops, expected {expected} or 0 (empty)")]
    TubeVolumeMismatch {
        tube: usize,
        expected: usize,
        actual: usize,
    },

    #[error("puzzle too large: {0}")]
    TooLarge(String),
}

/// A search that ended without reaching a sorted configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("search exhausted: no sorted configuration is reachable ({0})")]
    Exhausted(SearchStats),

    #[error("search timed out ({0})")]
    Timeout(SearchStats),

    #[error("expansion limit reached ({0})")]
    ExpansionLimit(SearchStats),

    #[error("search cancelled ({0})")]
    Cancelled(SearchStats),
}

impl SearchError {
    pub fn stats(&self) -> &SearchStats {
        match self {
            SearchError::Exhausted(stats)
            | SearchError::Timeout(stats)
            | SearchError::ExpansionLimit(stats)
            | SearchError::Cancelled(stats) => stats,
        }
    }

    /// Short machine-readable tag
    pub fn reason(&self) -> &'static str {
        match self {
            SearchError::Exhausted(_) => "search_exhausted",
            SearchError::Timeout(_) => "timeout",
            SearchError::ExpansionLimit(_) => "expansion_limit",
            SearchError::Cancelled(_) => "cancelled",
        }
    }
}

/// Errors from [`crate::solve`] and [`crate::find_moves`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// A move list that cannot be replayed against its puzzle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("move {step} ({mv}): tube index out of range for {tube_count} tubes")]
    MoveOutOfRange {
        step: usize,
        mv: Move,
        tube_count: usize,
    },

    #[error("move {step}: cannot pour tube {tube} into itself")]
    SameTube { step: usize, tube: usize },

    #[error("move {step} ({mv}): nothing can be poured")]
    IllegalPour { step: usize, mv: Move },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::TubeCountMismatch {
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "tube count mismatch: expected 4 tubes, found 3"
        );
    }

    #[test]
    fn test_search_error_display() {
        let err = SearchError::Exhausted(SearchStats::default());
        assert!(err.to_string().starts_with("search exhausted"));
        assert_eq!(err.reason(), "search_exhausted");
    }

    #[test]
    fn test_replay_error_display() {
        let err = ReplayError::IllegalPour {
            step: 2,
            mv: Move::new(0, 3),
        };
        assert_eq!(err.to_string(), "move 2 (0->3): nothing can be poured");
    }
}
