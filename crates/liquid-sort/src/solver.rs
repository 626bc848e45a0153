//! Depth-first search for a sorting move sequence.
//!
//! A [`SearchSession`] owns everything one search needs: the frontier
//! stack, the set of fingerprints generated so far, and an arena of search
//! nodes. Each node remembers only its parent and the move that created
//! it, so a move path is rebuilt once, when a goal is popped.
//!
//! Deduplication is eager: a child's fingerprint is recorded the moment it
//! is generated, so a later pour in the same expansion that lands on the
//! same tubes is dropped. Which branch reaches a configuration first
//! therefore depends on generation order, not on path length.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fxhash::FxHashSet;
use log::{debug, info, trace};
use serde::Serialize;

use crate::error::{SearchError, SolveError};
use crate::pruning::legal_moves;
use crate::puzzle::{Configuration, DropLabel, Fingerprint, GoalRule, Move};

/// How often (in expansions) progress is logged
const PROGRESS_INTERVAL: usize = 100_000;

/// Configuration for the solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// What counts as a sorted configuration
    pub goal: GoalRule,
    /// Skip pouring a single-color tube into an empty tube
    pub prune_monochrome_into_empty: bool,
    /// Give up after this much wall-clock time
    pub timeout: Option<Duration>,
    /// Give up after expanding this many configurations
    pub max_expansions: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            goal: GoalRule::Monochrome,
            prune_monochrome_into_empty: true,
            timeout: None,
            max_expansions: None,
        }
    }
}

/// Counters for one search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    /// Configurations popped and expanded
    pub expanded: usize,
    /// Legal pours materialized, duplicates included
    pub generated: usize,
    /// Generated configurations dropped as already seen
    pub duplicates: usize,
    /// Expansions that produced no new configuration
    pub dead_ends: usize,
    /// Distinct configurations seen, root included
    pub visited: usize,
    /// Largest frontier size seen
    pub max_frontier: usize,
    /// Deepest node pushed onto the frontier
    pub max_depth: usize,
    /// Wall-clock time since the session started
    pub elapsed_ms: u64,
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} expanded, {} visited, {} duplicates, {} dead ends, max frontier {}, max depth {}, {} ms",
            self.expanded,
            self.visited,
            self.duplicates,
            self.dead_ends,
            self.max_frontier,
            self.max_depth,
            self.elapsed_ms
        )
    }
}

/// A move sequence that sorts the puzzle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub moves: Vec<Move>,
    pub stats: SearchStats,
}

/// Outcome of a single [`SearchSession::step`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The popped configuration is sorted; here is the path to it
    Solved(Vec<Move>),
    /// The popped configuration was expanded into this many new children
    Expanded { children: usize },
    /// Nothing left on the frontier
    Exhausted,
}

type NodeId = usize;

#[derive(Debug, Clone, Copy)]
struct Node {
    parent: Option<NodeId>,
    mv: Option<Move>,
    depth: usize,
}

#[derive(Debug)]
struct FrontierEntry {
    node: NodeId,
    configuration: Configuration,
}

enum Popped {
    Goal(Vec<Move>),
    Open(FrontierEntry),
}

/// One depth-first search run.
///
/// Not shareable between threads while running; every step needs `&mut self`.
#[derive(Debug)]
pub struct SearchSession {
    config: SolverConfig,
    visited: FxHashSet<Fingerprint>,
    nodes: Vec<Node>,
    frontier: Vec<FrontierEntry>,
    stats: SearchStats,
    started: Instant,
    cancel: Option<Arc<AtomicBool>>,
}

impl SearchSession {
    /// Start a search from `start`. The root is the first thing popped, so
    /// an already-sorted puzzle solves with no moves.
    pub fn new(start: Configuration, config: SolverConfig) -> Self {
        let mut visited = FxHashSet::default();
        visited.insert(start.fingerprint());
        Self {
            config,
            visited,
            nodes: vec![Node {
                parent: None,
                mv: None,
                depth: 0,
            }],
            frontier: vec![FrontierEntry {
                node: 0,
                configuration: start,
            }],
            stats: SearchStats {
                max_frontier: 1,
                ..Default::default()
            },
            started: Instant::now(),
            cancel: None,
        }
    }

    /// Stop [`run`](Self::run) once `flag` becomes true.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    /// Snapshot of the counters so far
    pub fn stats(&self) -> SearchStats {
        SearchStats {
            visited: self.visited.len(),
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            ..self.stats.clone()
        }
    }

    /// Pop the most recently pushed configuration and either report it as
    /// solved or push its unseen children.
    ///
    /// Stepping again after `Solved` keeps searching the remaining frontier.
    pub fn step(&mut self) -> Step {
        match self.pop() {
            None => Step::Exhausted,
            Some(Popped::Goal(moves)) => Step::Solved(moves),
            Some(Popped::Open(entry)) => self.finish(entry),
        }
    }

    /// Pop the next entry and run the goal test on it.
    fn pop(&mut self) -> Option<Popped> {
        let entry = self.frontier.pop()?;
        trace!("pop node {} at depth {}", entry.node, self.nodes[entry.node].depth);
        if entry.configuration.is_goal(self.config.goal) {
            return Some(Popped::Goal(self.path_to(entry.node)));
        }
        Some(Popped::Open(entry))
    }

    fn finish(&mut self, entry: FrontierEntry) -> Step {
        let children = self.expand(entry.node, &entry.configuration);
        if children == 0 {
            self.stats.dead_ends += 1;
        }
        Step::Expanded { children }
    }

    /// Push every legal, not yet seen child of `configuration`.
    fn expand(&mut self, parent: NodeId, configuration: &Configuration) -> usize {
        self.stats.expanded += 1;
        let depth = self.nodes[parent].depth + 1;
        let mut children = 0;

        for mv in legal_moves(configuration, self.config.prune_monochrome_into_empty) {
            let child = configuration.with_pour(mv);
            self.stats.generated += 1;
            if !self.visited.insert(child.fingerprint()) {
                self.stats.duplicates += 1;
                trace!("skip {} from node {}: already seen", mv, parent);
                continue;
            }

            let node = self.nodes.len();
            self.nodes.push(Node {
                parent: Some(parent),
                mv: Some(mv),
                depth,
            });
            self.frontier.push(FrontierEntry {
                node,
                configuration: child,
            });
            children += 1;
        }

        if children > 0 {
            self.stats.max_depth = self.stats.max_depth.max(depth);
        }
        self.stats.max_frontier = self.stats.max_frontier.max(self.frontier.len());
        children
    }

    /// Moves from the root to `node`, in application order
    fn path_to(&self, node: NodeId) -> Vec<Move> {
        let mut moves = Vec::with_capacity(self.nodes[node].depth);
        let mut current = Some(node);
        while let Some(id) = current {
            let n = &self.nodes[id];
            if let Some(mv) = n.mv {
                moves.push(mv);
            }
            current = n.parent;
        }
        moves.reverse();
        moves
    }

    fn check_limits(&self) -> Option<SearchError> {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Some(SearchError::Cancelled(self.stats()));
            }
        }
        if let Some(max) = self.config.max_expansions {
            if self.stats.expanded >= max {
                return Some(SearchError::ExpansionLimit(self.stats()));
            }
        }
        if let Some(timeout) = self.config.timeout {
            if self.started.elapsed() >= timeout {
                return Some(SearchError::Timeout(self.stats()));
            }
        }
        None
    }

    /// Step until a goal is found, the frontier runs dry, or a limit trips.
    ///
    /// Limits are checked only before an expansion, so a popped goal is
    /// always returned even when a limit has already been reached.
    pub fn run(&mut self) -> Result<Solution, SearchError> {
        loop {
            let entry = match self.pop() {
                None => return Err(SearchError::Exhausted(self.stats())),
                Some(Popped::Goal(moves)) => {
                    return Ok(Solution {
                        moves,
                        stats: self.stats(),
                    });
                }
                Some(Popped::Open(entry)) => entry,
            };
            if let Some(err) = self.check_limits() {
                debug!("search stopped early: {}", err);
                // Put it back so the session can be resumed with `step`.
                self.frontier.push(entry);
                return Err(err);
            }
            self.finish(entry);
            if self.stats.expanded % PROGRESS_INTERVAL == 0 {
                debug!(
                    "expanded {}, frontier {}, visited {}, max depth {}",
                    self.stats.expanded,
                    self.frontier.len(),
                    self.visited.len(),
                    self.stats.max_depth
                );
            }
        }
    }
}

/// Validate `input` and search for a sorting move sequence.
pub fn solve(input: &[Vec<DropLabel>], config: &SolverConfig) -> Result<Solution, SolveError> {
    let (start, palette) = Configuration::from_input(input)?;
    info!(
        "searching {} tubes of capacity {} with {} liquids ({:?} goal)",
        start.tube_count(),
        start.capacity(),
        palette.len(),
        config.goal
    );

    let result = SearchSession::new(start, config.clone()).run();
    match &result {
        Ok(solution) => info!(
            "solved in {} moves: {}",
            solution.moves.len(),
            solution.stats
        ),
        Err(err) => info!("no solution: {}", err),
    }
    result.map_err(SolveError::from)
}

/// Find a move sequence that sorts `input`, using the default configuration.
pub fn find_moves(input: &[Vec<DropLabel>]) -> Result<Vec<Move>, SolveError> {
    solve(input, &SolverConfig::default()).map(|solution| solution.moves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::replay_states;

    fn session(tubes: &[&[u16]], capacity: usize) -> SearchSession {
        SearchSession::new(
            Configuration::from_colors(tubes, capacity),
            SolverConfig::default(),
        )
    }

    #[test]
    fn test_sorted_root_solves_without_moves() {
        let mut s = session(&[&[0, 0], &[]], 2);
        assert_eq!(s.step(), Step::Solved(vec![]));
    }

    #[test]
    fn test_first_step_expands_root() {
        let mut s = session(&[&[0, 1], &[1, 0], &[]], 2);
        // 0->2 and 1->2 are the only legal pours.
        assert_eq!(s.step(), Step::Expanded { children: 2 });
        assert_eq!(s.frontier_len(), 2);
        assert_eq!(s.visited_len(), 3);
    }

    #[test]
    fn test_stuck_puzzle_is_exhausted() {
        let mut s = session(&[&[0, 1], &[1, 0]], 2);
        assert_eq!(s.step(), Step::Expanded { children: 0 });
        assert_eq!(s.step(), Step::Exhausted);
        assert_eq!(s.stats().dead_ends, 1);

        let err = session(&[&[0, 1], &[1, 0]], 2).run().unwrap_err();
        assert!(matches!(err, SearchError::Exhausted(_)));
    }

    #[test]
    fn test_solution_replays_to_goal() {
        let start = Configuration::from_colors(&[&[0, 1, 2], &[2, 0, 1], &[1, 2, 0], &[], &[]], 3);
        let solution = SearchSession::new(start.clone(), SolverConfig::default())
            .run()
            .unwrap();

        let states = replay_states(&start, &solution.moves).unwrap();
        assert!(states.last().unwrap().is_goal(GoalRule::Monochrome));
        assert!(solution.stats.expanded >= 1);
    }

    #[test]
    fn test_full_or_empty_goal_is_respected() {
        let start = Configuration::from_colors(&[&[0, 1], &[1, 0], &[]], 2);
        let config = SolverConfig {
            goal: GoalRule::FullOrEmpty,
            ..Default::default()
        };
        let solution = SearchSession::new(start.clone(), config).run().unwrap();

        let states = replay_states(&start, &solution.moves).unwrap();
        assert!(states.last().unwrap().is_goal(GoalRule::FullOrEmpty));
    }

    #[test]
    fn test_no_configuration_is_accepted_twice() {
        let mut s = session(&[&[0, 1, 2], &[2, 0, 1], &[1, 2, 0], &[], &[]], 3);
        s.config.goal = GoalRule::FullOrEmpty;
        s.config.prune_monochrome_into_empty = false;
        while let Step::Expanded { .. } = s.step() {}

        // One node per distinct fingerprint, root included.
        assert_eq!(s.nodes.len(), s.visited.len());
        assert_eq!(
            s.stats.generated,
            s.stats.duplicates + s.nodes.len() - 1
        );
    }

    #[test]
    fn test_path_follows_parent_links() {
        let mut s = session(&[&[0, 1], &[1, 0], &[]], 2);
        s.nodes.push(Node {
            parent: Some(0),
            mv: Some(Move::new(0, 2)),
            depth: 1,
        });
        s.nodes.push(Node {
            parent: Some(1),
            mv: Some(Move::new(1, 0)),
            depth: 2,
        });
        assert_eq!(s.path_to(2), vec![Move::new(0, 2), Move::new(1, 0)]);
        assert!(s.path_to(0).is_empty());
    }

    #[test]
    fn test_expansion_limit() {
        let mut s = SearchSession::new(
            Configuration::from_colors(&[&[0, 1], &[1, 0], &[]], 2),
            SolverConfig {
                max_expansions: Some(0),
                ..Default::default()
            },
        );
        assert!(matches!(s.run(), Err(SearchError::ExpansionLimit(_))));
    }

    #[test]
    fn test_timeout() {
        let mut s = SearchSession::new(
            Configuration::from_colors(&[&[0, 1], &[1, 0], &[]], 2),
            SolverConfig {
                timeout: Some(Duration::ZERO),
                ..Default::default()
            },
        );
        assert!(matches!(s.run(), Err(SearchError::Timeout(_))));
    }

    #[test]
    fn test_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut s = session(&[&[0, 1], &[1, 0], &[]], 2).with_cancel_flag(flag);
        assert!(matches!(s.run(), Err(SearchError::Cancelled(_))));
    }

    #[test]
    fn test_sorted_root_wins_over_reached_limits() {
        let configs = [
            SolverConfig {
                max_expansions: Some(0),
                ..Default::default()
            },
            SolverConfig {
                timeout: Some(Duration::ZERO),
                ..Default::default()
            },
        ];
        for config in configs {
            let mut s = SearchSession::new(Configuration::from_colors(&[&[0, 0], &[]], 2), config);
            assert!(s.run().unwrap().moves.is_empty());
        }

        let flag = Arc::new(AtomicBool::new(true));
        let mut s = session(&[&[0, 0], &[]], 2).with_cancel_flag(flag);
        assert!(s.run().unwrap().moves.is_empty());
    }

    #[test]
    fn test_limit_leaves_session_resumable() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut s = session(&[&[0, 1], &[1, 0], &[]], 2).with_cancel_flag(flag.clone());
        assert!(matches!(s.run(), Err(SearchError::Cancelled(_))));
        assert_eq!(s.frontier_len(), 1);
        assert_eq!(s.stats().expanded, 0);

        flag.store(false, Ordering::Relaxed);
        assert!(s.run().is_ok());
    }
}
