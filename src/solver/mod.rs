use crate::pathing_grid::{GridError, PathingGrid};
use crate::C;
use fxhash::FxBuildHasher;
use grid_util::point::Point;
use indexmap::IndexMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

mod astar;
mod reconstruct;

pub use astar::AstarSolver;

pub(crate) type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// The Manhattan distance between two cells times the unit move cost. Admissible and consistent
/// on a 4-connected grid, which is what makes the first path found a shortest one.
pub fn heuristic(p1: &Point, p2: &Point) -> i32 {
    p1.manhattan_distance(p2) * C
}

/// What the search reports to its `on_step` callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// A cell was taken from the open set and its neighbours were relaxed.
    Expanded(Point),
    /// A cell was added to the reconstructed path, walking back from the end.
    Path(Point),
}

/// How a search run ended. Each variant counts the cells taken from the open set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A shortest path: `path[0]` is the start and the last element is the end, so it holds
    /// one more point than it has moves.
    Found { path: Vec<Point>, expanded: usize },
    /// The open set ran dry: no route exists under the current barriers.
    NoPath { expanded: usize },
    /// The [Cancellation] handle was triggered during the run.
    Cancelled { expanded: usize },
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found { .. })
    }
    pub fn path(&self) -> Option<&[Point]> {
        match self {
            SearchOutcome::Found { path, .. } => Some(path),
            _ => None,
        }
    }
    /// Number of moves on the path.
    pub fn path_length(&self) -> Option<usize> {
        self.path().map(|path| path.len() - 1)
    }
    pub fn expanded(&self) -> usize {
        match *self {
            SearchOutcome::Found { expanded, .. }
            | SearchOutcome::NoPath { expanded }
            | SearchOutcome::Cancelled { expanded } => expanded,
        }
    }
}

/// A search was requested on a grid that does not satisfy its preconditions. No cell is
/// touched when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("no start cell is assigned")]
    MissingStart,
    #[error("no end cell is assigned")]
    MissingEnd,
    #[error("start and end are the same cell {0}")]
    StartIsEnd(Point),
    #[error("endpoint {0} is a barrier")]
    Blocked(Point),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Cooperative cancellation shared between a solver and whoever wants to stop it. The flag is
/// checked once per expansion and stays set until [reset](Self::reset) is called, so a
/// request made before a run starts is not lost.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Cancellation {
        Cancellation::default()
    }
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Assigns `start` and `end` on the grid and searches for a shortest path between them with a
/// fresh [AstarSolver]. `on_step` is called after every expansion and every path step.
pub fn run_search<F>(
    grid: &mut PathingGrid,
    start: Point,
    end: Point,
    on_step: F,
) -> Result<SearchOutcome, SearchError>
where
    F: FnMut(&PathingGrid, Step),
{
    AstarSolver::new().run_search(grid, start, end, on_step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_heuristic() {
        let a = Point::new(0, 0);
        assert_eq!(heuristic(&a, &Point::new(4, 4)), 8);
        assert_eq!(heuristic(&Point::new(3, 1), &Point::new(1, 2)), 3);
        assert_eq!(heuristic(&a, &a), 0);
    }

    #[test]
    fn cancellation_is_shared() {
        let cancellation = Cancellation::new();
        let handle = cancellation.clone();
        assert!(!cancellation.is_cancelled());
        handle.cancel();
        assert!(cancellation.is_cancelled());
        cancellation.reset();
        assert!(!handle.is_cancelled());
    }

    #[test]
    fn outcome_accessors() {
        let found = SearchOutcome::Found {
            path: vec![Point::new(0, 0), Point::new(0, 1)],
            expanded: 2,
        };
        assert!(found.is_found());
        assert_eq!(found.path_length(), Some(1));
        assert_eq!(found.expanded(), 2);
        let none = SearchOutcome::NoPath { expanded: 5 };
        assert_eq!(none.path(), None);
        assert_eq!(none.expanded(), 5);
    }
}
