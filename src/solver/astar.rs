use super::reconstruct::reconstruct_path;
use super::{heuristic, Cancellation, FxIndexMap, SearchError, SearchOutcome, Step};
use crate::cell::CellState;
use crate::pathing_grid::PathingGrid;
use crate::C;
use fxhash::{FxHashMap, FxHashSet};
use grid_util::point::Point;
use log::{debug, info, trace, warn};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Open set entry. Ordered by estimated total cost, then by insertion sequence so that equal
/// estimates are expanded first in, first out.
#[derive(Debug)]
struct OpenEntry {
    f_score: i32,
    sequence: usize,
    position: Point,
}

impl Eq for OpenEntry {}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f_score == other.f_score && self.sequence == other.sequence
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap pops the greatest entry
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Working state of a single run.
#[derive(Default)]
struct SearchState {
    came_from: FxIndexMap<Point, Point>,
    g_score: FxHashMap<Point, i32>,
    f_score: FxHashMap<Point, i32>,
    open_set: BinaryHeap<OpenEntry>,
    open_members: FxHashSet<Point>,
    sequence: usize,
}

impl SearchState {
    /// Unseen cells have an infinite cost.
    fn g_score(&self, point: &Point) -> i32 {
        self.g_score.get(point).copied().unwrap_or(i32::MAX)
    }
    fn push(&mut self, point: Point) {
        let f_score = self.f_score.get(&point).copied().unwrap_or(i32::MAX);
        self.open_set.push(OpenEntry {
            f_score,
            sequence: self.sequence,
            position: point,
        });
        self.sequence += 1;
        self.open_members.insert(point);
    }
    fn pop(&mut self) -> Option<Point> {
        let OpenEntry { position, .. } = self.open_set.pop()?;
        self.open_members.remove(&position);
        Some(position)
    }
}

/// A* over a [PathingGrid] with unit move costs and the Manhattan [heuristic].
///
/// The solver owns a [Cancellation] handle; clones of it obtained through
/// [cancellation](Self::cancellation) can stop a run from the `on_step` callback or from
/// another thread.
#[derive(Clone, Debug, Default)]
pub struct AstarSolver {
    cancellation: Cancellation,
}

impl AstarSolver {
    pub fn new() -> AstarSolver {
        AstarSolver::default()
    }
    pub fn with_cancellation(cancellation: Cancellation) -> AstarSolver {
        AstarSolver { cancellation }
    }
    pub fn cancellation(&self) -> Cancellation {
        self.cancellation.clone()
    }
    /// Stops the run in flight at its next expansion, or the next run before its first one.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Assigns `start` and `end` as the grid's endpoints, then runs [search](Self::search).
    /// Fails without touching the grid if either point is out of bounds or a barrier, or if
    /// both are the same cell.
    pub fn run_search<F>(
        &self,
        grid: &mut PathingGrid,
        start: Point,
        end: Point,
        on_step: F,
    ) -> Result<SearchOutcome, SearchError>
    where
        F: FnMut(&PathingGrid, Step),
    {
        for point in [start, end] {
            grid.check_bounds(point)?;
            if grid.state(point) == Some(CellState::Barrier) {
                debug!("Refusing to search from or to barrier {}", point);
                return Err(SearchError::Blocked(point));
            }
        }
        if start == end {
            debug!("Refusing to search from {} to itself", start);
            return Err(SearchError::StartIsEnd(start));
        }
        grid.set_state(start, CellState::Start)?;
        grid.set_state(end, CellState::End)?;
        self.search(grid, on_step)
    }

    /// Searches from the grid's start to its end. Neighbour caches are refreshed and the marks
    /// of any earlier run wiped first, then cells are marked Open when they enter the open set and Closed once expanded, and the
    /// path found is marked Path. The endpoints keep their own states throughout.
    ///
    /// `on_step` is called once per expansion, after the neighbours are relaxed, and once per
    /// step of path reconstruction. The marks stay on the grid until the next run, whatever the
    /// outcome.
    ///
    /// The [Cancellation] flag is not cleared here: a cancellation requested before the run
    /// reaches its first expansion ends it with zero expansions. Call
    /// [Cancellation::reset] before reusing a cancelled solver.
    pub fn search<F>(
        &self,
        grid: &mut PathingGrid,
        mut on_step: F,
    ) -> Result<SearchOutcome, SearchError>
    where
        F: FnMut(&PathingGrid, Step),
    {
        let start = grid.start().ok_or(SearchError::MissingStart)?;
        let end = grid.end().ok_or(SearchError::MissingEnd)?;
        grid.refresh_all_neighbors();
        grid.clear_search_marks();
        info!("Searching for a path from {} to {}", start, end);

        let mut state = SearchState::default();
        state.g_score.insert(start, 0);
        state.f_score.insert(start, heuristic(&start, &end));
        state.push(start);

        let mut expanded = 0;
        loop {
            if self.cancellation.is_cancelled() {
                debug!("Search cancelled after {} expansions", expanded);
                return Ok(SearchOutcome::Cancelled { expanded });
            }
            let Some(current) = state.pop() else {
                break;
            };
            expanded += 1;

            if current == end {
                let path = reconstruct_path(grid, &state.came_from, end, &mut on_step);
                info!(
                    "Found a path of length {} after {} expansions",
                    path.len() - 1,
                    expanded
                );
                return Ok(SearchOutcome::Found { path, expanded });
            }

            let tentative_g = state.g_score(&current) + C;
            for neighbour in grid.cached_neighbors(current) {
                if tentative_g < state.g_score(&neighbour) {
                    state.came_from.insert(neighbour, current);
                    state.g_score.insert(neighbour, tentative_g);
                    state
                        .f_score
                        .insert(neighbour, tentative_g + heuristic(&neighbour, &end));
                    if !state.open_members.contains(&neighbour) {
                        state.push(neighbour);
                        grid.mark(neighbour, CellState::Open);
                    }
                }
            }
            trace!("Expanded {}", current);
            on_step(&*grid, Step::Expanded(current));

            if current != start {
                grid.mark(current, CellState::Closed);
            }
        }

        info!(
            "No path from {} to {} after {} expansions",
            start, end, expanded
        );
        if !grid.components_dirty && grid.reachable(&start, &end) {
            warn!("Reachable goal could not be pathed to, is reachable graph correct?");
        }
        Ok(SearchOutcome::NoPath { expanded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::position;

    fn ordered(entries: Vec<(i32, usize)>) -> Vec<(i32, usize)> {
        let mut heap = entries
            .into_iter()
            .map(|(f_score, sequence)| OpenEntry {
                f_score,
                sequence,
                position: Point::new(0, 0),
            })
            .collect::<BinaryHeap<_>>();
        std::iter::from_fn(|| heap.pop())
            .map(|e| (e.f_score, e.sequence))
            .collect()
    }

    /// Lowest estimate first, equal estimates in insertion order.
    #[test]
    fn open_set_order() {
        assert_eq!(
            ordered(vec![(6, 3), (4, 2), (6, 1), (4, 5), (8, 0)]),
            vec![(4, 2), (4, 5), (6, 1), (6, 3), (8, 0)]
        );
    }

    /// Asserts that the optimal 4 step solution is found.
    #[test]
    fn solve_simple_problem() {
        // |S  |
        // | # |
        // |  E|
        let mut grid: PathingGrid = "S..\n.#.\n..E".parse().unwrap();
        let outcome = AstarSolver::new().search(&mut grid, |_, _| {}).unwrap();
        assert_eq!(outcome.path_length(), Some(4));
    }

    #[test]
    fn missing_endpoints() {
        let solver = AstarSolver::new();
        let mut grid: PathingGrid = "...\n...\n..E".parse().unwrap();
        assert_eq!(
            solver.search(&mut grid, |_, _| {}),
            Err(SearchError::MissingStart)
        );
        let mut grid: PathingGrid = "S..\n...\n...".parse().unwrap();
        assert_eq!(
            solver.search(&mut grid, |_, _| {}),
            Err(SearchError::MissingEnd)
        );
    }

    #[test]
    fn precondition_errors_leave_grid_untouched() {
        let solver = AstarSolver::new();
        let mut grid: PathingGrid = "...\n.#.\n...".parse().unwrap();
        let before = grid.to_string();
        assert_eq!(
            solver.run_search(&mut grid, position(1, 1), position(2, 2), |_, _| {}),
            Err(SearchError::Blocked(position(1, 1)))
        );
        assert_eq!(
            solver.run_search(&mut grid, position(0, 0), position(0, 0), |_, _| {}),
            Err(SearchError::StartIsEnd(position(0, 0)))
        );
        assert!(matches!(
            solver.run_search(&mut grid, position(0, 0), position(3, 0), |_, _| {}),
            Err(SearchError::Grid(_))
        ));
        assert_eq!(grid.to_string(), before);
        assert_eq!(grid.start(), None);
    }

    /// Barriers placed after the last manual refresh are still honoured.
    #[test]
    fn neighbours_refreshed_before_search() {
        let mut grid: PathingGrid = "S.E\n...\n...".parse().unwrap();
        grid.refresh_all_neighbors();
        grid.set_state(position(0, 1), CellState::Barrier).unwrap();
        let outcome = AstarSolver::new().search(&mut grid, |_, _| {}).unwrap();
        assert_eq!(outcome.path_length(), Some(4));
        assert!(!grid.neighbours_dirty());
    }

    /// A request made before the run starts is honoured, not wiped by the run.
    #[test]
    fn cancelled_before_run() {
        let solver = AstarSolver::new();
        let handle = solver.cancellation();
        handle.cancel();
        let mut grid = PathingGrid::build(6);
        let outcome = solver
            .run_search(&mut grid, position(0, 0), position(5, 5), |_, _| {})
            .unwrap();
        assert_eq!(outcome, SearchOutcome::Cancelled { expanded: 0 });
        assert_eq!(grid.count(CellState::Open), 0);
        assert!(handle.is_cancelled());

        handle.reset();
        let outcome = solver.search(&mut grid, |_, _| {}).unwrap();
        assert_eq!(outcome.path_length(), Some(10));
    }

    /// Marks of an earlier run do not survive into the next one.
    #[test]
    fn rerun_wipes_previous_marks() {
        let solver = AstarSolver::new();
        let mut grid = PathingGrid::build(5);
        let outcome = solver
            .run_search(&mut grid, position(0, 0), position(4, 4), |_, _| {})
            .unwrap();
        assert_eq!(outcome.path_length(), Some(8));
        assert_eq!(grid.count(CellState::Path), 7);

        grid.set_state(position(0, 1), CellState::Barrier).unwrap();
        grid.set_state(position(1, 0), CellState::Barrier).unwrap();
        let outcome = solver
            .run_search(&mut grid, position(0, 0), position(4, 4), |_, _| {})
            .unwrap();
        assert_eq!(outcome, SearchOutcome::NoPath { expanded: 1 });
        assert_eq!(grid.count(CellState::Path), 0);
        assert_eq!(grid.count(CellState::Closed), 0);
        assert_eq!(grid.count(CellState::Open), 0);
        assert_eq!(
            grid.to_string(),
            "S#...\n#....\n.....\n.....\n....E\n"
        );
    }

    #[test]
    fn start_is_never_closed() {
        let mut grid: PathingGrid = "S.#\n.##\n##E".parse().unwrap();
        let outcome = AstarSolver::new().search(&mut grid, |_, _| {}).unwrap();
        assert_eq!(outcome, SearchOutcome::NoPath { expanded: 3 });
        assert_eq!(grid.to_string(), "Sx#\nx##\n##E\n");
    }
}
