//! # grid_astar
//!
//! Shortest paths on a square, 4-connected, uniform-cost grid using
//! [A*](https://en.wikipedia.org/wiki/A*_search_algorithm) with the
//! [Manhattan distance](https://en.wikipedia.org/wiki/Taxicab_geometry) as heuristic.
//!
//! The search is observable: every expansion and every step of path reconstruction is reported
//! to an `on_step` callback together with the grid, whose cells carry their search state
//! ([CellState::Open], [CellState::Closed], [CellState::Path]). This lets an embedding
//! application animate the search without the engine knowing anything about drawing.
//!
//! Frontier ties are broken by insertion order, so a search over the same layout always expands
//! the same cells in the same order and returns the same path.
//!
//! ```
//! use grid_astar::{position, run_search, PathingGrid};
//!
//! // S start, E end, # barrier, . free
//! let mut grid: PathingGrid = "S..\n##.\nE..".parse().unwrap();
//! let outcome = run_search(&mut grid, position(0, 0), position(2, 0), |_, _| {})
//!     .unwrap();
//! assert_eq!(outcome.path_length(), Some(6));
//! ```
pub mod cell;
pub mod pathing_grid;
pub mod solver;

pub use cell::{position, Cell, CellState};
pub use grid_util::point::Point;
pub use pathing_grid::{GridError, PathingGrid};
pub use solver::{
    heuristic, run_search, AstarSolver, Cancellation, SearchError, SearchOutcome, Step,
};

/// Cost of a move between two orthogonally adjacent cells.
pub const C: i32 = 1;

/// A cell has at most 4 neighbours.
pub const N_SMALLVEC_SIZE: usize = 4;
