use crate::cell::{position, Cell, CellState};
use crate::N_SMALLVEC_SIZE;
use core::fmt;
use grid_util::grid::{SimpleValueGrid, ValueGrid};
use grid_util::point::Point;
use itertools::iproduct;
use log::info;
use petgraph::unionfind::UnionFind;
use smallvec::SmallVec;
use std::str::FromStr;
use thiserror::Error;

/// (row, col) offsets in the order neighbours are reported: down, up, right, left.
const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

fn offset(point: Point, (d_row, d_col): (i32, i32)) -> Point {
    Point::new(point.x + d_col, point.y + d_row)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("position {0} lies outside the grid")]
    OutOfBounds(Point),
    #[error("grid layout is not square: row {row} has {found} cells, expected {expected}")]
    NotSquare {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("unknown cell symbol {symbol:?} at row {row}, column {col}")]
    UnknownSymbol { symbol: char, row: usize, col: usize },
    #[error("grid layout contains more than one {0:?} cell")]
    DuplicateEndpoint(CellState),
}

/// [PathingGrid] is a fixed-size square grid of [CellState] values. It tracks which cells hold
/// the start and end, caches each cell's passable neighbours as a 4-bit mask for the search, and
/// maintains connected components in a [UnionFind] structure so reachability can be queried
/// without searching.
///
/// Positions are [Point]s with `x` the column and `y` the row; see [position].
#[derive(Clone, Debug)]
pub struct PathingGrid {
    size: usize,
    cells: SimpleValueGrid<CellState>,
    neighbours: SimpleValueGrid<u8>,
    neighbours_dirty: bool,
    pub components: UnionFind<usize>,
    pub components_dirty: bool,
    start: Option<Point>,
    end: Option<Point>,
}

impl Default for PathingGrid {
    fn default() -> PathingGrid {
        PathingGrid::build(0)
    }
}

impl PathingGrid {
    /// Allocates a `size` x `size` grid with every cell in the Default state. Positions are
    /// [Point]s, so `size` must not exceed `i32::MAX`.
    pub fn build(size: usize) -> PathingGrid {
        info!("Building {}x{} grid", size, size);
        PathingGrid {
            size,
            cells: SimpleValueGrid::new(size, size, CellState::Default),
            neighbours: SimpleValueGrid::new(size, size, 0),
            neighbours_dirty: true,
            components: UnionFind::new(size * size),
            components_dirty: true,
            start: None,
            end: None,
        }
    }
    pub fn size(&self) -> usize {
        self.size
    }
    pub fn start(&self) -> Option<Point> {
        self.start
    }
    pub fn end(&self) -> Option<Point> {
        self.end
    }
    pub fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0
            && point.y >= 0
            && (point.x as usize) < self.size
            && (point.y as usize) < self.size
    }
    pub(crate) fn check_bounds(&self, point: Point) -> Result<(), GridError> {
        if self.in_bounds(point) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds(point))
        }
    }
    fn get_ix(&self, point: Point) -> usize {
        point.y as usize * self.size + point.x as usize
    }
    fn get(&self, point: Point) -> CellState {
        self.cells.get(point.x, point.y)
    }

    pub fn state(&self, point: Point) -> Option<CellState> {
        self.in_bounds(point).then(|| self.get(point))
    }
    pub fn cell(&self, point: Point) -> Option<Cell> {
        self.state(point).map(|state| Cell::new(point, state))
    }
    pub fn cell_at(&self, row: usize, col: usize) -> Option<Cell> {
        // Checked before the conversion to a Point truncates them
        if row < self.size && col < self.size {
            self.cell(position(row, col))
        } else {
            None
        }
    }
    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        iproduct!(0..self.size, 0..self.size).map(move |(row, col)| {
            let point = position(row, col);
            Cell::new(point, self.get(point))
        })
    }
    /// Number of cells currently in `state`.
    pub fn count(&self, state: CellState) -> usize {
        self.cells().filter(|cell| cell.state() == state).count()
    }

    /// Sets the state of a cell while keeping the endpoint invariants: placing a Start or End
    /// moves it from wherever it was before, and overwriting an endpoint unassigns it.
    pub fn set_state(&mut self, point: Point, state: CellState) -> Result<(), GridError> {
        self.check_bounds(point)?;
        let previous = self.get(point);
        if previous == state {
            return Ok(());
        }
        if previous.is_start() {
            self.start = None;
        }
        if previous.is_end() {
            self.end = None;
        }
        let displaced = match state {
            CellState::Start => self.start.replace(point),
            CellState::End => self.end.replace(point),
            _ => None,
        };
        if let Some(old) = displaced {
            self.write(old, CellState::Default);
        }
        self.write(point, state);
        Ok(())
    }

    /// Updates a cell. Joins newly connected components and flags the components as dirty if
    /// components are (potentially) broken apart into multiple.
    fn write(&mut self, point: Point, state: CellState) {
        let previous = self.get(point);
        if previous.is_barrier() != state.is_barrier() {
            self.neighbours_dirty = true;
            if state.is_barrier() {
                self.components_dirty = true;
            } else {
                let p_ix = self.get_ix(point);
                for n in self.neighbors(point) {
                    let n_ix = self.get_ix(n);
                    self.components.union(p_ix, n_ix);
                }
            }
        }
        self.cells.set(point.x, point.y, state);
    }

    /// Recolours a cell on behalf of a running search. The endpoints keep their tags so they
    /// never need restoring afterwards.
    pub(crate) fn mark(&mut self, point: Point, state: CellState) {
        if !self.get(point).is_endpoint() {
            self.cells.set(point.x, point.y, state);
        }
    }

    /// Places an endpoint or barrier the way a click on the grid does: the start if none is
    /// assigned, then the end, then barriers. Endpoints are never overwritten. Returns the
    /// resulting state of the cell.
    pub fn paint(&mut self, point: Point) -> Result<CellState, GridError> {
        self.check_bounds(point)?;
        let current = self.get(point);
        let state = if self.start.is_none() && !current.is_end() {
            CellState::Start
        } else if self.end.is_none() && !current.is_start() {
            CellState::End
        } else if !current.is_endpoint() {
            CellState::Barrier
        } else {
            return Ok(current);
        };
        self.set_state(point, state)?;
        Ok(state)
    }

    /// Returns a cell to Default, unassigning the start or end if it held one.
    pub fn reset_cell(&mut self, point: Point) -> Result<(), GridError> {
        self.set_state(point, CellState::Default)
    }

    /// Returns every cell to Default and unassigns both endpoints.
    pub fn clear(&mut self) {
        info!("Clearing {}x{} grid", self.size, self.size);
        *self = PathingGrid::build(self.size);
    }

    /// Wipes the Open, Closed and Path marks left by a previous search.
    pub fn clear_search_marks(&mut self) {
        for (y, x) in iproduct!(0..self.size as i32, 0..self.size as i32) {
            if self.cells.get(x, y).is_search_mark() {
                self.cells.set(x, y, CellState::Default);
            }
        }
    }

    pub fn can_move_to(&self, point: Point) -> bool {
        self.in_bounds(point) && !self.get(point).is_barrier()
    }

    /// The in-bounds, non-barrier cells adjacent to `point` in the order down, up, right, left,
    /// computed from the current cell states.
    pub fn neighbors(&self, point: Point) -> SmallVec<[Point; N_SMALLVEC_SIZE]> {
        DIRECTIONS
            .iter()
            .map(|&dir| offset(point, dir))
            .filter(|&n| self.can_move_to(n))
            .collect()
    }

    /// Recomputes the cached neighbour mask of every cell. Must run after barrier edits and
    /// before a search; [AstarSolver](crate::AstarSolver) does so at the start of every run.
    pub fn refresh_all_neighbors(&mut self) {
        for (y, x) in iproduct!(0..self.size as i32, 0..self.size as i32) {
            let point = Point::new(x, y);
            let mask = DIRECTIONS
                .iter()
                .enumerate()
                .filter(|(_, &dir)| self.can_move_to(offset(point, dir)))
                .fold(0_u8, |mask, (i, _)| mask | 1 << i);
            self.neighbours.set(x, y, mask);
        }
        self.neighbours_dirty = false;
    }

    /// True when barriers changed since the last [refresh_all_neighbors](Self::refresh_all_neighbors).
    pub fn neighbours_dirty(&self) -> bool {
        self.neighbours_dirty
    }

    /// Neighbours as recorded by the last [refresh_all_neighbors](Self::refresh_all_neighbors),
    /// in the same order as [neighbors](Self::neighbors).
    pub fn cached_neighbors(&self, point: Point) -> SmallVec<[Point; N_SMALLVEC_SIZE]> {
        let mask = self.neighbours.get(point.x, point.y);
        DIRECTIONS
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << *i) != 0)
            .map(|(_, &dir)| offset(point, dir))
            .collect()
    }

    /// Retrieves the component id a given [Point] belongs to.
    pub fn get_component(&self, point: &Point) -> usize {
        self.components.find(self.get_ix(*point))
    }
    /// Checks if start and goal are passable and on the same component.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        !self.unreachable(start, goal)
    }
    /// Checks if start and goal are not on the same component.
    pub fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        if self.can_move_to(*start) && self.can_move_to(*goal) {
            !self
                .components
                .equiv(self.get_ix(*start), self.get_ix(*goal))
        } else {
            true
        }
    }
    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            info!("Components are dirty: regenerating components");
            self.generate_components();
        }
    }
    /// Generates a new [UnionFind] structure and links up grid neighbours to the same components.
    pub fn generate_components(&mut self) {
        info!("Generating connected components");
        let n = self.size;
        self.components = UnionFind::new(n * n);
        self.components_dirty = false;
        for (y, x) in iproduct!(0..n as i32, 0..n as i32) {
            let point = Point::new(x, y);
            if !self.can_move_to(point) {
                continue;
            }
            let parent_ix = self.get_ix(point);
            // Linking down and right covers every edge once.
            let linked = [Point::new(x, y + 1), Point::new(x + 1, y)]
                .into_iter()
                .filter(|p| self.can_move_to(*p))
                .map(|p| self.get_ix(p))
                .collect::<SmallVec<[usize; 2]>>();
            for ix in linked {
                self.components.union(parent_ix, ix);
            }
        }
    }
}

impl fmt::Display for PathingGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in 0..self.size as i32 {
            let row = (0..self.size as i32)
                .map(|x| self.cells.get(x, y).symbol())
                .collect::<String>();
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

/// Parses the layout printed by [Display](fmt::Display): one line per row, one symbol per cell
/// (see [CellState::symbol]). Blank lines and surrounding whitespace are ignored.
impl FromStr for PathingGrid {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().collect::<Vec<char>>())
            .collect::<Vec<_>>();
        let size = rows.len();
        let mut grid = PathingGrid::build(size);
        for (row, symbols) in rows.iter().enumerate() {
            if symbols.len() != size {
                return Err(GridError::NotSquare {
                    row,
                    found: symbols.len(),
                    expected: size,
                });
            }
            for (col, &symbol) in symbols.iter().enumerate() {
                let state = CellState::from_symbol(symbol)
                    .ok_or(GridError::UnknownSymbol { symbol, row, col })?;
                if (state.is_start() && grid.start.is_some())
                    || (state.is_end() && grid.end.is_some())
                {
                    return Err(GridError::DuplicateEndpoint(state));
                }
                grid.set_state(position(row, col), state)?;
            }
        }
        Ok(grid)
    }
}
