use core::fmt;
use grid_util::point::Point;
use std::hash::{Hash, Hasher};

/// The state tag carried by every cell. A cell holds exactly one state at a time; how a state is
/// drawn is left to the embedding application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellState {
    #[default]
    Default,
    Open,
    Closed,
    Barrier,
    Start,
    End,
    Path,
}

impl CellState {
    pub fn is_default(self) -> bool {
        self == CellState::Default
    }
    pub fn is_open(self) -> bool {
        self == CellState::Open
    }
    pub fn is_closed(self) -> bool {
        self == CellState::Closed
    }
    pub fn is_barrier(self) -> bool {
        self == CellState::Barrier
    }
    pub fn is_start(self) -> bool {
        self == CellState::Start
    }
    pub fn is_end(self) -> bool {
        self == CellState::End
    }
    pub fn is_path(self) -> bool {
        self == CellState::Path
    }
    /// Whether the cell is one of the two search endpoints.
    pub fn is_endpoint(self) -> bool {
        self.is_start() || self.is_end()
    }
    /// Open, Closed and Path are written by a search run and wiped by
    /// [clear_search_marks](crate::PathingGrid::clear_search_marks).
    pub fn is_search_mark(self) -> bool {
        matches!(self, CellState::Open | CellState::Closed | CellState::Path)
    }

    /// Character used for the text layout of a grid.
    pub fn symbol(self) -> char {
        match self {
            CellState::Default => '.',
            CellState::Open => 'o',
            CellState::Closed => 'x',
            CellState::Barrier => '#',
            CellState::Start => 'S',
            CellState::End => 'E',
            CellState::Path => '*',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<CellState> {
        let state = match symbol {
            '.' => CellState::Default,
            'o' => CellState::Open,
            'x' => CellState::Closed,
            '#' => CellState::Barrier,
            'S' => CellState::Start,
            'E' => CellState::End,
            '*' => CellState::Path,
            _ => return None,
        };
        Some(state)
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// The [Point] naming the cell at `row`, `col`. Both must fit in an `i32`, which every position
/// of a grid built by [PathingGrid::build](crate::PathingGrid::build) does.
pub fn position(row: usize, col: usize) -> Point {
    Point::new(col as i32, row as i32)
}

/// A snapshot of a single grid unit. Two cells are the same cell when they share a position,
/// whatever their states.
///
/// Positions are stored as a [Point] with `x` the column and `y` the row.
#[derive(Clone, Copy, Debug)]
pub struct Cell {
    position: Point,
    state: CellState,
}

impl Cell {
    pub(crate) fn new(position: Point, state: CellState) -> Cell {
        Cell { position, state }
    }
    pub fn row(&self) -> usize {
        self.position.y as usize
    }
    pub fn col(&self) -> usize {
        self.position.x as usize
    }
    pub fn position(&self) -> Point {
        self.position
    }
    pub fn state(&self) -> CellState {
        self.state
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.position.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxhash::FxHashSet;

    #[test]
    fn symbols_round_trip() {
        for state in [
            CellState::Default,
            CellState::Open,
            CellState::Closed,
            CellState::Barrier,
            CellState::Start,
            CellState::End,
            CellState::Path,
        ] {
            assert_eq!(CellState::from_symbol(state.symbol()), Some(state));
        }
        assert_eq!(CellState::from_symbol('?'), None);
    }

    /// Equality ignores the state tag so a cell keeps its identity while it is recoloured.
    #[test]
    fn identity_is_position() {
        let a = Cell::new(Point::new(2, 1), CellState::Open);
        let b = Cell::new(Point::new(2, 1), CellState::Closed);
        let c = Cell::new(Point::new(1, 2), CellState::Open);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!((a.row(), a.col()), (1, 2));
        let set: FxHashSet<Cell> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
