use super::{FxIndexMap, Step};
use crate::cell::CellState;
use crate::pathing_grid::PathingGrid;
use grid_util::point::Point;

/// Walks the predecessor map back from `end` until a cell without predecessor, the start, is
/// reached. Every predecessor is marked Path and reported to `on_step` as it is visited. Returns
/// the path ordered from start to end.
pub(crate) fn reconstruct_path<F>(
    grid: &mut PathingGrid,
    came_from: &FxIndexMap<Point, Point>,
    end: Point,
    on_step: &mut F,
) -> Vec<Point>
where
    F: FnMut(&PathingGrid, Step),
{
    let mut path = vec![end];
    let mut current = end;
    while let Some(&previous) = came_from.get(&current) {
        current = previous;
        grid.mark(current, CellState::Path);
        path.push(current);
        on_step(&*grid, Step::Path(current));
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::position;

    #[test]
    fn walks_back_to_start() {
        let mut grid: PathingGrid = "S..\n...\n..E".parse().unwrap();
        let mut came_from = FxIndexMap::default();
        let chain = [
            position(0, 0),
            position(0, 1),
            position(1, 1),
            position(2, 1),
            position(2, 2),
        ];
        for pair in chain.windows(2) {
            came_from.insert(pair[1], pair[0]);
        }
        let mut steps = Vec::new();
        let mut record = |_: &PathingGrid, step: Step| steps.push(step);
        let path = reconstruct_path(&mut grid, &came_from, position(2, 2), &mut record);
        assert_eq!(path, chain.to_vec());
        // One step per predecessor, the start included
        assert_eq!(
            steps,
            vec![
                Step::Path(position(2, 1)),
                Step::Path(position(1, 1)),
                Step::Path(position(0, 1)),
                Step::Path(position(0, 0)),
            ]
        );
        assert_eq!(grid.to_string(), "S*.\n.*.\n.*E\n");
    }
}
