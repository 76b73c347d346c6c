use grid_astar::{position, AstarSolver, CellState, PathingGrid, Step};

// Runs a search on a 10x10 grid with the layout
//  __________
// |S         |
// | ######## |
// |        # |
// |######  # |
// |     #  # |
// |  #  #    |
// |  #  #### |
// |  #     # |
// |  ####  # |
// |        #E|
//  __________
// printing the grid after every step the way an animated front end would redraw it.
//
// Symbols: S start, E end, # barrier, o open, x closed, * path.

fn main() {
    let mut grid = PathingGrid::build(10);
    for (row, cols) in [
        (1, 1..9),
        (2, 8..9),
        (3, 0..6),
        (3, 8..9),
        (4, 5..6),
        (4, 8..9),
        (5, 2..3),
        (5, 5..6),
        (6, 2..3),
        (6, 5..9),
        (7, 2..3),
        (7, 8..9),
        (8, 2..6),
        (8, 8..9),
        (9, 8..9),
    ] {
        for col in cols {
            grid.set_state(position(row, col), CellState::Barrier)
                .unwrap();
        }
    }
    let solver = AstarSolver::new();
    let outcome = solver
        .run_search(&mut grid, position(0, 0), position(9, 9), |grid, step| {
            match step {
                Step::Expanded(p) => println!("Expanded {}", p),
                Step::Path(p) => println!("Path {}", p),
            }
            println!("{}", grid);
        })
        .unwrap();
    println!("{:?}", outcome);
}
