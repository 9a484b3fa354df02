use rand::{Rng, SeedableRng, rngs::StdRng};

mod aldous_broder;
mod hunt_kill;
mod kruskal;
mod prim;
mod recur_backtrack;
mod sidewinder;
mod union_find;
mod wilson;

use aldous_broder::aldous_broder;
use hunt_kill::hunt_and_kill;
use kruskal::randomized_kruskal;
use prim::randomized_prim;
use recur_backtrack::recursive_backtrack;
use sidewinder::sidewinder;
use wilson::wilson;

use crate::{
    control::Checkpoint,
    error::MazeError,
    maze::{Coord, Grid},
};

/// Get a random number generator, optionally seeded for reproducibility.
pub fn get_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generator {
    RecurBacktrack,
    Kruskal,
    Prim,
    AldousBroder,
    Wilson,
    HuntAndKill,
    Sidewinder,
}

impl Generator {
    pub const ALL: [Generator; 7] = [
        Generator::RecurBacktrack,
        Generator::Kruskal,
        Generator::Prim,
        Generator::AldousBroder,
        Generator::Wilson,
        Generator::HuntAndKill,
        Generator::Sidewinder,
    ];
}

impl std::fmt::Display for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Generator::RecurBacktrack => write!(f, "Recursive Backtracking"),
            Generator::Kruskal => write!(f, "Kruskal's Algorithm"),
            Generator::Prim => write!(f, "Prim's Algorithm"),
            Generator::AldousBroder => write!(f, "Aldous-Broder"),
            Generator::Wilson => write!(f, "Wilson's Algorithm"),
            Generator::HuntAndKill => write!(f, "Hunt-and-Kill"),
            Generator::Sidewinder => write!(f, "Sidewinder"),
        }
    }
}

/// Clears the grid and carves a perfect maze into it.
///
/// On `Err(StoppedByUser)` the grid holds a partial maze in which every
/// carved passage is open on both sides.
pub fn generate_maze(
    grid: &Grid,
    generator: Generator,
    rng: &mut StdRng,
    ctl: &dyn Checkpoint,
) -> Result<(), MazeError> {
    grid.clear();
    if grid.is_empty() {
        return Ok(());
    }
    match generator {
        Generator::RecurBacktrack => recursive_backtrack(grid, rng, ctl),
        Generator::Kruskal => randomized_kruskal(grid, rng, ctl),
        Generator::Prim => randomized_prim(grid, rng, ctl),
        Generator::AldousBroder => aldous_broder(grid, rng, ctl),
        Generator::Wilson => wilson(grid, rng, ctl),
        Generator::HuntAndKill => hunt_and_kill(grid, rng, ctl),
        Generator::Sidewinder => sidewinder(grid, rng, ctl),
    }
}

/// Pick a uniformly random cell of the grid.
fn random_cell(grid: &Grid, rng: &mut StdRng) -> Coord {
    (
        rng.random_range(0..grid.height()),
        rng.random_range(0..grid.width()),
    )
}

/// Neighbors of `coord` whose `gen_visited` flag equals `visited`.
fn neighbors_by_visit(grid: &Grid, coord: Coord, visited: bool) -> Vec<Coord> {
    grid.neighbors(coord)
        .filter(|&c| grid.cell(c).gen_visited() == visited)
        .collect()
}

/// Marks a cell as part of the maze.
fn visit(grid: &Grid, coord: Coord) {
    grid.cell(coord).set_gen_visited(true);
}

/// Opens the wall from a maze cell into `to`, marks `to` visited, then yields
/// to the checkpoint. The step is complete before the checkpoint can stop it.
fn carve(grid: &Grid, from: Coord, to: Coord, ctl: &dyn Checkpoint) -> Result<(), MazeError> {
    grid.connect(from, to);
    visit(grid, to);
    ctl.checkpoint()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Unthrottled;
    use crate::generators::union_find::UnionFind;
    use crate::maze::Direction;
    use proptest::prelude::*;

    /// Lets `n` checkpoints or polls through, then reports a stop.
    struct StopAfter(std::cell::Cell<usize>);

    impl StopAfter {
        fn new(n: usize) -> Self {
            StopAfter(std::cell::Cell::new(n))
        }

        fn tick(&self) -> Result<(), MazeError> {
            match self.0.get() {
                0 => Err(MazeError::StoppedByUser),
                n => {
                    self.0.set(n - 1);
                    Ok(())
                }
            }
        }
    }

    impl Checkpoint for StopAfter {
        fn checkpoint(&self) -> Result<(), MazeError> {
            self.tick()
        }

        fn poll(&self) -> Result<(), MazeError> {
            self.tick()
        }
    }

    /// Open passages never close a loop.
    fn assert_acyclic(grid: &Grid, generator: Generator) {
        let mut sets = UnionFind::new(grid.len());
        for index in 0..grid.len() {
            let coord = grid.unravel_index(index);
            for dir in [Direction::East, Direction::South] {
                let Some(next) = dir.step(coord, grid.width(), grid.height()) else {
                    continue;
                };
                if grid.is_connected(coord, next) {
                    assert!(
                        sets.union(index, grid.ravel_index(next)),
                        "{generator} carved a cycle through {coord:?}"
                    );
                }
            }
        }
    }

    fn assert_perfect(grid: &Grid, generator: Generator) {
        assert_eq!(
            grid.open_connections(),
            grid.len() - 1,
            "{generator} should open exactly width*height - 1 passages"
        );
        assert!(grid.is_fully_connected(), "{generator} left unreachable cells");
        assert!(
            grid.snapshot().iter().all(|cell| cell.gen_visited),
            "{generator} left cells unvisited"
        );
    }

    fn assert_symmetric(grid: &Grid) {
        for cell in grid.snapshot() {
            for dir in Direction::ALL {
                let Some(next) = dir.step((cell.row, cell.col), grid.width(), grid.height())
                else {
                    // Boundary walls are never opened
                    assert!(!cell.is_open(dir));
                    continue;
                };
                let other = grid.cell(next).snapshot();
                assert_eq!(cell.is_open(dir), other.is_open(dir.opposite()));
            }
        }
    }

    #[test]
    fn test_kruskal_10x10_fixed_seed() {
        let grid = Grid::new(10, 10);
        let mut rng = get_rng(Some(42));
        generate_maze(&grid, Generator::Kruskal, &mut rng, &Unthrottled).unwrap();
        assert_eq!(grid.open_connections(), 99);
        assert!(grid.is_fully_connected());
    }

    #[test]
    fn test_single_cell() {
        for generator in Generator::ALL {
            let grid = Grid::new(1, 1);
            generate_maze(&grid, generator, &mut get_rng(Some(1)), &Unthrottled).unwrap();
            assert_perfect(&grid, generator);
        }
    }

    #[test]
    fn test_same_seed_same_maze() {
        for generator in Generator::ALL {
            let first = Grid::new(8, 6);
            let second = Grid::new(8, 6);
            generate_maze(&first, generator, &mut get_rng(Some(7)), &Unthrottled).unwrap();
            generate_maze(&second, generator, &mut get_rng(Some(7)), &Unthrottled).unwrap();
            assert_eq!(first.snapshot(), second.snapshot(), "{generator}");
        }
    }

    #[test]
    fn test_generation_clears_previous_maze() {
        let grid = Grid::new(5, 5);
        generate_maze(&grid, Generator::Prim, &mut get_rng(Some(3)), &Unthrottled).unwrap();
        grid.cell((2, 2)).set_dist(12);
        generate_maze(&grid, Generator::Sidewinder, &mut get_rng(Some(3)), &Unthrottled).unwrap();
        assert_perfect(&grid, Generator::Sidewinder);
        assert_eq!(grid.cell((2, 2)).dist(), -1);
    }

    proptest! {
        #[test]
        fn every_generator_builds_a_perfect_maze(
            width in 1usize..12,
            height in 1usize..12,
            seed in any::<u64>(),
        ) {
            for generator in Generator::ALL {
                let grid = Grid::new(width, height);
                generate_maze(&grid, generator, &mut get_rng(Some(seed)), &Unthrottled).unwrap();
                assert_perfect(&grid, generator);
                assert_symmetric(&grid);
            }
        }
    }

    proptest! {
        #[test]
        fn stopped_generation_leaves_a_valid_partial_maze(
            width in 1usize..10,
            height in 1usize..10,
            seed in any::<u64>(),
            stop_after in 0usize..120,
        ) {
            for generator in Generator::ALL {
                let grid = Grid::new(width, height);
                let ctl = StopAfter::new(stop_after);
                let result = generate_maze(&grid, generator, &mut get_rng(Some(seed)), &ctl);
                prop_assert!(
                    matches!(result, Ok(()) | Err(MazeError::StoppedByUser)),
                    "{generator}: {result:?}"
                );
                assert_symmetric(&grid);
                assert_acyclic(&grid, generator);
                // Walk markers never outlive the run
                prop_assert!(grid.snapshot().iter().all(|cell| !cell.fill_visited), "{generator}");
                if result.is_ok() {
                    assert_perfect(&grid, generator);
                }
            }
        }
    }

    #[test]
    fn test_stop_at_first_checkpoint() {
        for generator in Generator::ALL {
            let grid = Grid::new(5, 4);
            assert_eq!(
                generate_maze(&grid, generator, &mut get_rng(Some(2)), &StopAfter::new(0)),
                Err(MazeError::StoppedByUser),
                "{generator}"
            );
            // Kruskal joins its first edge before the first checkpoint
            assert!(grid.open_connections() <= 1, "{generator}");
        }
    }
}
