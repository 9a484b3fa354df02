use rand::{Rng, rngs::StdRng};

use super::{carve, neighbors_by_visit, random_cell, visit};
use crate::{
    control::Checkpoint,
    error::MazeError,
    maze::{Coord, Grid},
};

/// Row-major scan for an unvisited cell bordering the maze, starting at `from`
/// and wrapping around. Returns the cell and its index.
fn hunt(grid: &Grid, from: usize, ctl: &dyn Checkpoint) -> Result<Option<(Coord, usize)>, MazeError> {
    for index in (from..grid.len()).chain(0..from) {
        if index % grid.width() == 0 {
            ctl.poll()?;
        }
        let coord = grid.unravel_index(index);
        if grid.cell(coord).gen_visited() {
            continue;
        }
        if grid.neighbors(coord).any(|c| grid.cell(c).gen_visited()) {
            return Ok(Some((coord, index)));
        }
    }
    Ok(None)
}

pub fn hunt_and_kill(
    grid: &Grid,
    rng: &mut StdRng,
    ctl: &dyn Checkpoint,
) -> Result<(), MazeError> {
    let mut current = random_cell(grid, rng);
    visit(grid, current);
    ctl.checkpoint()?;

    let mut hunt_from = 0;
    loop {
        // Kill: walk into random unvisited neighbors until boxed in
        let unvisited = neighbors_by_visit(grid, current, false);
        if !unvisited.is_empty() {
            let next = unvisited[rng.random_range(0..unvisited.len())];
            carve(grid, current, next, ctl)?;
            current = next;
            continue;
        }

        // Hunt: attach the next bordering cell to the maze and resume the walk there
        let Some((found, index)) = hunt(grid, hunt_from, ctl)? else {
            break;
        };
        hunt_from = index;
        let visited = neighbors_by_visit(grid, found, true);
        let anchor = visited[rng.random_range(0..visited.len())];
        carve(grid, anchor, found, ctl)?;
        current = found;
    }
    Ok(())
}
