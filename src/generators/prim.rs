use rand::{Rng, rngs::StdRng};

use super::{carve, random_cell, visit};
use crate::{
    control::Checkpoint,
    error::MazeError,
    maze::{Coord, Grid},
};

/// Push every wall from `cell` into a not-yet-visited neighbor onto the frontier.
fn extend_frontier(grid: &Grid, cell: Coord, frontier: &mut Vec<(Coord, Coord)>) {
    frontier.extend(
        grid.neighbors(cell)
            .filter(|&c| !grid.cell(c).gen_visited())
            .map(|c| (cell, c)),
    );
}

pub fn randomized_prim(
    grid: &Grid,
    rng: &mut StdRng,
    ctl: &dyn Checkpoint,
) -> Result<(), MazeError> {
    let start = random_cell(grid, rng);
    visit(grid, start);
    ctl.checkpoint()?;

    // Boundary edges of the growing maze: (inside cell, candidate cell)
    let mut frontier = Vec::new();
    extend_frontier(grid, start, &mut frontier);

    while !frontier.is_empty() {
        // Randomly select an edge from the frontier
        let idx = rng.random_range(0..frontier.len());
        let (from, to) = frontier.swap_remove(idx);

        // The far cell may have joined the maze through another edge since this one was added
        if grid.cell(to).gen_visited() {
            continue;
        }

        carve(grid, from, to, ctl)?;
        extend_frontier(grid, to, &mut frontier);
    }
    Ok(())
}
