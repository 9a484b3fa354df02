use rand::{Rng, rngs::StdRng};

use super::{carve, random_cell, visit};
use crate::{control::Checkpoint, error::MazeError, maze::Grid};

/// Unbiased random walk that carves only on first entry into a cell.
pub fn aldous_broder(
    grid: &Grid,
    rng: &mut StdRng,
    ctl: &dyn Checkpoint,
) -> Result<(), MazeError> {
    let mut current = random_cell(grid, rng);
    visit(grid, current);
    ctl.checkpoint()?;
    let mut remaining = grid.len() - 1;

    while remaining > 0 {
        let neighbors = grid.neighbors(current).collect::<Vec<_>>();
        let next = neighbors[rng.random_range(0..neighbors.len())];

        if grid.cell(next).gen_visited() {
            // Walking over the maze changes nothing visible, so don't pace it
            ctl.poll()?;
        } else {
            carve(grid, current, next, ctl)?;
            remaining -= 1;
        }
        current = next;
    }
    Ok(())
}
