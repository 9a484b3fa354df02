use rand::{Rng, rngs::StdRng};

use super::{carve, visit};
use crate::{control::Checkpoint, error::MazeError, maze::Grid};

/// Row by row: extend a run eastwards, or close it by carving north from one
/// random cell of the run. The top row can only carve east.
pub fn sidewinder(grid: &Grid, rng: &mut StdRng, ctl: &dyn Checkpoint) -> Result<(), MazeError> {
    let width = grid.width();

    visit(grid, (0, 0));
    ctl.checkpoint()?;
    for col in 1..width {
        carve(grid, (0, col - 1), (0, col), ctl)?;
    }

    for row in 1..grid.height() {
        let mut run_start = 0;
        for col in 0..width {
            let at_east_edge = col + 1 == width;
            if at_east_edge || rng.random_bool(0.5) {
                // Close the run
                let chosen = rng.random_range(run_start..=col);
                carve(grid, (row - 1, chosen), (row, chosen), ctl)?;
                // The rest of the run hangs off the chosen cell through east/west passages
                for c in run_start..=col {
                    visit(grid, (row, c));
                }
                run_start = col + 1;
            } else {
                grid.connect((row, col), (row, col + 1));
                ctl.checkpoint()?;
            }
        }
    }
    Ok(())
}
