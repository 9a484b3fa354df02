use rand::{Rng, rngs::StdRng};

use super::{carve, neighbors_by_visit, random_cell, visit};
use crate::{control::Checkpoint, error::MazeError, maze::Grid};

/// Depth-first carving driven by an explicit stack rather than the call stack,
/// so grid size is bounded only by memory.
pub fn recursive_backtrack(
    grid: &Grid,
    rng: &mut StdRng,
    ctl: &dyn Checkpoint,
) -> Result<(), MazeError> {
    let start = random_cell(grid, rng);
    visit(grid, start);
    ctl.checkpoint()?;

    // The stack keeps only cells already in the maze
    let mut stack = vec![start];

    while let Some(cell) = stack.pop() {
        let neighbors = neighbors_by_visit(grid, cell, false);

        if !neighbors.is_empty() {
            let neighbor = neighbors[rng.random_range(0..neighbors.len())];
            // Put the cell back first so we can look at another neighbor of this cell later
            stack.push(cell);
            stack.push(neighbor);
            carve(grid, cell, neighbor, ctl)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{control::Unthrottled, generators::get_rng};

    #[test]
    fn test_long_corridor_does_not_overflow() {
        // A single row forces the stack to grow to the full width
        let grid = Grid::new(50_000, 1);
        recursive_backtrack(&grid, &mut get_rng(Some(0)), &Unthrottled).unwrap();
        assert_eq!(grid.open_connections(), 49_999);
    }
}
