use rand::{Rng, rngs::StdRng};

use super::{carve, random_cell, visit};
use crate::{
    control::Checkpoint,
    error::MazeError,
    maze::{Coord, Direction, Grid},
};

/// Random walk from `path[0]` until it reaches the maze, erasing any loop as
/// soon as the walk crosses itself. Walk cells carry `fill_visited` so the walk
/// is visible while it runs. On return `path` ends with a maze cell.
fn loop_erased_walk(
    grid: &Grid,
    rng: &mut StdRng,
    ctl: &dyn Checkpoint,
    path: &mut Vec<Coord>,
    position: &mut [Option<usize>],
) -> Result<(), MazeError> {
    let Some(&start) = path.first() else {
        return Ok(());
    };
    let mut current = start;
    loop {
        ctl.poll()?;

        // Re-draw any step that would leave the grid
        let next = loop {
            let dir = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
            if let Some(next) = dir.step(current, grid.width(), grid.height()) {
                break next;
            }
        };

        if grid.cell(next).gen_visited() {
            path.push(next);
            return Ok(());
        }

        let next_idx = grid.ravel_index(next);
        match position[next_idx] {
            Some(at) => {
                // Crossed our own path: drop the loop back to `next`
                for erased in path.drain(at + 1..) {
                    position[grid.ravel_index(erased)] = None;
                    grid.cell(erased).set_fill_visited(false);
                }
            }
            None => {
                position[next_idx] = Some(path.len());
                path.push(next);
                grid.cell(next).set_fill_visited(true);
            }
        }
        current = next;
    }
}

pub fn wilson(grid: &Grid, rng: &mut StdRng, ctl: &dyn Checkpoint) -> Result<(), MazeError> {
    let first = random_cell(grid, rng);
    visit(grid, first);
    ctl.checkpoint()?;

    let mut position = vec![None; grid.len()];
    let mut path = Vec::new();

    for index in 0..grid.len() {
        let start = grid.unravel_index(index);
        if grid.cell(start).gen_visited() {
            continue;
        }

        path.clear();
        path.push(start);
        position[index] = Some(0);
        grid.cell(start).set_fill_visited(true);

        let walked = loop_erased_walk(grid, rng, ctl, &mut path, &mut position).and_then(|()| {
            for &coord in &path {
                position[grid.ravel_index(coord)] = None;
            }
            // Carve from the maze end back towards the walk's start
            path.windows(2).rev().try_for_each(|pair| {
                grid.cell(pair[0]).set_fill_visited(false);
                carve(grid, pair[1], pair[0], ctl)
            })
        });

        if walked.is_err() {
            path.iter()
                .for_each(|&coord| grid.cell(coord).set_fill_visited(false));
        }
        walked?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{control::Unthrottled, generators::get_rng};

    #[test]
    fn test_walk_markers_are_cleared() {
        let grid = Grid::new(6, 6);
        wilson(&grid, &mut get_rng(Some(11)), &Unthrottled).unwrap();
        assert!(grid.snapshot().iter().all(|cell| !cell.fill_visited));
    }

    #[test]
    fn test_corridors_redraw_off_grid_steps() {
        // Most directions leave a one-wide grid; each walk must still finish
        for (width, height) in [(1, 12), (12, 1), (2, 9)] {
            let grid = Grid::new(width, height);
            wilson(&grid, &mut get_rng(Some(5)), &Unthrottled).unwrap();
            assert_eq!(grid.open_connections(), grid.len() - 1);
            assert!(grid.is_fully_connected());
        }
    }
}
