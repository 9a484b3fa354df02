use std::collections::VecDeque;

use super::Parents;
use crate::{
    control::Checkpoint,
    error::MazeError,
    maze::{Coord, Grid},
};

pub fn solve_bfs(
    grid: &Grid,
    start: Coord,
    goal: Coord,
    ctl: &dyn Checkpoint,
) -> Result<Parents, MazeError> {
    let mut parents = vec![None; grid.len()];

    let start_cell = grid.cell(start);
    start_cell.set_dist(0);
    start_cell.set_fill_visited(true);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        let cell = grid.cell(current);
        cell.set_gen_visited(true);
        ctl.checkpoint()?;

        if current == goal {
            return Ok(parents);
        }

        let dist = cell.dist();
        for next in grid.open_neighbors(current) {
            let next_cell = grid.cell(next);
            // Already queued or expanded
            if next_cell.fill_visited() {
                continue;
            }
            next_cell.set_fill_visited(true);
            next_cell.set_dist(dist + 1);
            parents[grid.ravel_index(next)] = Some(grid.ravel_index(current));
            queue.push_back(next);
        }
    }

    Err(MazeError::NoPathFound)
}
