mod astar;
mod bfs;

use astar::{solve_astar, solve_dijkstra};
use bfs::solve_bfs;

use crate::{
    control::Checkpoint,
    error::MazeError,
    maze::{Coord, Grid},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Solver {
    Bfs,
    AStar,
    Dijkstra,
}

impl Solver {
    pub const ALL: [Solver; 3] = [Solver::Bfs, Solver::AStar, Solver::Dijkstra];
}

impl std::fmt::Display for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Solver::Bfs => write!(f, "Breadth-First Search (BFS)"),
            Solver::AStar => write!(f, "A* Search"),
            Solver::Dijkstra => write!(f, "Dijkstra's Algorithm"),
        }
    }
}

/// Back-pointers from each reached cell index to the index it was reached from.
type Parents = Vec<Option<usize>>;

/// Finds a shortest path from the top-left to the bottom-right cell.
///
/// While searching, reached cells get `fill_visited` and their distance, and
/// expanded cells get `gen_visited`. On success those marks are wiped and only
/// the path is marked, with `dist` counting steps from the start; the path's
/// cell count is returned. On failure the search marks are left in place.
pub fn solve_maze(grid: &Grid, solver: Solver, ctl: &dyn Checkpoint) -> Result<usize, MazeError> {
    grid.reset_fill_state();
    if grid.is_empty() {
        return Err(MazeError::NoPathFound);
    }
    let start = (0, 0);
    let goal = (grid.height() - 1, grid.width() - 1);

    let parents = match solver {
        Solver::Bfs => solve_bfs(grid, start, goal, ctl)?,
        Solver::AStar => solve_astar(grid, start, goal, ctl)?,
        Solver::Dijkstra => solve_dijkstra(grid, start, goal, ctl)?,
    };
    mark_path(grid, &parents, goal, ctl)
}

/// Walks the back-pointers from `goal` and re-marks only the path cells.
fn mark_path(
    grid: &Grid,
    parents: &Parents,
    goal: Coord,
    ctl: &dyn Checkpoint,
) -> Result<usize, MazeError> {
    let mut path = vec![grid.ravel_index(goal)];
    while let Some(parent) = parents[path[path.len() - 1]] {
        path.push(parent);
    }
    path.reverse();

    grid.reset_fill_state();
    for (step, &index) in path.iter().enumerate() {
        let cell = grid.cell(grid.unravel_index(index));
        cell.set_dist(step as i32);
        cell.set_fill_visited(true);
        ctl.checkpoint()?;
    }
    Ok(path.len())
}
