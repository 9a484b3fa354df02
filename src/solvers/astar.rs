use std::{cmp::Reverse, collections::BinaryHeap};

use super::Parents;
use crate::{
    control::Checkpoint,
    error::MazeError,
    maze::{Coord, Grid},
};

#[derive(Debug, PartialEq, Eq)]
struct TrackedCell {
    /// Index of the cell in the grid
    index: usize,
    /// Cost to reach this cell from the start
    traveling_cost: usize,
    /// Estimated cost to reach the goal from this cell
    heuristic_cost: usize,
}

impl TrackedCell {
    fn total_cost(&self) -> usize {
        self.traveling_cost + self.heuristic_cost
    }
}

impl Ord for TrackedCell {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Among equal totals prefer the cell closer to the goal
        self.total_cost()
            .cmp(&other.total_cost())
            .then(self.heuristic_cost.cmp(&other.heuristic_cost))
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for TrackedCell {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

fn manhattan(from: Coord, to: Coord) -> usize {
    from.0.abs_diff(to.0) + from.1.abs_diff(to.1)
}

pub fn solve_astar(
    grid: &Grid,
    start: Coord,
    goal: Coord,
    ctl: &dyn Checkpoint,
) -> Result<Parents, MazeError> {
    best_first(grid, start, goal, ctl, manhattan)
}

/// A* with a heuristic of zero.
pub fn solve_dijkstra(
    grid: &Grid,
    start: Coord,
    goal: Coord,
    ctl: &dyn Checkpoint,
) -> Result<Parents, MazeError> {
    best_first(grid, start, goal, ctl, |_, _| 0)
}

/// Expands cells in order of traveling cost plus heuristic. Every step costs 1.
fn best_first(
    grid: &Grid,
    start: Coord,
    goal: Coord,
    ctl: &dyn Checkpoint,
    heuristic: impl Fn(Coord, Coord) -> usize,
) -> Result<Parents, MazeError> {
    let mut parents = vec![None; grid.len()];
    // Lowest known traveling cost per cell
    let mut costs: Vec<Option<usize>> = vec![None; grid.len()];
    let mut closed = vec![false; grid.len()];

    // Using Reverse to turn the max-heap into a min-heap
    let mut open: BinaryHeap<Reverse<TrackedCell>> = BinaryHeap::new();
    let start_index = grid.ravel_index(start);
    costs[start_index] = Some(0);
    let start_cell = grid.cell(start);
    start_cell.set_dist(0);
    start_cell.set_fill_visited(true);
    open.push(Reverse(TrackedCell {
        index: start_index,
        traveling_cost: 0,
        heuristic_cost: heuristic(start, goal),
    }));

    while let Some(Reverse(current)) = open.pop() {
        // Superseded by a cheaper entry for the same cell
        if closed[current.index] {
            continue;
        }
        closed[current.index] = true;

        let coord = grid.unravel_index(current.index);
        grid.cell(coord).set_gen_visited(true);
        ctl.checkpoint()?;

        if coord == goal {
            return Ok(parents);
        }

        let new_cost = current.traveling_cost + 1;
        for next in grid.open_neighbors(coord) {
            let next_index = grid.ravel_index(next);
            if closed[next_index] || costs[next_index].is_some_and(|cost| cost <= new_cost) {
                continue;
            }
            costs[next_index] = Some(new_cost);
            parents[next_index] = Some(current.index);

            let next_cell = grid.cell(next);
            next_cell.set_dist(new_cost as i32);
            next_cell.set_fill_visited(true);
            open.push(Reverse(TrackedCell {
                index: next_index,
                traveling_cost: new_cost,
                heuristic_cost: heuristic(next, goal),
            }));
        }
    }

    Err(MazeError::NoPathFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Unthrottled;

    #[test]
    fn test_ordering_prefers_lower_total_then_closer() {
        let near = TrackedCell {
            index: 5,
            traveling_cost: 4,
            heuristic_cost: 1,
        };
        let far = TrackedCell {
            index: 1,
            traveling_cost: 1,
            heuristic_cost: 4,
        };
        assert!(near < far);
        let cheap = TrackedCell {
            index: 9,
            traveling_cost: 1,
            heuristic_cost: 1,
        };
        assert!(cheap < near);
    }

    #[test]
    fn test_astar_expands_less_than_dijkstra_in_open_room() {
        // Fully open 8x8 room: many shortest paths, A* heads straight for the goal
        let open_room = || {
            let grid = Grid::new(8, 8);
            for row in 0..8 {
                for col in 0..8 {
                    grid.connect((row, col), (row, col + 1));
                    grid.connect((row, col), (row + 1, col));
                }
            }
            grid
        };
        let count_searched = |grid: &Grid| grid.snapshot().iter().filter(|c| c.gen_visited).count();

        let astar_grid = open_room();
        solve_astar(&astar_grid, (0, 0), (7, 7), &Unthrottled).unwrap();
        let dijkstra_grid = open_room();
        solve_dijkstra(&dijkstra_grid, (0, 0), (7, 7), &Unthrottled).unwrap();

        assert!(count_searched(&astar_grid) < count_searched(&dijkstra_grid));
    }
}
