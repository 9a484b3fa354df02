use std::collections::VecDeque;

use crate::{
    control::Checkpoint,
    error::MazeError,
    maze::{Coord, Grid},
};

/// Breadth-first flood from `source`, marking every reachable cell with
/// `fill_visited` and its BFS layer in `dist`. Returns the number of cells reached.
///
/// An out-of-bounds source fails before any cell is touched.
pub fn flood_fill(grid: &Grid, source: Coord, ctl: &dyn Checkpoint) -> Result<usize, MazeError> {
    let source_cell = grid.get(source.0, source.1)?;
    grid.reset_fill_state();

    source_cell.set_dist(0);
    source_cell.set_fill_visited(true);
    let mut queue = VecDeque::from([source]);
    let mut reached = 1;

    while let Some(current) = queue.pop_front() {
        let dist = grid.cell(current).dist();
        for next in grid.open_neighbors(current) {
            let next_cell = grid.cell(next);
            if next_cell.fill_visited() {
                continue;
            }
            next_cell.set_fill_visited(true);
            next_cell.set_dist(dist + 1);
            reached += 1;
            queue.push_back(next);
        }
        ctl.checkpoint()?;
    }
    Ok(reached)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        control::Unthrottled,
        generators::{Generator, generate_maze, get_rng},
    };

    #[test]
    fn test_fill_reaches_whole_maze() {
        let grid = Grid::new(7, 5);
        generate_maze(&grid, Generator::HuntAndKill, &mut get_rng(Some(9)), &Unthrottled).unwrap();
        assert_eq!(flood_fill(&grid, (2, 3), &Unthrottled), Ok(35));
        let cells = grid.snapshot();
        assert!(cells.iter().all(|cell| cell.fill_visited && cell.dist >= 0));
        assert_eq!(grid.cell((2, 3)).dist(), 0);
    }

    #[test]
    fn test_fill_layers_match_corridor_distance() {
        let grid = Grid::new(5, 1);
        (0..4).for_each(|col| {
            grid.connect((0, col), (0, col + 1));
        });
        flood_fill(&grid, (0, 1), &Unthrottled).unwrap();
        let dists = grid.snapshot().iter().map(|cell| cell.dist).collect::<Vec<_>>();
        assert_eq!(dists, vec![1, 0, 1, 2, 3]);
    }

    #[test]
    fn test_fill_stops_at_walls() {
        let grid = Grid::new(3, 3);
        grid.connect((0, 0), (0, 1));
        assert_eq!(flood_fill(&grid, (0, 0), &Unthrottled), Ok(2));
        assert!(!grid.cell((1, 1)).fill_visited());
        assert_eq!(grid.cell((1, 1)).dist(), -1);
    }

    #[test]
    fn test_out_of_bounds_leaves_state() {
        let grid = Grid::new(3, 3);
        grid.connect((0, 0), (0, 1));
        flood_fill(&grid, (0, 0), &Unthrottled).unwrap();
        let before = grid.snapshot();
        assert!(matches!(
            flood_fill(&grid, (3, 0), &Unthrottled),
            Err(MazeError::OutOfBounds { row: 3, col: 0, .. })
        ));
        assert_eq!(grid.snapshot(), before);
    }
}
