use std::{
    collections::VecDeque,
    sync::{Arc, Weak},
};

use super::cell::{Cell, CellRef, CellSlot, Coord, Direction};
use crate::error::MazeError;

/// Flat row-major store of `width * height` cells.
///
/// All mutation goes through `&self` so that one worker thread can carve while
/// renderers read the same cells through a [`CellBuffer`].
#[derive(Debug)]
pub struct Grid {
    data: Box<[CellSlot]>,
    width: usize,
    height: usize,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        let mut grid = Grid {
            data: Box::default(),
            width: 0,
            height: 0,
        };
        grid.resize(width, height);
        grid
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_in_bounds(&self, coord: Coord) -> bool {
        coord.0 < self.height && coord.1 < self.width
    }

    pub(crate) fn ravel_index(&self, coord: Coord) -> usize {
        coord.0 * self.width + coord.1
    }

    pub(crate) fn unravel_index(&self, index: usize) -> Coord {
        (index / self.width, index % self.width)
    }

    /// Resets every cell to fully walled, unvisited, with no distance.
    pub fn clear(&self) {
        self.data.iter().for_each(CellSlot::clear);
    }

    /// Reallocates the backing buffer if the dimensions differ, then clears.
    /// Returns whether a reallocation happened.
    pub fn resize(&mut self, width: usize, height: usize) -> bool {
        let reallocated = (width, height) != (self.width, self.height);
        if reallocated {
            self.data = (0..width * height).map(|_| CellSlot::walled()).collect();
            self.width = width;
            self.height = height;
        }
        self.clear();
        reallocated
    }

    /// Bounds-checked access to a single cell.
    pub fn get(&self, row: usize, col: usize) -> Result<CellRef<'_>, MazeError> {
        if !self.is_in_bounds((row, col)) {
            return Err(MazeError::OutOfBounds {
                row,
                col,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.cell((row, col)))
    }

    /// Unchecked-by-`Result` access for coordinates the caller already knows are valid.
    ///
    /// # Panics
    /// If `coord` is out of bounds.
    pub(crate) fn cell(&self, coord: Coord) -> CellRef<'_> {
        CellRef::new(&self.data[self.ravel_index(coord)], coord)
    }

    /// Opens the shared wall between two adjacent cells, on both sides.
    ///
    /// Returns `false` and leaves the grid untouched if the cells are not
    /// adjacent or either is out of bounds.
    pub fn connect(&self, a: Coord, b: Coord) -> bool {
        let Some(dir) = self.adjacency(a, b) else {
            return false;
        };
        self.data[self.ravel_index(a)].open(dir);
        self.data[self.ravel_index(b)].open(dir.opposite());
        true
    }

    /// Whether two adjacent cells share an open wall, checked from both sides.
    pub fn is_connected(&self, a: Coord, b: Coord) -> bool {
        match self.adjacency(a, b) {
            Some(dir) => {
                self.data[self.ravel_index(a)].is_open(dir)
                    && self.data[self.ravel_index(b)].is_open(dir.opposite())
            }
            None => false,
        }
    }

    fn adjacency(&self, a: Coord, b: Coord) -> Option<Direction> {
        if !self.is_in_bounds(a) || !self.is_in_bounds(b) {
            return None;
        }
        Direction::between(a, b)
    }

    /// In-bounds neighbors of a cell, regardless of walls.
    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        let (width, height) = (self.width, self.height);
        Direction::ALL
            .into_iter()
            .filter_map(move |dir| dir.step(coord, width, height))
    }

    /// Neighbors reachable from `coord` through an open wall.
    pub fn open_neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        self.neighbors(coord)
            .filter(move |&next| self.is_connected(coord, next))
    }

    /// Clears `dist` and both visited flags on every cell, keeping walls.
    pub fn reset_fill_state(&self) {
        self.data.iter().for_each(CellSlot::reset_fill_state);
    }

    /// Number of open passages, each shared wall counted once.
    pub fn open_connections(&self) -> usize {
        (0..self.len())
            .map(|index| self.unravel_index(index))
            .map(|coord| {
                [Direction::East, Direction::South]
                    .into_iter()
                    .filter_map(|dir| dir.step(coord, self.width, self.height))
                    .filter(|&next| self.is_connected(coord, next))
                    .count()
            })
            .sum()
    }

    /// Whether every cell is reachable from (0, 0) through open walls.
    pub fn is_fully_connected(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        let mut seen = vec![false; self.len()];
        let mut queue = VecDeque::from([(0, 0)]);
        seen[0] = true;
        let mut reached = 1;
        while let Some(coord) = queue.pop_front() {
            for next in self.open_neighbors(coord) {
                let index = self.ravel_index(next);
                if !seen[index] {
                    seen[index] = true;
                    reached += 1;
                    queue.push_back(next);
                }
            }
        }
        reached == self.len()
    }

    /// Copies every cell in row-major order.
    pub fn snapshot(&self) -> Vec<Cell> {
        self.data
            .iter()
            .enumerate()
            .map(|(index, slot)| slot.load(self.unravel_index(index)))
            .collect()
    }
}

/// Read-only view of a maze's cells for a rendering thread.
///
/// Holds a weak reference: it never keeps a grid alive. Once the maze is
/// resized or dropped, `snapshot` returns `None` and the renderer should ask
/// the maze for a fresh buffer.
#[derive(Debug, Clone)]
pub struct CellBuffer {
    grid: Weak<Grid>,
}

impl CellBuffer {
    pub(crate) fn new(grid: &Arc<Grid>) -> Self {
        CellBuffer {
            grid: Arc::downgrade(grid),
        }
    }

    /// `(width, height)` of the grid, if it is still current.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.grid.upgrade().map(|grid| (grid.width(), grid.height()))
    }

    pub fn is_stale(&self) -> bool {
        self.grid.strong_count() == 0
    }

    /// Copies all cells in row-major order, exactly `width * height` of them.
    pub fn snapshot(&self) -> Option<Vec<Cell>> {
        self.grid.upgrade().map(|grid| grid.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_out_of_bounds() {
        let grid = Grid::new(4, 3);
        assert!(grid.get(2, 3).is_ok());
        assert_eq!(
            grid.get(3, 0).unwrap_err(),
            MazeError::OutOfBounds {
                row: 3,
                col: 0,
                width: 4,
                height: 3
            }
        );
        assert!(grid.get(0, 4).is_err());
    }

    #[test]
    fn test_connect_is_symmetric() {
        let grid = Grid::new(3, 3);
        assert!(grid.connect((1, 1), (1, 2)));
        assert!(grid.cell((1, 1)).is_open(Direction::East));
        assert!(grid.cell((1, 2)).is_open(Direction::West));
        assert!(grid.is_connected((1, 2), (1, 1)));

        assert!(grid.connect((1, 1), (0, 1)));
        assert!(grid.cell((0, 1)).is_open(Direction::South));
        assert_eq!(grid.open_connections(), 2);
    }

    #[test]
    fn test_connect_rejects_non_adjacent() {
        let grid = Grid::new(3, 3);
        assert!(!grid.connect((0, 0), (1, 1)));
        assert!(!grid.connect((0, 0), (0, 2)));
        assert!(!grid.connect((2, 2), (2, 3)));
        assert_eq!(grid.open_connections(), 0);
    }

    #[test]
    fn test_resize_reallocates_only_on_change() {
        let mut grid = Grid::new(2, 2);
        grid.connect((0, 0), (0, 1));
        assert!(!grid.resize(2, 2));
        // Same dimensions still clears
        assert_eq!(grid.open_connections(), 0);
        assert!(grid.resize(5, 1));
        assert_eq!((grid.width(), grid.height(), grid.len()), (5, 1, 5));
    }

    #[test]
    fn test_full_connectivity() {
        let grid = Grid::new(2, 2);
        assert!(!grid.is_fully_connected());
        grid.connect((0, 0), (0, 1));
        grid.connect((0, 1), (1, 1));
        grid.connect((1, 1), (1, 0));
        assert!(grid.is_fully_connected());
        assert!(Grid::new(1, 1).is_fully_connected());
    }

    #[test]
    fn test_cell_buffer_goes_stale() {
        let grid = Arc::new(Grid::new(3, 2));
        let buffer = CellBuffer::new(&grid);
        assert_eq!(buffer.dimensions(), Some((3, 2)));
        let cells = buffer.snapshot().expect("grid is alive");
        assert_eq!(cells.len(), 6);
        assert_eq!((cells[4].row, cells[4].col), (1, 1));
        drop(grid);
        assert!(buffer.is_stale());
        assert!(buffer.snapshot().is_none());
    }
}
