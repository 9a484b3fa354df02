use std::sync::atomic::{AtomicI32, AtomicU8, Ordering};

/// A `(row, col)` position in the maze. Row 0 is the northern edge.
pub type Coord = (usize, usize);

/// The four sides of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    const fn bit(self) -> u8 {
        match self {
            Direction::North => 0b0001,
            Direction::East => 0b0010,
            Direction::South => 0b0100,
            Direction::West => 0b1000,
        }
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// The neighbor one step away in this direction, or `None` if it would leave
    /// a `width x height` grid.
    pub fn step(self, coord: Coord, width: usize, height: usize) -> Option<Coord> {
        let (row, col) = coord;
        let next = match self {
            Direction::North => (row.checked_sub(1)?, col),
            Direction::East => (row, col + 1),
            Direction::South => (row + 1, col),
            Direction::West => (row, col.checked_sub(1)?),
        };
        (next.0 < height && next.1 < width).then_some(next)
    }

    /// The direction leading from `from` to an adjacent `to`, if they are adjacent.
    pub fn between(from: Coord, to: Coord) -> Option<Direction> {
        match (to.0 as isize - from.0 as isize, to.1 as isize - from.1 as isize) {
            (-1, 0) => Some(Direction::North),
            (0, 1) => Some(Direction::East),
            (1, 0) => Some(Direction::South),
            (0, -1) => Some(Direction::West),
            _ => None,
        }
    }
}

/// A point-in-time copy of one cell, as handed to renderers.
///
/// Wall flags are `true` when the side is an open passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub north: bool,
    pub east: bool,
    pub south: bool,
    pub west: bool,
    /// Distance from the source of the current traversal, or -1.
    pub dist: i32,
    /// Carved during generation, or searched during a solve.
    pub gen_visited: bool,
    /// Reached by the current solve or fill pass, or on the solved path.
    pub fill_visited: bool,
}

impl Cell {
    pub fn is_open(&self, dir: Direction) -> bool {
        match dir {
            Direction::North => self.north,
            Direction::East => self.east,
            Direction::South => self.south,
            Direction::West => self.west,
        }
    }

    /// Reached by the last solve or fill pass. After a successful solve these
    /// are exactly the path cells.
    pub fn is_reached(&self) -> bool {
        self.fill_visited && self.dist >= 0
    }
}

const GEN_VISITED: u8 = 0b01;
const FILL_VISITED: u8 = 0b10;

/// Backing storage for one cell.
///
/// Every field is an atomic accessed with `Relaxed` ordering. The worker thread
/// is the only writer; renderers may read concurrently and can observe a cell
/// with some fields updated and others not yet. That transient mix is accepted.
#[derive(Debug)]
pub(crate) struct CellSlot {
    walls: AtomicU8,
    flags: AtomicU8,
    dist: AtomicI32,
}

impl CellSlot {
    pub(crate) fn walled() -> Self {
        CellSlot {
            walls: AtomicU8::new(0),
            flags: AtomicU8::new(0),
            dist: AtomicI32::new(-1),
        }
    }

    pub(crate) fn clear(&self) {
        self.walls.store(0, Ordering::Relaxed);
        self.reset_fill_state();
    }

    pub(crate) fn reset_fill_state(&self) {
        self.flags.store(0, Ordering::Relaxed);
        self.dist.store(-1, Ordering::Relaxed);
    }

    pub(crate) fn open(&self, dir: Direction) {
        self.walls.fetch_or(dir.bit(), Ordering::Relaxed);
    }

    pub(crate) fn is_open(&self, dir: Direction) -> bool {
        self.walls.load(Ordering::Relaxed) & dir.bit() != 0
    }

    fn set_flag(&self, flag: u8, value: bool) {
        if value {
            self.flags.fetch_or(flag, Ordering::Relaxed);
        } else {
            self.flags.fetch_and(!flag, Ordering::Relaxed);
        }
    }

    fn has_flag(&self, flag: u8) -> bool {
        self.flags.load(Ordering::Relaxed) & flag != 0
    }

    pub(crate) fn load(&self, coord: Coord) -> Cell {
        let walls = self.walls.load(Ordering::Relaxed);
        let flags = self.flags.load(Ordering::Relaxed);
        Cell {
            row: coord.0,
            col: coord.1,
            north: walls & Direction::North.bit() != 0,
            east: walls & Direction::East.bit() != 0,
            south: walls & Direction::South.bit() != 0,
            west: walls & Direction::West.bit() != 0,
            dist: self.dist.load(Ordering::Relaxed),
            gen_visited: flags & GEN_VISITED != 0,
            fill_visited: flags & FILL_VISITED != 0,
        }
    }
}

/// A handle to one cell of a [`Grid`](super::Grid), obtained from `Grid::get`.
///
/// Wall flags are only reachable through `Grid::connect`, which keeps both
/// sides of a shared wall in sync.
#[derive(Debug, Clone, Copy)]
pub struct CellRef<'a> {
    slot: &'a CellSlot,
    coord: Coord,
}

impl<'a> CellRef<'a> {
    pub(crate) fn new(slot: &'a CellSlot, coord: Coord) -> Self {
        CellRef { slot, coord }
    }

    pub fn coord(&self) -> Coord {
        self.coord
    }

    pub fn snapshot(&self) -> Cell {
        self.slot.load(self.coord)
    }

    pub fn is_open(&self, dir: Direction) -> bool {
        self.slot.is_open(dir)
    }

    pub fn dist(&self) -> i32 {
        self.slot.dist.load(Ordering::Relaxed)
    }

    pub fn set_dist(&self, dist: i32) {
        self.slot.dist.store(dist, Ordering::Relaxed);
    }

    pub fn gen_visited(&self) -> bool {
        self.slot.has_flag(GEN_VISITED)
    }

    pub fn set_gen_visited(&self, visited: bool) {
        self.slot.set_flag(GEN_VISITED, visited);
    }

    pub fn fill_visited(&self) -> bool {
        self.slot.has_flag(FILL_VISITED)
    }

    pub fn set_fill_visited(&self, visited: bool) {
        self.slot.set_flag(FILL_VISITED, visited);
    }

    pub fn reset_fill_state(&self) {
        self.slot.reset_fill_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_stays_in_bounds() {
        assert_eq!(Direction::North.step((0, 0), 3, 3), None);
        assert_eq!(Direction::West.step((0, 0), 3, 3), None);
        assert_eq!(Direction::East.step((0, 2), 3, 3), None);
        assert_eq!(Direction::South.step((2, 0), 3, 3), None);
        assert_eq!(Direction::South.step((0, 0), 3, 3), Some((1, 0)));
        assert_eq!(Direction::East.step((1, 1), 3, 3), Some((1, 2)));
    }

    #[test]
    fn test_between() {
        assert_eq!(Direction::between((1, 1), (0, 1)), Some(Direction::North));
        assert_eq!(Direction::between((1, 1), (1, 2)), Some(Direction::East));
        assert_eq!(Direction::between((1, 1), (2, 2)), None);
        assert_eq!(Direction::between((1, 1), (1, 1)), None);
    }

    #[test]
    fn test_slot_flags_are_independent() {
        let slot = CellSlot::walled();
        let cell = CellRef::new(&slot, (2, 3));
        cell.set_gen_visited(true);
        cell.set_fill_visited(true);
        cell.set_fill_visited(false);
        cell.set_dist(7);
        let snap = cell.snapshot();
        assert!(snap.gen_visited);
        assert!(!snap.fill_visited);
        assert_eq!(snap.dist, 7);
        assert_eq!((snap.row, snap.col), (2, 3));

        slot.open(Direction::East);
        slot.clear();
        let snap = cell.snapshot();
        assert!(!snap.east && !snap.gen_visited);
        assert_eq!(snap.dist, -1);
    }
}
