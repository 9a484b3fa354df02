use std::io::{Stdout, Write};

use crossterm::{
    QueueableCommand, cursor, queue,
    style::{self, Attribute, Color, StyledContent, Stylize},
    terminal::{self, ClearType},
};
use unicode_truncate::UnicodeTruncateStr;

use crate::maze::{Cell, CellBuffer, OperationKind};

/// How cell flags should be read for the current frame.
///
/// During generation `gen_visited` means carved, while a solve or fill reuses
/// it for cells that were searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Carving,
    Searching,
}

impl From<OperationKind> for Phase {
    fn from(op: OperationKind) -> Self {
        match op {
            OperationKind::Generation => Phase::Carving,
            OperationKind::Solving | OperationKind::Fill => Phase::Searching,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tile {
    Wall,
    Open,
    Searched,
    Reached,
    Start,
    Goal,
}

impl Tile {
    fn glyph(self) -> StyledContent<&'static str> {
        let glyph = match self {
            Tile::Wall => "⬜".with(Color::White),
            Tile::Open => "  ".with(Color::Reset),
            Tile::Searched => "🟦".with(Color::Blue),
            Tile::Reached => "🟨".with(Color::Yellow),
            Tile::Start => "🟩".with(Color::Green),
            Tile::Goal => "🟥".with(Color::Red),
        };

        #[cfg(debug_assertions)]
        {
            use unicode_width::UnicodeWidthStr;
            assert_eq!(
                glyph.content().width(),
                Renderer::TILE_WIDTH as usize,
                "Each tile must occupy exactly two character widths."
            );
        }

        glyph
    }
}

/// Draws whole frames from a [`CellBuffer`].
///
/// A `w x h` maze becomes a `(2w + 1) x (2h + 1)` board of tiles: cells sit on
/// odd coordinates and the tiles between them show whether the shared wall is
/// open.
#[derive(Default)]
pub struct Renderer {
    /// Board size of the last frame and whether it fit, to detect when the
    /// screen must be cleared
    frame: Option<((usize, usize), bool)>,
}

impl Renderer {
    /// Each tile is two terminal columns wide
    pub const TILE_WIDTH: u16 = 2;
    /// Rows reserved under the board for status and key help
    pub const NUM_STATUS_ROWS: u16 = 2;

    pub fn new() -> Self {
        Self { frame: None }
    }

    /// Largest maze that fits a terminal of the given size.
    pub fn max_maze_size(term_width: u16, term_height: u16) -> (usize, usize) {
        let board_cols = (term_width / Renderer::TILE_WIDTH) as usize;
        let board_rows = term_height.saturating_sub(Renderer::NUM_STATUS_ROWS) as usize;
        (
            (board_cols.saturating_sub(1) / 2).max(1),
            (board_rows.saturating_sub(1) / 2).max(1),
        )
    }

    pub fn force_redraw(&mut self) {
        self.frame = None;
    }

    fn cell_tile(cell: &Cell, phase: Phase, goal: (usize, usize)) -> Tile {
        if (cell.row, cell.col) == (0, 0) {
            return Tile::Start;
        }
        if (cell.row, cell.col) == goal {
            return Tile::Goal;
        }
        match phase {
            Phase::Carving if cell.fill_visited => Tile::Searched,
            Phase::Carving if cell.gen_visited => Tile::Open,
            Phase::Carving => Tile::Wall,
            Phase::Searching if cell.is_reached() => Tile::Reached,
            Phase::Searching if cell.gen_visited => Tile::Searched,
            Phase::Searching => Tile::Open,
        }
    }

    /// Tile for the wall between two adjacent cells.
    fn passage_tile(open: bool, a: &Cell, b: &Cell, phase: Phase) -> Tile {
        if !open {
            return Tile::Wall;
        }
        let consecutive = a.is_reached() && b.is_reached() && (a.dist - b.dist).abs() == 1;
        if phase == Phase::Searching && consecutive {
            Tile::Reached
        } else {
            Tile::Open
        }
    }

    fn board_tiles(cells: &[Cell], width: usize, height: usize, phase: Phase) -> Vec<Vec<Tile>> {
        let goal = (height - 1, width - 1);
        let mut board = vec![vec![Tile::Wall; 2 * width + 1]; 2 * height + 1];
        for cell in cells {
            let (y, x) = (2 * cell.row + 1, 2 * cell.col + 1);
            board[y][x] = Renderer::cell_tile(cell, phase, goal);
            if cell.col + 1 < width {
                let east = &cells[cell.row * width + cell.col + 1];
                board[y][x + 1] = Renderer::passage_tile(cell.east, cell, east, phase);
            }
            if cell.row + 1 < height {
                let south = &cells[(cell.row + 1) * width + cell.col];
                board[y + 1][x] = Renderer::passage_tile(cell.south, cell, south, phase);
            }
        }
        board
    }

    /// Draws one frame with the status text under it.
    /// Returns Ok(false) without drawing the board if it no longer fits the
    /// terminal, or if the buffer went stale.
    pub fn draw(
        &mut self,
        stdout: &mut Stdout,
        buffer: &CellBuffer,
        phase: Phase,
        status: &str,
    ) -> std::io::Result<bool> {
        let (Some((width, height)), Some(cells)) = (buffer.dimensions(), buffer.snapshot()) else {
            return Ok(false);
        };
        let board_size = (2 * width + 1, 2 * height + 1);
        let (term_width, term_height) = terminal::size()?;
        let fits = board_size.0 * Renderer::TILE_WIDTH as usize <= term_width as usize
            && board_size.1 + Renderer::NUM_STATUS_ROWS as usize <= term_height as usize;

        if self.frame != Some((board_size, fits)) {
            stdout.queue(terminal::Clear(ClearType::All))?;
            self.frame = Some((board_size, fits));
        }

        if !fits {
            let msg = format!(
                "Terminal is too small ({term_width}x{term_height}) to show a {width}x{height} maze. Resize it or press Esc."
            );
            let (msg, _) = msg.as_str().unicode_truncate(term_width as usize);
            queue!(
                stdout,
                cursor::MoveTo(0, 0),
                style::PrintStyledContent(msg.with(Color::Yellow).attribute(Attribute::Bold))
            )?;
            stdout.flush()?;
            return Ok(false);
        }

        for (y, row) in Renderer::board_tiles(&cells, width, height, phase)
            .iter()
            .enumerate()
        {
            stdout.queue(cursor::MoveTo(0, y as u16))?;
            for tile in row {
                stdout.queue(style::PrintStyledContent(tile.glyph()))?;
            }
        }

        let (status, _) = status.unicode_truncate(term_width as usize);
        queue!(
            stdout,
            cursor::MoveTo(0, board_size.1 as u16),
            terminal::Clear(ClearType::CurrentLine),
            style::PrintStyledContent(status.with(Color::Cyan).attribute(Attribute::Bold)),
        )?;
        stdout.flush()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walled(width: usize, height: usize) -> Vec<Cell> {
        (0..height)
            .flat_map(|row| {
                (0..width).map(move |col| Cell {
                    row,
                    col,
                    north: false,
                    east: false,
                    south: false,
                    west: false,
                    dist: -1,
                    gen_visited: false,
                    fill_visited: false,
                })
            })
            .collect()
    }

    #[test]
    fn test_board_layout() {
        let mut cells = walled(2, 1);
        cells[0].east = true;
        cells[1].west = true;
        let board = Renderer::board_tiles(&cells, 2, 1, Phase::Searching);
        assert_eq!(board.len(), 3);
        assert!(board.iter().all(|row| row.len() == 5));
        assert_eq!(board[1][1], Tile::Start);
        assert_eq!(board[1][2], Tile::Open);
        assert_eq!(board[1][3], Tile::Goal);
        assert!(board[0].iter().all(|&tile| tile == Tile::Wall));
    }

    #[test]
    fn test_uncarved_cells_are_walls_while_carving() {
        let mut cells = walled(3, 3);
        cells[4].gen_visited = true;
        let board = Renderer::board_tiles(&cells, 3, 3, Phase::Carving);
        assert_eq!(board[3][3], Tile::Open);
        assert_eq!(board[3][5], Tile::Wall);
    }

    #[test]
    fn test_path_passages_are_highlighted() {
        let mut cells = walled(3, 1);
        for (col, cell) in cells.iter_mut().enumerate() {
            cell.east = col < 2;
            cell.west = col > 0;
            cell.fill_visited = true;
            cell.dist = col as i32;
        }
        let board = Renderer::board_tiles(&cells, 3, 1, Phase::Searching);
        assert_eq!(board[1][2], Tile::Reached);
        assert_eq!(board[1][3], Tile::Reached);
        assert_eq!(board[1][4], Tile::Reached);
    }

    #[test]
    fn test_max_maze_size() {
        assert_eq!(Renderer::max_maze_size(80, 24), (19, 10));
        assert_eq!(Renderer::max_maze_size(0, 0), (1, 1));
    }
}
