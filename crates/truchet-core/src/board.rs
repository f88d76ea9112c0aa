use arrayvec::ArrayVec;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use crate::config::{validate_size, BoardConfig, ConfigError};
use crate::constants::STACK_CAPACITY;
use crate::tile::{EdgeColor, Orientation, Tile};
use crate::types::{Color, Direction, Piece, Pos};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    #[error("{0} is off the board")]
    OutOfBounds(Pos),
    #[error("no piece at {0}")]
    EmptyCell(Pos),
    #[error("stack at {0} is full")]
    StackFull(Pos),
    #[error("tile at {0} cannot flip")]
    NotFlippable(Pos),
}

/// A broken internal invariant. Seeing one of these means a bug in the
/// engine, not a bad request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("region at {pos} is labelled {cached:?} but measures {actual}")]
    RegionMismatch {
        pos: Pos,
        cached: Option<u16>,
        actual: u16,
    },
    #[error("stack at {0} still mixes colours after capture")]
    MixedStack(Pos),
    #[error("undo needs {needed} captured pieces for {pos} but only {available} remain")]
    CapturePoolShort { pos: Pos, needed: u8, available: usize },
    #[error("undo expected a {expected:?} piece on top of {pos}")]
    PieceMismatch { pos: Pos, expected: Color },
}

/// Pieces on one intersection, bottom first. Only the top piece moves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Stack {
    pieces: ArrayVec<Piece, STACK_CAPACITY>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(color: Color, height: u8) -> Self {
        let mut stack = Self::new();
        for _ in 0..usize::from(height).min(STACK_CAPACITY) {
            stack.pieces.push(Piece::new(color));
        }
        stack
    }

    /// Builds a stack from bottom to top. `None` if it would overflow.
    pub fn from_pieces(pieces: &[Piece]) -> Option<Self> {
        let mut stack = Self::new();
        for piece in pieces {
            stack.pieces.try_push(*piece).ok()?;
        }
        Some(stack)
    }

    pub fn height(&self) -> u8 {
        self.pieces.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn top(&self) -> Option<Piece> {
        self.pieces.last().copied()
    }

    pub fn bottom(&self) -> Option<Piece> {
        self.pieces.first().copied()
    }

    pub fn owner(&self) -> Option<Color> {
        self.top().map(|piece| piece.color)
    }

    pub fn iter(&self) -> impl Iterator<Item = Piece> + '_ {
        self.pieces.iter().copied()
    }

    pub fn is_monochrome(&self) -> bool {
        self.pieces
            .windows(2)
            .all(|pair| pair[0].color == pair[1].color)
    }

    pub fn count_of(&self, color: Color) -> u8 {
        self.pieces.iter().filter(|p| p.color == color).count() as u8
    }

    fn push(&mut self, piece: Piece) -> bool {
        self.pieces.try_push(piece).is_ok()
    }

    fn pop(&mut self) -> Option<Piece> {
        self.pieces.pop()
    }

    fn take_bottom(&mut self) -> Option<Piece> {
        if self.pieces.is_empty() {
            None
        } else {
            Some(self.pieces.remove(0))
        }
    }

    fn put_bottom(&mut self, piece: Piece) -> bool {
        self.pieces.try_insert(0, piece).is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    tile: Tile,
    stack: Stack,
    region: Option<u16>,
    home: Option<Color>,
}

impl Cell {
    /// The tile whose south-west corner is this cell. Tiles on the top row
    /// and right column hang off the board and are never crossed.
    pub const fn tile(&self) -> Tile {
        self.tile
    }

    pub const fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Size of the river region this cell belongs to. `None` only while a
    /// flip is being recomputed.
    pub const fn region_size(&self) -> Option<u16> {
        self.region
    }

    pub const fn base_of(&self) -> Option<Color> {
        self.home
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cols: u8,
    rows: u8,
    cells: Vec<Cell>,
    /// Indexed by the capturing side.
    captures: [Vec<Piece>; 2],
    on_board: [u16; 2],
}

impl Board {
    /// Standard starting layout: fixed alternating border tiles, seeded
    /// interior tiles, and each side's pieces on its home rows.
    pub fn new(config: &BoardConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut board = Self::layout(config.cols, config.rows, |_| {
            if rng.gen_bool(0.5) {
                Orientation::Falling
            } else {
                Orientation::Rising
            }
        });
        board.populate(config.home_rows);
        board.recompute_regions();
        debug!(
            cols = config.cols,
            rows = config.rows,
            seed = config.seed,
            "board created"
        );
        Ok(board)
    }

    /// No pieces, every interior tile rising.
    pub fn empty(cols: u8, rows: u8) -> Result<Self, ConfigError> {
        validate_size(cols, rows)?;
        let mut board = Self::layout(cols, rows, |_| Orientation::Rising);
        board.recompute_regions();
        Ok(board)
    }

    /// Builds a board from explicit interior orientations, listed row by
    /// row from the south for every tile that is not on the border.
    pub fn with_orientations(
        cols: u8,
        rows: u8,
        orientations: &[Orientation],
    ) -> Result<Self, ConfigError> {
        validate_size(cols, rows)?;
        let mut iter = orientations.iter().copied();
        let mut board = Self::layout(cols, rows, |_| iter.next().unwrap_or(Orientation::Rising));
        board.recompute_regions();
        Ok(board)
    }

    fn layout(cols: u8, rows: u8, mut interior: impl FnMut(Pos) -> Orientation) -> Self {
        let mut cells = Vec::with_capacity(usize::from(cols) * usize::from(rows));
        for row in 0..rows {
            for col in 0..cols {
                let pos = Pos::new(col, row);
                let active = col + 1 < cols && row + 1 < rows;
                let border = col == 0 || row == 0 || col + 2 == cols || row + 2 == rows;
                let tile = if !active {
                    Tile::new(Orientation::Rising, true)
                } else if border {
                    Tile::new(border_orientation(pos), true)
                } else {
                    Tile::new(interior(pos), false)
                };
                let home = if col % 2 != 0 {
                    None
                } else if row == 0 {
                    Some(Color::Black)
                } else if row + 1 == rows {
                    Some(Color::White)
                } else {
                    None
                };
                cells.push(Cell {
                    tile,
                    stack: Stack::new(),
                    region: None,
                    home,
                });
            }
        }
        Self {
            cols,
            rows,
            cells,
            captures: [Vec::new(), Vec::new()],
            on_board: [0; 2],
        }
    }

    fn populate(&mut self, home_rows: u8) {
        for k in 0..home_rows {
            for col in (0..self.cols).filter(|col| col % 2 == k % 2) {
                for (color, row) in [(Color::Black, k), (Color::White, self.rows - 1 - k)] {
                    if let Some(idx) = self.index(Pos::new(col, row)) {
                        self.cells[idx].stack = Stack::of(color, 1);
                        self.on_board[color.index()] += 1;
                    }
                }
            }
        }
    }

    pub const fn cols(&self) -> u8 {
        self.cols
    }

    pub const fn rows(&self) -> u8 {
        self.rows
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.col < self.cols && pos.row < self.rows
    }

    pub(crate) fn index(&self, pos: Pos) -> Option<usize> {
        self.contains(pos)
            .then(|| usize::from(pos.row) * usize::from(self.cols) + usize::from(pos.col))
    }

    pub(crate) fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| Pos::new(col, row)))
    }

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        self.index(pos).map(|idx| &self.cells[idx])
    }

    pub fn stack(&self, pos: Pos) -> Option<&Stack> {
        self.cell(pos).map(Cell::stack)
    }

    pub fn height(&self, pos: Pos) -> u8 {
        self.stack(pos).map_or(0, Stack::height)
    }

    pub fn is_vacant(&self, pos: Pos) -> bool {
        self.stack(pos).is_some_and(Stack::is_empty)
    }

    pub fn owner(&self, pos: Pos) -> Option<Color> {
        self.stack(pos).and_then(Stack::owner)
    }

    pub fn neighbor(&self, pos: Pos, dir: Direction) -> Option<Pos> {
        pos.offset(dir).filter(|next| self.contains(*next))
    }

    /// The tile a diagonal step from `pos` crosses, named by its south-west
    /// corner. `None` for orthogonal directions or steps off the board.
    pub fn crossed_tile(&self, pos: Pos, dir: Direction) -> Option<Pos> {
        self.neighbor(pos, dir)?;
        match dir {
            Direction::NE => Some(pos),
            Direction::SW => Some(Pos::new(pos.col - 1, pos.row - 1)),
            Direction::NW => Some(Pos::new(pos.col - 1, pos.row)),
            Direction::SE => Some(Pos::new(pos.col, pos.row - 1)),
            _ => None,
        }
    }

    /// Whether water joins `pos` to its neighbour in `dir`. Orthogonal
    /// neighbours are never joined.
    pub fn connects(&self, pos: Pos, dir: Direction) -> bool {
        self.crossed_tile(pos, dir)
            .and_then(|tile| self.cell(tile))
            .is_some_and(|cell| cell.tile.joins(dir))
    }

    pub fn river_neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        Direction::DIAGONAL
            .into_iter()
            .filter(move |dir| self.connects(pos, *dir))
            .filter_map(move |dir| self.neighbor(pos, dir))
    }

    /// Edge colours of the tile owned by `pos`, for drawing.
    pub fn edge_colors(&self, pos: Pos, side: Direction) -> Option<(EdgeColor, EdgeColor)> {
        if !self.is_tile_active(pos) {
            return None;
        }
        self.cell(pos).and_then(|cell| cell.tile.edge(side))
    }

    pub fn is_tile_active(&self, tile: Pos) -> bool {
        tile.col + 1 < self.cols && tile.row + 1 < self.rows
    }

    pub fn tile(&self, tile: Pos) -> Option<Tile> {
        if self.is_tile_active(tile) {
            self.cell(tile).map(Cell::tile)
        } else {
            None
        }
    }

    /// Corners of a tile: SW, SE, NE, NW.
    pub fn tile_corners(tile: Pos) -> [Pos; 4] {
        [
            tile,
            Pos::new(tile.col + 1, tile.row),
            Pos::new(tile.col + 1, tile.row + 1),
            Pos::new(tile.col, tile.row + 1),
        ]
    }

    /// Interior tile with nothing standing on any of its corners.
    pub fn is_flippable(&self, tile: Pos) -> bool {
        self.tile(tile).is_some_and(|t| !t.is_fixed())
            && Self::tile_corners(tile)
                .into_iter()
                .all(|corner| self.is_vacant(corner))
    }

    pub fn flippable_tiles(&self) -> impl Iterator<Item = Pos> + '_ {
        self.positions().filter(|tile| self.is_flippable(*tile))
    }

    pub fn bases(&self, color: Color) -> impl Iterator<Item = Pos> + '_ {
        self.positions()
            .filter(move |pos| self.cell(*pos).and_then(Cell::base_of) == Some(color))
    }

    /// How many of `color`'s bases hold a stack owned by its opponent.
    pub fn bases_occupied_against(&self, color: Color) -> usize {
        self.bases(color)
            .filter(|pos| self.owner(*pos) == Some(color.opponent()))
            .count()
    }

    pub fn pieces_on_board(&self, color: Color) -> u16 {
        self.on_board[color.index()]
    }

    /// Pieces `color` has taken from the opponent, oldest first.
    pub fn captured_by(&self, color: Color) -> &[Piece] {
        &self.captures[color.index()]
    }

    pub fn occupied_neighbors(&self, pos: Pos) -> u8 {
        Direction::ORTHOGONAL
            .into_iter()
            .filter_map(|dir| self.neighbor(pos, dir))
            .filter(|next| !self.is_vacant(*next))
            .count() as u8
    }

    /// Replaces the stack at `pos`. Intended for building positions, not
    /// for play.
    pub fn set_stack(&mut self, pos: Pos, stack: Stack) -> Result<(), BoardError> {
        let idx = self.index(pos).ok_or(BoardError::OutOfBounds(pos))?;
        for color in Color::ALL {
            self.on_board[color.index()] -= u16::from(self.cells[idx].stack.count_of(color));
            self.on_board[color.index()] += u16::from(stack.count_of(color));
        }
        self.cells[idx].stack = stack;
        Ok(())
    }

    /// Sets an interior tile and relabels every region. Intended for
    /// building positions; play uses flips.
    pub fn set_orientation(&mut self, tile: Pos, orientation: Orientation) -> Result<(), BoardError> {
        match self.tile(tile) {
            Some(t) if !t.is_fixed() => {}
            _ => return Err(BoardError::NotFlippable(tile)),
        }
        let idx = self.index(tile).ok_or(BoardError::OutOfBounds(tile))?;
        self.cells[idx].tile = Tile::new(orientation, false);
        self.recompute_regions();
        Ok(())
    }

    /// Puts pieces straight into a capture pool. Intended for building
    /// positions.
    pub fn set_captured(&mut self, capturer: Color, count: usize) {
        self.captures[capturer.index()] = vec![Piece::new(capturer.opponent()); count];
    }

    pub(crate) fn take_top(&mut self, pos: Pos) -> Result<Piece, BoardError> {
        let idx = self.index(pos).ok_or(BoardError::OutOfBounds(pos))?;
        let piece = self.cells[idx].stack.pop().ok_or(BoardError::EmptyCell(pos))?;
        self.on_board[piece.color.index()] -= 1;
        Ok(piece)
    }

    pub(crate) fn place(&mut self, pos: Pos, piece: Piece) -> Result<(), BoardError> {
        let idx = self.index(pos).ok_or(BoardError::OutOfBounds(pos))?;
        if !self.cells[idx].stack.push(piece) {
            return Err(BoardError::StackFull(pos));
        }
        self.on_board[piece.color.index()] += 1;
        Ok(())
    }

    pub(crate) fn take_bottom(&mut self, pos: Pos) -> Result<Piece, BoardError> {
        let idx = self.index(pos).ok_or(BoardError::OutOfBounds(pos))?;
        let piece = self.cells[idx]
            .stack
            .take_bottom()
            .ok_or(BoardError::EmptyCell(pos))?;
        self.on_board[piece.color.index()] -= 1;
        Ok(piece)
    }

    pub(crate) fn put_bottom(&mut self, pos: Pos, piece: Piece) -> Result<(), BoardError> {
        let idx = self.index(pos).ok_or(BoardError::OutOfBounds(pos))?;
        if !self.cells[idx].stack.put_bottom(piece) {
            return Err(BoardError::StackFull(pos));
        }
        self.on_board[piece.color.index()] += 1;
        Ok(())
    }

    pub(crate) fn move_stack(&mut self, from: Pos, to: Pos) -> Result<(), BoardError> {
        let src = self.index(from).ok_or(BoardError::OutOfBounds(from))?;
        let dst = self.index(to).ok_or(BoardError::OutOfBounds(to))?;
        if src == dst {
            return Ok(());
        }
        let combined =
            usize::from(self.cells[src].stack.height()) + usize::from(self.cells[dst].stack.height());
        if combined > STACK_CAPACITY {
            return Err(BoardError::StackFull(to));
        }
        let moving = std::mem::take(&mut self.cells[src].stack);
        for piece in moving.iter() {
            self.cells[dst].stack.push(piece);
        }
        Ok(())
    }

    pub(crate) fn push_capture(&mut self, capturer: Color, piece: Piece) {
        self.captures[capturer.index()].push(piece);
    }

    pub(crate) fn pop_capture(&mut self, capturer: Color) -> Option<Piece> {
        self.captures[capturer.index()].pop()
    }

    pub(crate) fn flip_tile_orientation(&mut self, tile: Pos) -> Result<(), BoardError> {
        if !self.is_flippable(tile) {
            return Err(BoardError::NotFlippable(tile));
        }
        let idx = self.index(tile).ok_or(BoardError::OutOfBounds(tile))?;
        self.cells[idx].tile = self.cells[idx].tile.flipped();
        Ok(())
    }

    pub(crate) fn set_region(&mut self, pos: Pos, size: Option<u16>) {
        if let Some(idx) = self.index(pos) {
            self.cells[idx].region = size;
        }
    }
}

/// Border tiles alternate so the frame reads as a closed pattern.
fn border_orientation(pos: Pos) -> Orientation {
    if (pos.col + pos.row) % 2 == 0 {
        Orientation::Rising
    } else {
        Orientation::Falling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_bottom_operations() {
        let mut stack = Stack::from_pieces(&[
            Piece::new(Color::Black),
            Piece::new(Color::White),
        ])
        .expect("fits");
        assert_eq!(stack.owner(), Some(Color::White));
        assert!(!stack.is_monochrome());
        assert_eq!(stack.take_bottom(), Some(Piece::new(Color::Black)));
        assert!(stack.is_monochrome());
        assert!(stack.put_bottom(Piece::new(Color::Black)));
        assert_eq!(stack.bottom(), Some(Piece::new(Color::Black)));
    }

    #[test]
    fn stack_capacity() {
        let mut stack = Stack::of(Color::White, 20);
        assert_eq!(usize::from(stack.height()), STACK_CAPACITY);
        assert!(!stack.push(Piece::new(Color::White)));
    }

    #[test]
    fn crossed_tiles() {
        let board = Board::empty(5, 5).expect("valid size");
        let pos = Pos::new(2, 2);
        assert_eq!(board.crossed_tile(pos, Direction::NE), Some(Pos::new(2, 2)));
        assert_eq!(board.crossed_tile(pos, Direction::SW), Some(Pos::new(1, 1)));
        assert_eq!(board.crossed_tile(pos, Direction::NW), Some(Pos::new(1, 2)));
        assert_eq!(board.crossed_tile(pos, Direction::SE), Some(Pos::new(2, 1)));
        assert_eq!(board.crossed_tile(pos, Direction::N), None);
        assert_eq!(board.crossed_tile(Pos::new(0, 0), Direction::SW), None);
    }

    #[test]
    fn move_stack_keeps_counts() {
        let mut board = Board::empty(4, 4).expect("valid size");
        board
            .set_stack(Pos::new(0, 0), Stack::of(Color::White, 3))
            .expect("on board");
        board.move_stack(Pos::new(0, 0), Pos::new(1, 1)).expect("moves");
        assert_eq!(board.height(Pos::new(1, 1)), 3);
        assert!(board.is_vacant(Pos::new(0, 0)));
        assert_eq!(board.pieces_on_board(Color::White), 3);
    }
}
