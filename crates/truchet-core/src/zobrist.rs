use std::sync::LazyLock;

use crate::board::Board;
use crate::constants::{MAX_BOARD_DIM, MAX_CELLS, STACK_CAPACITY};
use crate::tile::Orientation;
use crate::types::{Color, Pos};

const PIECE_KEYS: usize = MAX_CELLS * STACK_CAPACITY * 2;
const CAPTURE_KEYS: usize = 2 * 64;

static ZOBRIST_KEYS: LazyLock<ZobristKeys> = LazyLock::new(ZobristKeys::new);

#[derive(Debug, Clone)]
pub struct ZobristKeys {
    piece_cell_level: Vec<u64>,
    falling_tile: [u64; MAX_CELLS],
    flipped_tile: [u64; MAX_CELLS],
    capture_counts: [u64; CAPTURE_KEYS],
    side_to_move: u64,
}

pub fn zobrist_keys() -> &'static ZobristKeys {
    &ZOBRIST_KEYS
}

impl ZobristKeys {
    fn new() -> Self {
        let mut state = 0x9E37_79B9_7F4A_7C15u64;

        let piece_cell_level = (0..PIECE_KEYS).map(|_| next_u64(&mut state)).collect();

        let mut falling_tile = [0u64; MAX_CELLS];
        for key in &mut falling_tile {
            *key = next_u64(&mut state);
        }

        let mut flipped_tile = [0u64; MAX_CELLS];
        for key in &mut flipped_tile {
            *key = next_u64(&mut state);
        }

        let mut capture_counts = [0u64; CAPTURE_KEYS];
        for key in &mut capture_counts {
            *key = next_u64(&mut state);
        }

        Self {
            piece_cell_level,
            falling_tile,
            flipped_tile,
            capture_counts,
            side_to_move: next_u64(&mut state),
        }
    }

    /// Cells are keyed on the largest grid, so keys do not depend on the
    /// board's dimensions.
    fn cell_slot(pos: Pos) -> usize {
        usize::from(pos.row) * usize::from(MAX_BOARD_DIM) + usize::from(pos.col)
    }

    pub fn piece_key(&self, color: Color, pos: Pos, level: usize) -> Option<u64> {
        if level >= STACK_CAPACITY || pos.col >= MAX_BOARD_DIM || pos.row >= MAX_BOARD_DIM {
            return None;
        }
        let idx = (Self::cell_slot(pos) * STACK_CAPACITY + level) * 2 + color.index();
        self.piece_cell_level.get(idx).copied()
    }

    pub fn capture_key(&self, capturer: Color, count: usize) -> Option<u64> {
        if count == 0 || count >= CAPTURE_KEYS / 2 {
            return None;
        }
        Some(self.capture_counts[capturer.index() * (CAPTURE_KEYS / 2) + count])
    }

    pub fn hash_board(&self, board: &Board) -> u64 {
        let mut hash = 0u64;
        for pos in board.positions() {
            if let Some(stack) = board.stack(pos) {
                for (level, piece) in stack.iter().enumerate() {
                    if let Some(key) = self.piece_key(piece.color, pos, level) {
                        hash ^= key;
                    }
                }
            }
            if board
                .tile(pos)
                .is_some_and(|tile| tile.orientation() == Orientation::Falling)
            {
                hash ^= self.falling_tile[Self::cell_slot(pos)];
            }
        }
        for color in Color::ALL {
            if let Some(key) = self.capture_key(color, board.captured_by(color).len()) {
                hash ^= key;
            }
        }
        hash
    }

    pub fn hash_position(&self, board: &Board, turn: Color, flipped: Option<Pos>) -> u64 {
        let mut hash = self.hash_board(board);
        if matches!(turn, Color::Black) {
            hash ^= self.side_to_move;
        }
        if let Some(tile) = flipped {
            hash ^= self.flipped_tile[Self::cell_slot(tile) % MAX_CELLS];
        }
        hash
    }
}

fn next_u64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
