use thiserror::Error;

use crate::board::{Board, BoardError, Stack};
use crate::config::{validate_size, BoardConfig, ConfigError};
use crate::constants::{MAX_BOARD_DIM, MAX_CELLS, MAX_STACK_HEIGHT};
use crate::tile::Orientation;
use crate::types::{Color, Piece, Pos};

/// Fields: tiles, stacks, side to move, tile flipped this turn, capture
/// counts, move number. Rows run north to south in both board fields.
pub const FIELD_COUNT: usize = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("invalid fen")]
    Invalid,
    #[error("fen validation error: {0}")]
    Validation(String),
    #[error("fen board size: {0}")]
    Config(#[from] ConfigError),
    #[error("fen board error: {0}")]
    Board(#[from] BoardError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFen {
    pub board: Board,
    pub turn: Color,
    pub flipped: Option<Pos>,
    pub move_number: u32,
}

/// The starting position for a fresh game from `config`.
pub fn starting_fen(config: &BoardConfig) -> Result<String, ConfigError> {
    let board = Board::new(config)?;
    Ok(encode_fen(&board, Color::White, None, 1))
}

pub fn validate_fen(fen: &str) -> Result<(), FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() != FIELD_COUNT {
        return Err(FenError::Validation(format!(
            "expected {FIELD_COUNT} fields, found {}",
            parts.len()
        )));
    }

    let tile_rows: Vec<&str> = parts[0].split('/').collect();
    let stack_rows: Vec<&str> = parts[1].split('/').collect();
    if tile_rows.len() + 1 != stack_rows.len() {
        return Err(FenError::Validation(format!(
            "{} tile rows do not fit {} stack rows",
            tile_rows.len(),
            stack_rows.len()
        )));
    }

    let cols = stack_row_width(stack_rows[0])?;
    for (idx, row) in stack_rows.iter().enumerate() {
        let width = stack_row_width(row)?;
        if width != cols {
            return Err(FenError::Validation(format!(
                "stack row {} has width {width}, expected {cols}",
                idx + 1
            )));
        }
    }
    for row in &tile_rows {
        if row.chars().count() + 1 != cols {
            return Err(FenError::Validation(format!(
                "tile row {row:?} does not fit {cols} columns"
            )));
        }
        if let Some(bad) = row.chars().find(|ch| Orientation::from_code(*ch).is_none()) {
            return Err(FenError::Validation(format!("unknown tile code {bad:?}")));
        }
    }
    let cols = u8::try_from(cols).map_err(|_| FenError::Validation("board too wide".into()))?;
    let rows = u8::try_from(stack_rows.len())
        .map_err(|_| FenError::Validation("board too tall".into()))?;
    validate_size(cols, rows)?;

    if Color::from_code(parts[2].chars().next().unwrap_or('-')).is_none() || parts[2].len() != 1 {
        return Err(FenError::Validation(format!(
            "side to move must be w or b, got {:?}",
            parts[2]
        )));
    }
    if parts[3] != "-" && parse_tile_pos(parts[3]).is_none() {
        return Err(FenError::Validation(format!(
            "flipped tile must be - or a coordinate, got {:?}",
            parts[3]
        )));
    }
    if parse_capture_counts(parts[4]).is_none() {
        return Err(FenError::Validation(format!(
            "captures must look like 2/0, got {:?}",
            parts[4]
        )));
    }
    match parts[5].parse::<u32>() {
        Ok(n) if n >= 1 => Ok(()),
        _ => Err(FenError::Validation(format!(
            "move number must be a positive integer, got {:?}",
            parts[5]
        ))),
    }
}

pub fn parse_fen(fen: &str) -> Result<ParsedFen, FenError> {
    validate_fen(fen)?;
    let parts: Vec<&str> = fen.split_whitespace().collect();
    let tile_rows: Vec<&str> = parts[0].split('/').collect();
    let stack_rows: Vec<&str> = parts[1].split('/').collect();
    let rows = stack_rows.len() as u8;
    let cols = tile_rows[0].chars().count() as u8 + 1;

    // Border tiles are part of the board, so they must read as the fixed
    // frame; only the interior is free.
    let frame = Board::empty(cols, rows)?;
    let mut interior = Vec::new();
    for (k, row) in tile_rows.iter().enumerate() {
        let tile_row = rows - 2 - k as u8;
        for (col, ch) in row.chars().enumerate() {
            let pos = Pos::new(col as u8, tile_row);
            let orientation = Orientation::from_code(ch).ok_or(FenError::Invalid)?;
            match frame.tile(pos) {
                Some(tile) if tile.is_fixed() => {
                    if tile.orientation() != orientation {
                        return Err(FenError::Validation(format!(
                            "border tile at {pos} must be {}",
                            tile.orientation().to_code()
                        )));
                    }
                }
                Some(_) => interior.push((pos, orientation)),
                None => return Err(FenError::Invalid),
            }
        }
    }
    interior.sort_by_key(|(pos, _)| (pos.row, pos.col));
    let orientations: Vec<Orientation> = interior.into_iter().map(|(_, o)| o).collect();
    let mut board = Board::with_orientations(cols, rows, &orientations)?;

    for (k, row) in stack_rows.iter().enumerate() {
        let row_idx = rows - 1 - k as u8;
        for (col, stack) in decode_stack_row(row)?.into_iter().enumerate() {
            if !stack.is_empty() {
                board.set_stack(Pos::new(col as u8, row_idx), stack)?;
            }
        }
    }

    let turn = parts[2]
        .chars()
        .next()
        .and_then(Color::from_code)
        .ok_or(FenError::Invalid)?;
    let flipped = match parts[3] {
        "-" => None,
        text => Some(parse_tile_pos(text).ok_or(FenError::Invalid)?),
    };
    if let Some(tile) = flipped {
        if !board.is_tile_active(tile) || board.tile(tile).is_some_and(|t| t.is_fixed()) {
            return Err(FenError::Validation(format!(
                "flipped tile {tile} is not an interior tile"
            )));
        }
    }
    let (white_caps, black_caps) = parse_capture_counts(parts[4]).ok_or(FenError::Invalid)?;
    board.set_captured(Color::White, white_caps);
    board.set_captured(Color::Black, black_caps);

    Ok(ParsedFen {
        board,
        turn,
        flipped,
        move_number: parts[5].parse::<u32>().map_err(|_| FenError::Invalid)?,
    })
}

pub fn encode_fen(board: &Board, turn: Color, flipped: Option<Pos>, move_number: u32) -> String {
    let mut tiles = Vec::new();
    for row in (0..board.rows() - 1).rev() {
        let line: String = (0..board.cols() - 1)
            .filter_map(|col| board.tile(Pos::new(col, row)))
            .map(|tile| tile.orientation().to_code())
            .collect();
        tiles.push(line);
    }

    let mut stacks = Vec::new();
    for row in (0..board.rows()).rev() {
        let mut line = String::new();
        let mut empties = 0u32;
        for col in 0..board.cols() {
            match board.stack(Pos::new(col, row)) {
                Some(stack) if !stack.is_empty() => {
                    if empties > 0 {
                        line.push_str(&empties.to_string());
                        empties = 0;
                    }
                    encode_stack(stack, &mut line);
                }
                _ => empties += 1,
            }
        }
        if empties > 0 {
            line.push_str(&empties.to_string());
        }
        stacks.push(line);
    }

    format!(
        "{} {} {} {} {}/{} {}",
        tiles.join("/"),
        stacks.join("/"),
        turn.to_code(),
        flipped.map_or_else(|| "-".to_string(), |tile| tile.to_string()),
        board.captured_by(Color::White).len(),
        board.captured_by(Color::Black).len(),
        move_number
    )
}

fn encode_stack(stack: &Stack, out: &mut String) {
    if stack.height() == 1 {
        if let Some(piece) = stack.top() {
            out.push(piece.color.to_code());
        }
        return;
    }
    out.push('|');
    for (i, piece) in stack.iter().enumerate() {
        if i > 0 {
            out.push(':');
        }
        out.push(piece.color.to_code());
    }
    out.push('|');
}

fn stack_row_width(row: &str) -> Result<usize, FenError> {
    Ok(decode_stack_row(row)?.len())
}

fn decode_stack_row(row: &str) -> Result<Vec<Stack>, FenError> {
    let mut cells = Vec::new();
    let mut chars = row.chars().peekable();
    while let Some(ch) = chars.next() {
        if let Some(digit) = ch.to_digit(10) {
            let mut run = digit;
            while let Some(next) = chars.peek().and_then(|c| c.to_digit(10)) {
                run = run
                    .checked_mul(10)
                    .and_then(|run| run.checked_add(next))
                    .filter(|run| *run <= u32::from(MAX_BOARD_DIM))
                    .ok_or_else(|| FenError::Validation(format!("empty run too long in {row:?}")))?;
                chars.next();
            }
            if run == 0 {
                return Err(FenError::Validation(format!("empty run of zero in {row:?}")));
            }
            cells.extend((0..run).map(|_| Stack::new()));
        } else if ch == '|' {
            let mut pieces = Vec::new();
            loop {
                let code = chars.next().ok_or_else(|| {
                    FenError::Validation(format!("unterminated stack in {row:?}"))
                })?;
                let color = Color::from_code(code).ok_or_else(|| {
                    FenError::Validation(format!("unknown piece {code:?} in {row:?}"))
                })?;
                pieces.push(Piece::new(color));
                match chars.next() {
                    Some(':') => continue,
                    Some('|') => break,
                    _ => {
                        return Err(FenError::Validation(format!(
                            "malformed stack in {row:?}"
                        )))
                    }
                }
            }
            if pieces.len() > usize::from(MAX_STACK_HEIGHT) {
                return Err(FenError::Validation(format!("stack too tall in {row:?}")));
            }
            let stack = Stack::from_pieces(&pieces)
                .ok_or_else(|| FenError::Validation(format!("stack too tall in {row:?}")))?;
            if !stack.is_monochrome() {
                return Err(FenError::Validation(format!("mixed stack in {row:?}")));
            }
            cells.push(stack);
        } else {
            let color = Color::from_code(ch)
                .ok_or_else(|| FenError::Validation(format!("unknown piece {ch:?} in {row:?}")))?;
            cells.push(Stack::of(color, 1));
        }
        if cells.len() > usize::from(MAX_BOARD_DIM) {
            return Err(FenError::Validation(format!("stack row {row:?} is too wide")));
        }
    }
    Ok(cells)
}

fn parse_tile_pos(text: &str) -> Option<Pos> {
    let mut chars = text.chars();
    let col = chars.next()?;
    Pos::from_parts(&col.to_string(), chars.as_str())
}

fn parse_capture_counts(text: &str) -> Option<(usize, usize)> {
    let limit = MAX_CELLS * usize::from(MAX_STACK_HEIGHT);
    let (white, black) = text.split_once('/')?;
    let (white, black): (usize, usize) = (white.parse().ok()?, black.parse().ok()?);
    (white <= limit && black <= limit).then_some((white, black))
}
