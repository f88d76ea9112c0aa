//! Rules engine for Truchet, a two-player game on a board of reversible
//! river tiles.
//!
//! Stacks slide along the rivers the tiles draw, split into their
//! orthogonal neighbours or merge from them, and capture the enemy pieces
//! they bury. Every move is recorded step by step so it can be undone
//! exactly.

pub mod board;
pub mod capture;
pub mod config;
pub mod constants;
pub mod fen;
pub mod game;
pub mod ledger;
pub mod movegen;
pub mod notation;
pub mod position;
pub mod region;
pub mod river;
pub mod session;
pub mod tile;
pub mod types;
pub mod zobrist;

pub use board::{Board, BoardError, Cell, ConsistencyError, Stack};
pub use capture::buried_run;
pub use config::{seed_from_game_id, BoardConfig, ConfigError};
pub use constants::*;
pub use fen::{encode_fen, parse_fen, starting_fen, validate_fen, FenError, ParsedFen};
pub use game::{GameError, Outcome, Truchet, TurnReport, WinReason};
pub use ledger::{Ledger, LedgerError, Phase, Step, StepKind};
pub use movegen::{
    enumerate_merges, enumerate_splits, generate_moves, generate_movements, has_movement,
    transfers, MovegenError,
};
pub use notation::{move_to_text, parse_move, parse_move_text, NotationError};
pub use position::{HistoryEntry, Position, PositionError};
pub use river::{reachable, Sweeper};
pub use session::{Session, SessionError};
pub use tile::{EdgeColor, Orientation, Tile};
pub use types::{
    CaptureRecord, Color, Direction, Distribution, Move, MoveList, Piece, Pos, Transfer, Transfers,
};
pub use zobrist::{zobrist_keys, ZobristKeys};
