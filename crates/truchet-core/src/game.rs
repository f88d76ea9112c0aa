use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::board::Board;
use crate::config::BoardConfig;
use crate::constants::BASES_TO_WIN;
use crate::movegen::transfers;
use crate::notation::{parse_move, NotationError};
use crate::position::{HistoryEntry, Position, PositionError};
use crate::types::{Color, Direction, Move, MoveList, Pos};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WinReason {
    Annihilation,
    Bases,
    NoMoves,
    Resignation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outcome {
    pub winner: Color,
    pub reason: WinReason,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("the game is over")]
    GameOver,
    #[error("illegal move: {0}")]
    Illegal(Move),
    #[error(transparent)]
    Notation(#[from] NotationError),
    #[error(transparent)]
    Position(#[from] PositionError),
}

/// What one played move changed, for display and scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub mv: Move,
    pub mover: Color,
    /// Every cell a piece left or arrived at.
    pub affected: Vec<Pos>,
    /// Cells where captures happened and how many pieces each lost.
    pub captures: Vec<(Pos, u8)>,
    pub monochrome: bool,
    pub outcome: Option<Outcome>,
}

impl Position {
    /// `color` has emptied the board of enemy pieces or holds enough enemy
    /// bases.
    pub fn has_won(&self, color: Color) -> Option<WinReason> {
        if self.pieces_on_board(color.opponent()) == 0 && self.pieces_on_board(color) > 0 {
            Some(WinReason::Annihilation)
        } else if self.bases_occupied(color) >= BASES_TO_WIN {
            Some(WinReason::Bases)
        } else {
            None
        }
    }

    /// Result of the game as it stands with the side to move about to play.
    ///
    /// If both sides meet a winning condition at once, the side to move
    /// wins. A side to move without any legal move loses.
    pub fn outcome(&self) -> Option<Outcome> {
        let to_move = self.turn();
        let waiting = to_move.opponent();
        if let Some(reason) = self.has_won(to_move) {
            return Some(Outcome {
                winner: to_move,
                reason,
            });
        }
        if let Some(reason) = self.has_won(waiting) {
            return Some(Outcome {
                winner: waiting,
                reason,
            });
        }
        if self.moves().is_empty() {
            return Some(Outcome {
                winner: waiting,
                reason: WinReason::NoMoves,
            });
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truchet {
    position: Position,
    outcome: Option<Outcome>,
}

impl Default for Truchet {
    fn default() -> Self {
        Self::from_position(Position::default())
    }
}

impl Truchet {
    pub fn new(config: &BoardConfig) -> Result<Self, GameError> {
        Ok(Self::from_position(Position::new(config)?))
    }

    pub fn for_game_id(game_id: &str) -> Result<Self, GameError> {
        Self::new(&BoardConfig::for_game_id(game_id))
    }

    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        Ok(Self::from_position(Position::from_fen(fen)?))
    }

    pub fn from_position(position: Position) -> Self {
        let outcome = if position.ledger().is_empty() {
            position.outcome()
        } else {
            None
        };
        Self { position, outcome }
    }

    pub fn fen(&self) -> String {
        self.position.fen()
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub(crate) fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }

    pub fn board(&self) -> &Board {
        self.position.board()
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.position.history()
    }

    pub fn move_number(&self) -> u32 {
        self.position.move_number()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn moves(&self) -> MoveList {
        if self.is_game_over() {
            return MoveList::new();
        }
        self.position.moves()
    }

    pub fn play(&mut self, mv: &Move) -> Result<TurnReport, GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }
        if !self.position.moves().contains(mv) {
            warn!(mv = %mv, "rejected illegal move");
            return Err(GameError::Illegal(*mv));
        }
        self.apply_legal(mv)
    }

    pub fn play_text(&mut self, text: &str) -> Result<TurnReport, GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }
        let mv = parse_move(text, &self.position).inspect_err(|err| {
            warn!(text, error = %err, "rejected move text");
        })?;
        self.apply_legal(&mv)
    }

    fn apply_legal(&mut self, mv: &Move) -> Result<TurnReport, GameError> {
        let mover = self.position.turn();
        let legs = transfers(self.position.board(), mv).map_err(PositionError::from)?;
        self.position.make_move(mv)?;
        Ok(self.finish_turn(*mv, mover, legs.iter().flat_map(|t| [t.from, t.to])))
    }

    /// Builds the report for a move already applied to the position.
    pub(crate) fn finish_turn(
        &mut self,
        mv: Move,
        mover: Color,
        touched: impl IntoIterator<Item = Pos>,
    ) -> TurnReport {
        let mut affected: Vec<Pos> = touched.into_iter().collect();
        affected.sort_unstable();
        affected.dedup();

        let captures = self
            .position
            .history()
            .last()
            .map(capture_sites)
            .unwrap_or_default();
        let board = self.position.board();
        let monochrome = affected
            .iter()
            .filter_map(|pos| board.stack(*pos))
            .all(|stack| stack.is_monochrome());

        if !mv.is_flip() {
            self.outcome = self.position.outcome();
            if let Some(outcome) = self.outcome {
                debug!(winner = ?outcome.winner, reason = ?outcome.reason, "game over");
            }
        }

        TurnReport {
            mv,
            mover,
            affected,
            captures,
            monochrome,
            outcome: self.outcome,
        }
    }

    pub fn undo(&mut self) -> Result<(), GameError> {
        self.position.unmake_move()?;
        self.outcome = None;
        Ok(())
    }

    pub fn resign(&mut self, color: Color) -> Result<Outcome, GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }
        let outcome = Outcome {
            winner: color.opponent(),
            reason: WinReason::Resignation,
        };
        self.outcome = Some(outcome);
        debug!(loser = ?color, "resigned");
        Ok(outcome)
    }
}

fn capture_sites(entry: &HistoryEntry) -> Vec<(Pos, u8)> {
    let Some(focus) = entry.mv.focus() else {
        return Vec::new();
    };
    if entry.captures.at_focus > 0 {
        return vec![(focus, entry.captures.at_focus)];
    }
    Direction::ORTHOGONAL
        .into_iter()
        .zip(entry.captures.by_direction)
        .filter(|(_, count)| *count > 0)
        .filter_map(|(dir, count)| focus.offset(dir).map(|pos| (pos, count)))
        .collect()
}
