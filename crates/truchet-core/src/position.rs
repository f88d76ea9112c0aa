use thiserror::Error;
use tracing::{debug, trace};

use crate::board::{Board, BoardError, ConsistencyError};
use crate::config::{BoardConfig, ConfigError};
use crate::fen::{encode_fen, parse_fen, ParsedFen};
use crate::ledger::{Ledger, LedgerError, Phase, Step, StepKind};
use crate::movegen::{
    enumerate_merges, enumerate_splits, generate_moves, transfers, MovegenError,
};
use crate::river::{reachable, Sweeper};
use crate::types::{CaptureRecord, Color, Direction, Distribution, Move, MoveList, Piece, Pos};
use crate::zobrist::zobrist_keys;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("{0}")]
    Fen(String),
    #[error("board error: {0}")]
    Board(#[from] BoardError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Movegen(#[from] MovegenError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("internal inconsistency: {0}")]
    Inconsistent(#[from] ConsistencyError),
    #[error("a move is already being built")]
    MoveInProgress,
    #[error("a tile was already flipped this turn")]
    AlreadyFlipped,
    #[error("no step to undo")]
    EmptyLedger,
    #[error("no move to unmake")]
    EmptyHistory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub mv: Move,
    pub steps: Vec<Step>,
    pub captures: CaptureRecord,
    pub turn: Color,
    pub flipped: Option<Pos>,
    pub move_number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    board: Board,
    turn: Color,
    /// Tile flipped earlier in the current turn.
    flipped: Option<Pos>,
    phase: Phase,
    move_number: u32,
    ledger: Ledger,
    history: Vec<HistoryEntry>,
}

impl Default for Position {
    fn default() -> Self {
        Self::from_board(
            Board::new(&BoardConfig::default()).expect("default config is valid"),
            Color::White,
        )
    }
}

impl Position {
    pub fn new(config: &BoardConfig) -> Result<Self, PositionError> {
        Ok(Self::from_board(Board::new(config)?, Color::White))
    }

    pub fn from_board(board: Board, turn: Color) -> Self {
        Self {
            board,
            turn,
            flipped: None,
            phase: Phase::Idle,
            move_number: 1,
            ledger: Ledger::new(),
            history: Vec::new(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let parsed = parse_fen(fen).map_err(|err| PositionError::Fen(err.to_string()))?;
        Ok(Self::from_parsed(parsed))
    }

    fn from_parsed(parsed: ParsedFen) -> Self {
        let mut position = Self::from_board(parsed.board, parsed.turn);
        position.flipped = parsed.flipped;
        position.move_number = parsed.move_number;
        position
    }

    pub fn fen(&self) -> String {
        encode_fen(&self.board, self.turn, self.flipped, self.move_number)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn flipped(&self) -> Option<Pos> {
        self.flipped
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Completed turns plus one.
    pub fn move_number(&self) -> u32 {
        self.move_number
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn in_hand(&self) -> Option<(Pos, Piece)> {
        self.ledger.in_hand()
    }

    pub fn zobrist_hash(&self) -> u64 {
        zobrist_keys().hash_position(&self.board, self.turn, self.flipped)
    }

    /// Legal moves for the side to move. Empty while a move is being built.
    pub fn moves(&self) -> MoveList {
        if !self.ledger.is_empty() {
            return MoveList::new();
        }
        generate_moves(&self.board, self.turn, self.flipped.is_none())
    }

    pub fn slide_destinations(&self, from: Pos) -> Vec<Pos> {
        if self.board.owner(from) != Some(self.turn) {
            return Vec::new();
        }
        let mut sweep = Sweeper::new(&self.board);
        reachable(&self.board, from, &mut sweep)
    }

    /// Splits available from `focus`, counting a piece lifted from it and
    /// still in hand.
    pub fn split_moves_from(&self, focus: Pos) -> Vec<Distribution> {
        let lifted = matches!(self.in_hand(), Some((source, _)) if source == focus);
        let height = self.board.height(focus) + u8::from(lifted);
        let owned = lifted || self.board.owner(focus) == Some(self.turn);
        if !owned || height < 2 {
            return Vec::new();
        }
        enumerate_splits(&self.board, focus, self.turn, height).unwrap_or_default()
    }

    pub fn merge_moves_into(&self, target: Pos) -> Vec<Distribution> {
        enumerate_merges(&self.board, target, self.turn, None).unwrap_or_default()
    }

    /// Merges that use the stack at `donor`, as `(target, sources)` pairs.
    pub fn merge_moves_from(&self, donor: Pos) -> Vec<(Pos, Distribution)> {
        if self.board.owner(donor) != Some(self.turn) {
            return Vec::new();
        }
        let mut out = Vec::new();
        for dir in Direction::ORTHOGONAL {
            let Some(target) = self.board.neighbor(donor, dir) else {
                continue;
            };
            if let Ok(found) = enumerate_merges(&self.board, target, self.turn, Some(dir.opposite())) {
                out.extend(found.into_iter().map(|sources| (target, sources)));
            }
        }
        out
    }

    pub fn pick_up(&mut self, from: Pos) -> Result<Piece, PositionError> {
        if self.ledger.in_hand().is_some() {
            return Err(LedgerError::HandFull.into());
        }
        let piece = self.board.take_top(from)?;
        self.ledger.record_pick(from, piece, self.phase)?;
        self.phase = Phase::PickedUp;
        trace!(%from, "picked up");
        Ok(piece)
    }

    pub fn drop_piece(&mut self, to: Pos) -> Result<(), PositionError> {
        let (_, piece) = self.ledger.in_hand().ok_or(LedgerError::EmptyHand)?;
        self.board.place(to, piece)?;
        self.ledger.record_drop(to)?;
        self.phase = Phase::Dropped;
        trace!(%to, "dropped");
        Ok(())
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Reverses the most recent ledger step: a drop goes back into hand, a
    /// pick goes back onto its stack.
    pub fn undo_step(&mut self) -> Result<(), PositionError> {
        let step = *self.ledger.last().ok_or(PositionError::EmptyLedger)?;
        match step.kind {
            StepKind::Transfer {
                dest: Some(dest),
                piece,
                ..
            } => {
                let lifted = self.board.take_top(dest)?;
                if lifted.color != piece.color {
                    self.board.place(dest, lifted)?;
                    return Err(ConsistencyError::PieceMismatch {
                        pos: dest,
                        expected: piece.color,
                    }
                    .into());
                }
                self.ledger.reopen_drop();
                self.phase = Phase::PickedUp;
            }
            StepKind::Transfer {
                source,
                dest: None,
                piece,
            } => {
                self.board.place(source, piece)?;
                self.ledger.pop();
                self.phase = step.phase_before;
            }
            StepKind::Flip { tile } => {
                self.board.flip_tile(tile)?;
                self.ledger.pop();
                self.phase = step.phase_before;
            }
        }
        trace!(index = step.index, "step undone");
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), PositionError> {
        while !self.ledger.is_empty() {
            self.undo_step()?;
        }
        Ok(())
    }

    /// Applies a complete move and passes the turn, unless it is a flip.
    ///
    /// The move is checked against the stacks it names but not against the
    /// legal move list; callers that take outside input check that first.
    pub fn make_move(&mut self, mv: &Move) -> Result<(), PositionError> {
        if !self.ledger.is_empty() {
            return Err(PositionError::MoveInProgress);
        }
        if let Move::Flip { tile } = *mv {
            if self.flipped.is_some() {
                return Err(PositionError::AlreadyFlipped);
            }
            self.board.flip_tile(tile)?;
            self.ledger.record_flip(tile, self.phase);
            return self.commit(*mv);
        }

        let legs = transfers(&self.board, mv)?;
        let travels = matches!(
            mv,
            Move::Slide { .. } | Move::SlideSplit { .. } | Move::SlideMerge { .. }
        );
        let settled = if mv.is_split() {
            Phase::SplitInProgress
        } else if mv.is_merge() {
            Phase::MergeInProgress
        } else {
            Phase::Dropped
        };
        for (idx, leg) in legs.iter().enumerate() {
            for _ in 0..leg.count {
                if let Err(err) = self.carry(leg.from, leg.to) {
                    self.cancel()?;
                    return Err(err);
                }
            }
            self.phase = if travels && idx == 0 {
                Phase::Dropped
            } else {
                settled
            };
        }
        self.commit(*mv)
    }

    fn carry(&mut self, from: Pos, to: Pos) -> Result<(), PositionError> {
        self.pick_up(from)?;
        self.drop_piece(to)
    }

    /// Resolves captures for `mv`, records the ledger into history and
    /// passes the turn.
    pub(crate) fn commit(&mut self, mv: Move) -> Result<(), PositionError> {
        self.phase = Phase::Confirmed;
        let captures = self.resolve_move_captures(&mv)?;
        let steps = self.ledger.take();
        self.history.push(HistoryEntry {
            mv,
            steps,
            captures,
            turn: self.turn,
            flipped: self.flipped,
            move_number: self.move_number,
        });

        match mv {
            Move::Flip { tile } => self.flipped = Some(tile),
            _ => {
                self.flipped = None;
                self.turn = self.turn.opponent();
                self.move_number = self.move_number.saturating_add(1);
            }
        }
        self.phase = Phase::Idle;
        debug!(mv = ?mv, captured = captures.total(), "move committed");
        Ok(())
    }

    fn resolve_move_captures(&mut self, mv: &Move) -> Result<CaptureRecord, PositionError> {
        let mut record = CaptureRecord::default();
        match *mv {
            Move::Split {
                focus,
                distribution,
            }
            | Move::SlideSplit {
                focus,
                distribution,
                ..
            } => {
                for (idx, dir) in Direction::ORTHOGONAL.into_iter().enumerate() {
                    if distribution.count(dir) == 0 {
                        continue;
                    }
                    if let Some(target) = self.board.neighbor(focus, dir) {
                        record.by_direction[idx] = self.board.resolve_captures(target, self.turn)?;
                        if cfg!(debug_assertions) {
                            self.board.check_monochrome(target)?;
                        }
                    }
                }
            }
            Move::Merge { focus, .. } | Move::SlideMerge { focus, .. } => {
                record.at_focus = self.board.resolve_captures(focus, self.turn)?;
                if cfg!(debug_assertions) {
                    self.board.check_monochrome(focus)?;
                }
            }
            Move::Slide { .. } | Move::Flip { .. } => {}
        }
        Ok(record)
    }

    /// Restores the state before the last committed move, including its
    /// captures, flipped tile and turn.
    pub fn unmake_move(&mut self) -> Result<(), PositionError> {
        if !self.ledger.is_empty() {
            return Err(PositionError::MoveInProgress);
        }
        let entry = self.history.pop().ok_or(PositionError::EmptyHistory)?;
        self.restore_move_captures(&entry)?;

        for step in entry.steps.iter().rev() {
            match step.kind {
                StepKind::Transfer {
                    source,
                    dest: Some(dest),
                    piece,
                } => {
                    let lifted = self.board.take_top(dest)?;
                    if lifted.color != piece.color {
                        return Err(ConsistencyError::PieceMismatch {
                            pos: dest,
                            expected: piece.color,
                        }
                        .into());
                    }
                    self.board.place(source, lifted)?;
                }
                StepKind::Transfer {
                    source,
                    dest: None,
                    piece,
                } => self.board.place(source, piece)?,
                StepKind::Flip { tile } => self.board.flip_tile(tile)?,
            }
        }

        self.turn = entry.turn;
        self.flipped = entry.flipped;
        self.move_number = entry.move_number;
        self.phase = Phase::Idle;
        trace!(mv = ?entry.mv, "move unmade");
        Ok(())
    }

    fn restore_move_captures(&mut self, entry: &HistoryEntry) -> Result<(), PositionError> {
        let Some(focus) = entry.mv.focus() else {
            return Ok(());
        };
        if entry.mv.is_merge() {
            self.board
                .restore_captures(focus, entry.turn, entry.captures.at_focus)?;
            return Ok(());
        }
        for (idx, dir) in Direction::ORTHOGONAL.into_iter().enumerate() {
            let count = entry.captures.by_direction[idx];
            if count == 0 {
                continue;
            }
            let target = self
                .board
                .neighbor(focus, dir)
                .ok_or(BoardError::OutOfBounds(focus))?;
            self.board.restore_captures(target, entry.turn, count)?;
        }
        Ok(())
    }

    pub fn pieces_on_board(&self, color: Color) -> u16 {
        self.board.pieces_on_board(color)
    }

    pub fn occupied_neighbors(&self, pos: Pos) -> u8 {
        self.board.occupied_neighbors(pos)
    }

    pub fn region_size(&self, pos: Pos) -> Option<u16> {
        self.board.region_size(pos)
    }

    pub fn captured_by(&self, color: Color) -> usize {
        self.board.captured_by(color).len()
    }

    pub fn bases_occupied(&self, color: Color) -> usize {
        self.board.bases_occupied_against(color.opponent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Stack;

    fn position_with(stacks: &[(Pos, Color, u8)], turn: Color) -> Position {
        let mut board = Board::empty(6, 6).expect("valid size");
        for &(pos, color, height) in stacks {
            board
                .set_stack(pos, Stack::of(color, height))
                .expect("on board");
        }
        Position::from_board(board, turn)
    }

    #[test]
    fn pick_and_undo_restore_the_stack() {
        let from = Pos::new(2, 2);
        let mut position = position_with(&[(from, Color::White, 2)], Color::White);
        let before = position.clone();

        position.pick_up(from).expect("piece present");
        assert_eq!(position.phase(), Phase::PickedUp);
        position.drop_piece(Pos::new(2, 3)).expect("holding");
        assert_eq!(position.board().height(Pos::new(2, 3)), 1);

        position.undo_step().expect("drop recorded");
        assert_eq!(position.in_hand().map(|(src, _)| src), Some(from));
        position.undo_step().expect("pick recorded");
        assert_eq!(position, before);
        assert_eq!(position.undo_step(), Err(PositionError::EmptyLedger));
    }

    #[test]
    fn split_from_counts_piece_in_hand() {
        let from = Pos::new(2, 2);
        let mut position = position_with(&[(from, Color::White, 2)], Color::White);
        position.pick_up(from).expect("piece present");
        assert_eq!(position.split_moves_from(from).len(), 6);
    }

    #[test]
    fn unmake_without_history() {
        let mut position = Position::default();
        assert_eq!(position.unmake_move(), Err(PositionError::EmptyHistory));
    }

    #[test]
    fn flip_keeps_the_turn() {
        let mut position = position_with(&[(Pos::new(0, 0), Color::White, 2)], Color::White);
        let tile = Pos::new(2, 2);
        position.make_move(&Move::Flip { tile }).expect("interior tile");
        assert_eq!(position.turn(), Color::White);
        assert_eq!(position.flipped(), Some(tile));
        assert_eq!(
            position.make_move(&Move::Flip { tile: Pos::new(1, 1) }),
            Err(PositionError::AlreadyFlipped)
        );
        position.unmake_move().expect("flip recorded");
        assert_eq!(position.flipped(), None);
    }
}
