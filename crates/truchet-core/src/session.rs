use thiserror::Error;
use tracing::{debug, trace};

use crate::game::{GameError, Truchet, TurnReport};
use crate::ledger::{LedgerError, Phase};
use crate::movegen::transfers;
use crate::position::PositionError;
use crate::types::{Move, Pos, Transfer};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Position(#[from] PositionError),
    #[error("no legal move lifts a piece from {0}")]
    CannotPick(Pos),
    #[error("no legal move drops the piece in hand on {0}")]
    CannotDrop(Pos),
    #[error("the pieces moved so far do not form a complete move")]
    Incomplete,
    #[error("nothing to undo this turn")]
    NothingToUndo,
}

#[derive(Debug, Clone)]
struct Candidate {
    mv: Move,
    legs: Vec<Transfer>,
}

impl Candidate {
    fn leg(&self, from: Pos, to: Pos) -> u8 {
        self.legs
            .iter()
            .find(|t| t.from == from && t.to == to)
            .map_or(0, |t| t.count)
    }

    fn outflow(&self, from: Pos) -> u8 {
        self.legs
            .iter()
            .filter(|t| t.from == from)
            .map(|t| t.count)
            .sum()
    }

    /// Every transfer made so far fits inside this move.
    fn admits(&self, done: &[Transfer]) -> bool {
        done.iter().all(|t| self.leg(t.from, t.to) >= t.count)
    }

    fn matches_exactly(&self, done: &[Transfer]) -> bool {
        self.admits(done)
            && self.legs.iter().all(|leg| {
                done.iter()
                    .find(|t| t.from == leg.from && t.to == leg.to)
                    .is_some_and(|t| t.count == leg.count)
            })
    }
}

fn done_on(done: &[Transfer], from: Pos, to: Pos) -> u8 {
    done.iter()
        .find(|t| t.from == from && t.to == to)
        .map_or(0, |t| t.count)
}

fn done_from(done: &[Transfer], from: Pos) -> u8 {
    done.iter().filter(|t| t.from == from).map(|t| t.count).sum()
}

/// Builds a turn one piece at a time on top of a [`Truchet`] game.
///
/// Every pick and drop must keep the pieces moved so far inside at least
/// one legal move. A drop whose every matching move carries the whole stack
/// moves the rest of the stack along with it.
#[derive(Debug, Clone)]
pub struct Session {
    game: Truchet,
    candidates: Vec<Candidate>,
}

impl Session {
    pub fn new(game: Truchet) -> Self {
        let mut session = Self {
            game,
            candidates: Vec::new(),
        };
        session.refresh();
        session
    }

    pub fn game(&self) -> &Truchet {
        &self.game
    }

    pub fn into_game(self) -> Truchet {
        self.game
    }

    pub fn phase(&self) -> Phase {
        self.game.position().phase()
    }

    pub fn in_hand(&self) -> Option<Pos> {
        self.game.position().in_hand().map(|(source, _)| source)
    }

    fn refresh(&mut self) {
        let position = self.game.position();
        if !position.ledger().is_empty() {
            return;
        }
        let board = position.board();
        self.candidates = self
            .game
            .moves()
            .into_iter()
            .filter(|mv| !mv.is_flip())
            .filter_map(|mv| {
                transfers(board, &mv).ok().map(|legs| Candidate {
                    mv,
                    legs: legs.into_iter().collect(),
                })
            })
            .collect();
        trace!(count = self.candidates.len(), "session candidates");
    }

    fn done(&self) -> Vec<Transfer> {
        self.game.position().ledger().transfers()
    }

    fn consistent(&self) -> impl Iterator<Item = &Candidate> {
        let done = self.done();
        self.candidates
            .iter()
            .filter(move |candidate| candidate.admits(&done))
    }

    pub fn can_pick(&self, pos: Pos) -> bool {
        if self.in_hand().is_some() || self.game.is_game_over() {
            return false;
        }
        let done = self.done();
        self.consistent()
            .any(|candidate| candidate.outflow(pos) > done_from(&done, pos))
    }

    /// Cells the piece in hand may be dropped on, its own source excluded.
    pub fn legal_drop_targets(&self) -> Vec<Pos> {
        let Some(source) = self.in_hand() else {
            return Vec::new();
        };
        let done = self.done();
        let mut targets: Vec<Pos> = self
            .consistent()
            .flat_map(|candidate| candidate.legs.iter())
            .filter(|leg| leg.from == source)
            .filter(|leg| {
                self.consistent()
                    .any(|c| c.leg(source, leg.to) > done_on(&done, source, leg.to))
            })
            .map(|leg| leg.to)
            .collect();
        targets.sort_unstable();
        targets.dedup();
        targets
    }

    pub fn pick(&mut self, pos: Pos) -> Result<(), SessionError> {
        if !self.can_pick(pos) {
            return Err(SessionError::CannotPick(pos));
        }
        self.game.position_mut().pick_up(pos)?;
        Ok(())
    }

    /// Drops the piece in hand. Dropping it back on its source takes the
    /// pick back.
    pub fn drop(&mut self, pos: Pos) -> Result<(), SessionError> {
        let source = self
            .in_hand()
            .ok_or(PositionError::Ledger(LedgerError::EmptyHand))?;
        if pos == source {
            self.game.position_mut().undo_step()?;
            return Ok(());
        }
        if !self.legal_drop_targets().contains(&pos) {
            return Err(SessionError::CannotDrop(pos));
        }
        self.game.position_mut().drop_piece(pos)?;
        self.follow_whole_stack(source, pos)?;
        self.update_phase();
        Ok(())
    }

    /// Carries the rest of `source` to `to` when every matching move takes
    /// exactly that many more pieces along the same leg.
    fn follow_whole_stack(&mut self, source: Pos, to: Pos) -> Result<(), SessionError> {
        let done = self.done();
        let remaining = self.game.position().board().height(source);
        if remaining == 0 {
            return Ok(());
        }
        let needs: Vec<u8> = self
            .consistent()
            .map(|c| c.leg(source, to).saturating_sub(done_on(&done, source, to)))
            .collect();
        let Some(&first) = needs.first() else {
            return Ok(());
        };
        if first != remaining || needs.iter().any(|n| *n != first) {
            return Ok(());
        }
        for _ in 0..remaining {
            let position = self.game.position_mut();
            position.pick_up(source)?;
            position.drop_piece(to)?;
        }
        trace!(%source, %to, remaining, "carried the rest of the stack");
        Ok(())
    }

    fn update_phase(&mut self) {
        let (mut splits, mut merges, mut total) = (0usize, 0usize, 0usize);
        for candidate in self.consistent() {
            total += 1;
            splits += usize::from(candidate.mv.is_split());
            merges += usize::from(candidate.mv.is_merge());
        }
        let phase = if total > 0 && splits == total {
            Phase::SplitInProgress
        } else if total > 0 && merges == total {
            Phase::MergeInProgress
        } else {
            Phase::Dropped
        };
        self.game.position_mut().set_phase(phase);
    }

    pub fn complete_move(&self) -> Option<Move> {
        if self.in_hand().is_some() {
            return None;
        }
        let done = self.done();
        if done.is_empty() {
            return None;
        }
        self.candidates
            .iter()
            .find(|candidate| candidate.matches_exactly(&done))
            .map(|candidate| candidate.mv)
    }

    pub fn confirm(&mut self) -> Result<TurnReport, SessionError> {
        let mv = self.complete_move().ok_or(SessionError::Incomplete)?;
        let touched: Vec<Pos> = self
            .done()
            .iter()
            .flat_map(|t| [t.from, t.to])
            .collect();
        let mover = self.game.turn();
        self.game.position_mut().commit(mv)?;
        let report = self.game.finish_turn(mv, mover, touched);
        debug!(mv = %mv, "session move confirmed");
        self.refresh();
        Ok(report)
    }

    /// Flips `tile`, or flips it back if it is the tile flipped this turn.
    pub fn flip(&mut self, tile: Pos) -> Result<(), SessionError> {
        if !self.game.position().ledger().is_empty() {
            return Err(PositionError::MoveInProgress.into());
        }
        if self.game.position().flipped() == Some(tile) {
            self.game.undo()?;
        } else {
            self.game.play(&Move::Flip { tile })?;
        }
        self.refresh();
        Ok(())
    }

    /// Takes back the latest pick, drop or flip of this turn.
    pub fn undo_step(&mut self) -> Result<(), SessionError> {
        if !self.game.position().ledger().is_empty() {
            self.game.position_mut().undo_step()?;
            return Ok(());
        }
        if self.game.position().flipped().is_some() {
            self.game.undo()?;
            self.refresh();
            return Ok(());
        }
        Err(SessionError::NothingToUndo)
    }

    /// Puts every moved piece back; a flip made this turn stays.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        self.game.position_mut().cancel()?;
        Ok(())
    }
}
