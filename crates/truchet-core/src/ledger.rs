use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Piece, Pos, Transfer};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    #[error("a piece is already in hand")]
    HandFull,
    #[error("no piece in hand")]
    EmptyHand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    PickedUp,
    Dropped,
    SplitInProgress,
    MergeInProgress,
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// One piece lifted from `source`. `dest` stays empty while it is held.
    Transfer {
        source: Pos,
        dest: Option<Pos>,
        piece: Piece,
    },
    Flip {
        tile: Pos,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Step {
    pub index: usize,
    pub kind: StepKind,
    pub phase_before: Phase,
}

/// The atomic steps of the move being built. Undo walks it backwards one
/// step at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    steps: Vec<Step>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// The piece lifted but not yet dropped, and where it came from.
    pub fn in_hand(&self) -> Option<(Pos, Piece)> {
        match self.steps.last()?.kind {
            StepKind::Transfer {
                source,
                dest: None,
                piece,
            } => Some((source, piece)),
            _ => None,
        }
    }

    /// Completed transfers merged by source and destination, in first-seen
    /// order.
    pub fn transfers(&self) -> Vec<Transfer> {
        let mut out: Vec<Transfer> = Vec::new();
        for step in &self.steps {
            if let StepKind::Transfer {
                source,
                dest: Some(dest),
                ..
            } = step.kind
            {
                match out.iter_mut().find(|t| t.from == source && t.to == dest) {
                    Some(existing) => existing.count += 1,
                    None => out.push(Transfer {
                        from: source,
                        to: dest,
                        count: 1,
                    }),
                }
            }
        }
        out
    }

    pub(crate) fn record_pick(
        &mut self,
        source: Pos,
        piece: Piece,
        phase_before: Phase,
    ) -> Result<(), LedgerError> {
        if self.in_hand().is_some() {
            return Err(LedgerError::HandFull);
        }
        self.steps.push(Step {
            index: self.steps.len(),
            kind: StepKind::Transfer {
                source,
                dest: None,
                piece,
            },
            phase_before,
        });
        Ok(())
    }

    pub(crate) fn record_drop(&mut self, to: Pos) -> Result<(), LedgerError> {
        match self.steps.last_mut().map(|step| &mut step.kind) {
            Some(StepKind::Transfer { dest, .. }) if dest.is_none() => {
                *dest = Some(to);
                Ok(())
            }
            _ => Err(LedgerError::EmptyHand),
        }
    }

    pub(crate) fn record_flip(&mut self, tile: Pos, phase_before: Phase) {
        self.steps.push(Step {
            index: self.steps.len(),
            kind: StepKind::Flip { tile },
            phase_before,
        });
    }

    /// Clears the destination of the last step, putting its piece back in
    /// hand. Returns where it had been dropped.
    pub(crate) fn reopen_drop(&mut self) -> Option<Pos> {
        match self.steps.last_mut().map(|step| &mut step.kind) {
            Some(StepKind::Transfer { dest, .. }) => dest.take(),
            _ => None,
        }
    }

    pub(crate) fn pop(&mut self) -> Option<Step> {
        self.steps.pop()
    }

    pub(crate) fn take(&mut self) -> Vec<Step> {
        std::mem::take(&mut self.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    #[test]
    fn pick_drop_reopen() {
        let mut ledger = Ledger::new();
        let piece = Piece::new(Color::White);
        let from = Pos::new(1, 1);
        ledger.record_pick(from, piece, Phase::Idle).expect("hand empty");
        assert_eq!(ledger.in_hand(), Some((from, piece)));
        assert_eq!(
            ledger.record_pick(from, piece, Phase::PickedUp),
            Err(LedgerError::HandFull)
        );

        ledger.record_drop(Pos::new(1, 2)).expect("holding");
        assert_eq!(ledger.in_hand(), None);
        assert_eq!(ledger.record_drop(Pos::new(1, 2)), Err(LedgerError::EmptyHand));

        assert_eq!(ledger.reopen_drop(), Some(Pos::new(1, 2)));
        assert_eq!(ledger.in_hand(), Some((from, piece)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn transfers_aggregate() {
        let mut ledger = Ledger::new();
        let piece = Piece::new(Color::Black);
        let from = Pos::new(2, 2);
        for to in [Pos::new(2, 3), Pos::new(2, 3), Pos::new(3, 2)] {
            ledger.record_pick(from, piece, Phase::Idle).expect("hand empty");
            ledger.record_drop(to).expect("holding");
        }
        let merged = ledger.transfers();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].count, 2);
        assert_eq!(ledger.steps()[2].index, 2);
    }
}
