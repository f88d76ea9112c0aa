use tracing::trace;

use crate::board::{Board, BoardError, ConsistencyError, Stack};
use crate::types::{Color, Pos};

/// How many pieces capture resolution would strip from the bottom of
/// `stack`: the run of pieces, from the bottom up, whose colour differs
/// from the top piece.
pub fn buried_run(stack: &Stack) -> u8 {
    let Some(owner) = stack.owner() else {
        return 0;
    };
    stack.iter().take_while(|piece| piece.color != owner).count() as u8
}

impl Board {
    /// Strips buried enemy pieces from the bottom of the stack at `pos` into
    /// `capturer`'s pool. Returns how many were taken.
    pub(crate) fn resolve_captures(&mut self, pos: Pos, capturer: Color) -> Result<u8, BoardError> {
        let stack = self.stack(pos).ok_or(BoardError::OutOfBounds(pos))?;
        let count = buried_run(stack);
        for _ in 0..count {
            let piece = self.take_bottom(pos)?;
            self.push_capture(capturer, piece);
        }
        if count > 0 {
            trace!(%pos, count, capturer = ?capturer, "captured");
        }
        Ok(count)
    }

    /// Reverses [`Board::resolve_captures`]: the newest `count` pieces in the
    /// pool go back under the stack in their original order.
    pub(crate) fn restore_captures(
        &mut self,
        pos: Pos,
        capturer: Color,
        count: u8,
    ) -> Result<(), ConsistencyError> {
        let available = self.captured_by(capturer).len();
        if available < usize::from(count) {
            return Err(ConsistencyError::CapturePoolShort {
                pos,
                needed: count,
                available,
            });
        }
        for _ in 0..count {
            if let Some(piece) = self.pop_capture(capturer) {
                if self.put_bottom(pos, piece).is_err() {
                    return Err(ConsistencyError::CapturePoolShort {
                        pos,
                        needed: count,
                        available,
                    });
                }
            }
        }
        Ok(())
    }

    pub(crate) fn check_monochrome(&self, pos: Pos) -> Result<(), ConsistencyError> {
        match self.stack(pos) {
            Some(stack) if !stack.is_monochrome() => Err(ConsistencyError::MixedStack(pos)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Piece;

    fn stack(colors: &[Color]) -> Stack {
        let pieces: Vec<Piece> = colors.iter().copied().map(Piece::new).collect();
        Stack::from_pieces(&pieces).expect("fits")
    }

    #[test]
    fn buried_run_counts_from_bottom() {
        use Color::{Black as B, White as W};
        assert_eq!(buried_run(&stack(&[B, B, W, W])), 2);
        assert_eq!(buried_run(&stack(&[W, W])), 0);
        assert_eq!(buried_run(&Stack::new()), 0);
    }

    #[test]
    fn resolve_then_restore() {
        use Color::{Black as B, White as W};
        let mut board = Board::empty(4, 4).expect("valid size");
        let pos = Pos::new(1, 1);
        let before = stack(&[B, B, W, W]);
        board.set_stack(pos, before.clone()).expect("on board");

        let taken = board.resolve_captures(pos, W).expect("on board");
        assert_eq!(taken, 2);
        assert_eq!(board.stack(pos), Some(&stack(&[W, W])));
        assert_eq!(board.captured_by(W).len(), 2);
        assert_eq!(board.pieces_on_board(B), 0);
        assert!(board.check_monochrome(pos).is_ok());

        board.restore_captures(pos, W, taken).expect("pool holds them");
        assert_eq!(board.stack(pos), Some(&before));
        assert!(board.captured_by(W).is_empty());
    }

    #[test]
    fn restore_reports_short_pool() {
        let mut board = Board::empty(4, 4).expect("valid size");
        let err = board
            .restore_captures(Pos::new(0, 0), Color::Black, 1)
            .unwrap_err();
        assert!(matches!(err, ConsistencyError::CapturePoolShort { needed: 1, .. }));
    }
}
