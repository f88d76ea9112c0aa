use tracing::trace;

use crate::board::Board;
use crate::types::Pos;

/// Visit marks that survive across searches. Each search takes a fresh
/// stamp, so nothing is cleared between them.
#[derive(Debug, Clone, Default)]
pub struct Sweeper {
    stamps: Vec<u32>,
    counter: u32,
}

impl Sweeper {
    pub fn new(board: &Board) -> Self {
        Self {
            stamps: vec![0; board.cell_count()],
            counter: 0,
        }
    }

    pub(crate) fn begin(&mut self, board: &Board) {
        if self.stamps.len() != board.cell_count() {
            self.stamps = vec![0; board.cell_count()];
            self.counter = 0;
        }
        self.counter = self.counter.wrapping_add(1);
        if self.counter == 0 {
            self.stamps.fill(0);
            self.counter = 1;
        }
    }

    /// Marks `pos` for the current search; false if it was already marked.
    pub(crate) fn visit(&mut self, board: &Board, pos: Pos) -> bool {
        match board.index(pos) {
            Some(idx) if self.stamps[idx] != self.counter => {
                self.stamps[idx] = self.counter;
                true
            }
            _ => false,
        }
    }
}

/// Empty cells the stack at `origin` can slide to.
///
/// The river is walked depth first through empty cells only. The origin's
/// own occupancy is ignored, and it is never a destination.
pub fn reachable(board: &Board, origin: Pos, sweep: &mut Sweeper) -> Vec<Pos> {
    let mut found = Vec::new();
    if !board.contains(origin) {
        return found;
    }
    sweep.begin(board);
    sweep.visit(board, origin);
    let mut frontier = vec![origin];
    while let Some(pos) = frontier.pop() {
        for next in board.river_neighbors(pos) {
            if board.is_vacant(next) && sweep.visit(board, next) {
                found.push(next);
                frontier.push(next);
            }
        }
    }
    found.sort_unstable();
    trace!(%origin, count = found.len(), "river reach");
    found
}

/// Every cell joined to `start` by water, occupied or not, `start` included.
pub(crate) fn region_members(board: &Board, start: Pos, sweep: &mut Sweeper) -> Vec<Pos> {
    sweep.begin(board);
    if !sweep.visit(board, start) {
        return Vec::new();
    }
    let mut members = vec![start];
    let mut frontier = vec![start];
    while let Some(pos) = frontier.pop() {
        for next in board.river_neighbors(pos) {
            if sweep.visit(board, next) {
                members.push(next);
                frontier.push(next);
            }
        }
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Stack;
    use crate::tile::Orientation;
    use crate::types::Color;

    #[test]
    fn empty_rising_board_runs_along_diagonal() {
        let board = Board::empty(4, 4).expect("valid size");
        let mut sweep = Sweeper::new(&board);
        // Border tiles alternate, so from A1 the water only rises through B2.
        let found = reachable(&board, Pos::new(0, 0), &mut sweep);
        assert!(found.contains(&Pos::new(1, 1)));
        assert!(!found.contains(&Pos::new(0, 0)));
    }

    #[test]
    fn occupied_cells_block_the_river() {
        let mut board =
            Board::with_orientations(5, 5, &[Orientation::Rising; 1]).expect("valid size");
        board
            .set_stack(Pos::new(1, 1), Stack::of(Color::Black, 1))
            .expect("on board");
        let mut sweep = Sweeper::new(&board);
        let found = reachable(&board, Pos::new(0, 0), &mut sweep);
        assert!(found.is_empty());
    }

    #[test]
    fn stamps_do_not_leak_between_searches() {
        let board = Board::empty(6, 6).expect("valid size");
        let mut sweep = Sweeper::new(&board);
        let first = reachable(&board, Pos::new(2, 2), &mut sweep);
        let second = reachable(&board, Pos::new(2, 2), &mut sweep);
        assert_eq!(first, second);
    }
}
