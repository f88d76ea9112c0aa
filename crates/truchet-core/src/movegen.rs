use thiserror::Error;
use tracing::trace;

use crate::board::Board;
use crate::constants::{MAX_STACK_HEIGHT, STACK_CAPACITY};
use crate::river::{reachable, Sweeper};
use crate::types::{Color, Direction, Distribution, Move, MoveList, Pos, Transfer, Transfers};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MovegenError {
    #[error("split from {pos} needs at least two pieces, found {height}")]
    SplitTooShort { pos: Pos, height: u8 },
    #[error("merge target {0} is already held by the mover")]
    TargetHeldByMover(Pos),
    #[error("{0} is off the board")]
    OutOfBounds(Pos),
    #[error("move does not match the stack at {0}")]
    Mismatch(Pos),
}

/// Every way to spread `height` pieces from `focus` over its orthogonal
/// neighbours.
///
/// A neighbour can receive pieces when it exists and is not held by
/// `mover`. A leg onto a stack of height `D` carries at least `max(1, D)`
/// pieces. At least two legs are used and every piece leaves. `height` is
/// passed separately so a caller can count a piece already lifted off the
/// stack.
pub fn enumerate_splits(
    board: &Board,
    focus: Pos,
    mover: Color,
    height: u8,
) -> Result<Vec<Distribution>, MovegenError> {
    if !board.contains(focus) {
        return Err(MovegenError::OutOfBounds(focus));
    }
    if height < 2 {
        return Err(MovegenError::SplitTooShort { pos: focus, height });
    }

    let mut limits = [None; 4];
    for (slot, dir) in limits.iter_mut().zip(Direction::ORTHOGONAL) {
        *slot = board
            .neighbor(focus, dir)
            .filter(|next| board.owner(*next) != Some(mover))
            .map(|next| {
                let resident = board.height(next);
                LegLimit {
                    min: resident.max(1),
                    max: (STACK_CAPACITY as u8).saturating_sub(resident),
                }
            });
    }

    let mut out = Vec::new();
    collect_splits(&limits, 0, height, Distribution::EMPTY, &mut out);
    trace!(%focus, height, count = out.len(), "splits enumerated");
    Ok(out)
}

/// Every set of `mover`'s orthogonal neighbours that may pour into
/// `target`.
///
/// Donors move whole. At least two donors take part, together they bring
/// at least `max(1, D)` pieces where `D` is the target's height, and the
/// result is no taller than the stack limit. With `required` set, only sets
/// using the donor in that direction are returned.
pub fn enumerate_merges(
    board: &Board,
    target: Pos,
    mover: Color,
    required: Option<Direction>,
) -> Result<Vec<Distribution>, MovegenError> {
    if !board.contains(target) {
        return Err(MovegenError::OutOfBounds(target));
    }
    if board.owner(target) == Some(mover) {
        return Err(MovegenError::TargetHeldByMover(target));
    }

    let mut donors = [None; 4];
    for (slot, dir) in donors.iter_mut().zip(Direction::ORTHOGONAL) {
        *slot = board
            .neighbor(target, dir)
            .filter(|next| board.owner(*next) == Some(mover))
            .map(|next| board.height(next));
    }

    let search = MergeSearch {
        donors,
        resident: board.height(target),
        required,
    };
    let mut out = Vec::new();
    search.collect(0, 0, Distribution::EMPTY, &mut out);
    Ok(out)
}

/// All moves for `mover`, in a fixed order: flips, slides, splits, merges,
/// slide-then-split, slide-then-merge.
///
/// A flip is offered only if `may_flip` and the mover still has a movement
/// afterwards.
pub fn generate_moves(board: &Board, mover: Color, may_flip: bool) -> MoveList {
    let mut moves = MoveList::new();
    if may_flip {
        for tile in board.flippable_tiles() {
            let mut flipped = board.clone();
            if flipped.flip_tile(tile).is_ok() && has_movement(&flipped, mover) {
                moves.push(Move::Flip { tile });
            }
        }
    }
    moves.extend(generate_movements(board, mover));
    trace!(mover = ?mover, count = moves.len(), "moves generated");
    moves
}

pub fn generate_movements(board: &Board, mover: Color) -> MoveList {
    let origins: Vec<Pos> = board
        .positions()
        .filter(|pos| board.owner(*pos) == Some(mover))
        .collect();

    let mut sweep = Sweeper::new(board);
    let mut slides = Vec::new();
    for &from in &origins {
        for to in reachable(board, from, &mut sweep) {
            slides.push((from, to));
        }
    }

    let mut moves: MoveList = slides
        .iter()
        .map(|&(from, to)| Move::Slide { from, to })
        .collect();

    for &focus in &origins {
        let height = board.height(focus);
        if height < 2 {
            continue;
        }
        if let Ok(found) = enumerate_splits(board, focus, mover, height) {
            moves.extend(
                found
                    .into_iter()
                    .map(|distribution| Move::Split { focus, distribution }),
            );
        }
    }

    for focus in board.positions() {
        if let Ok(found) = enumerate_merges(board, focus, mover, None) {
            moves.extend(found.into_iter().map(|sources| Move::Merge { focus, sources }));
        }
    }

    let mut combos = Vec::new();
    let mut scratch = board.clone();
    for &(from, via) in &slides {
        if scratch.move_stack(from, via).is_err() {
            continue;
        }
        let height = scratch.height(via);
        if height >= 2 {
            if let Ok(found) = enumerate_splits(&scratch, via, mover, height) {
                combos.extend(found.into_iter().map(|distribution| Move::SlideSplit {
                    from,
                    focus: via,
                    distribution,
                }));
            }
        }
        for dir in Direction::ORTHOGONAL {
            let Some(focus) = scratch.neighbor(via, dir) else {
                continue;
            };
            if let Ok(found) = enumerate_merges(&scratch, focus, mover, Some(dir.opposite())) {
                combos.extend(found.into_iter().map(|sources| Move::SlideMerge {
                    from,
                    via,
                    focus,
                    sources,
                }));
            }
        }
        if scratch.move_stack(via, from).is_err() {
            scratch = board.clone();
        }
    }
    combos.sort_by_key(|mv| !matches!(mv, Move::SlideSplit { .. }));
    moves.extend(combos);
    moves
}

pub fn has_movement(board: &Board, mover: Color) -> bool {
    let mut sweep = Sweeper::new(board);
    let positions: Vec<Pos> = board.positions().collect();
    positions.into_iter().any(|pos| {
        if board.owner(pos) == Some(mover) {
            !reachable(board, pos, &mut sweep).is_empty()
                || enumerate_splits(board, pos, mover, board.height(pos))
                    .is_ok_and(|found| !found.is_empty())
        } else {
            enumerate_merges(board, pos, mover, None).is_ok_and(|found| !found.is_empty())
        }
    })
}

/// Breaks a move into aggregated piece transfers, checking that it fits
/// the stacks on `board`.
pub fn transfers(board: &Board, mv: &Move) -> Result<Transfers, MovegenError> {
    let mut out = Transfers::new();
    match *mv {
        Move::Flip { tile } => {
            if !board.is_tile_active(tile) {
                return Err(MovegenError::OutOfBounds(tile));
            }
        }
        Move::Slide { from, to } => {
            let count = slide_height(board, from, to)?;
            out.push(Transfer { from, to, count });
        }
        Move::Split {
            focus,
            distribution,
        } => {
            if distribution.total() != u16::from(board.height(focus)) {
                return Err(MovegenError::Mismatch(focus));
            }
            split_legs(board, focus, distribution, &mut out)?;
        }
        Move::Merge { focus, sources } => {
            merge_legs(board, focus, sources, None, &mut out)?;
        }
        Move::SlideSplit {
            from,
            focus,
            distribution,
        } => {
            let count = slide_height(board, from, focus)?;
            if distribution.total() != u16::from(count) {
                return Err(MovegenError::Mismatch(focus));
            }
            out.push(Transfer {
                from,
                to: focus,
                count,
            });
            split_legs(board, focus, distribution, &mut out)?;
        }
        Move::SlideMerge {
            from,
            via,
            focus,
            sources,
        } => {
            let count = slide_height(board, from, via)?;
            let side = Direction::ORTHOGONAL
                .into_iter()
                .find(|dir| board.neighbor(focus, *dir) == Some(via))
                .ok_or(MovegenError::Mismatch(via))?;
            out.push(Transfer {
                from,
                to: via,
                count,
            });
            merge_legs(board, focus, sources, Some((side, count)), &mut out)?;
        }
    }
    Ok(out)
}

fn slide_height(board: &Board, from: Pos, to: Pos) -> Result<u8, MovegenError> {
    if !board.contains(from) {
        return Err(MovegenError::OutOfBounds(from));
    }
    if !board.contains(to) {
        return Err(MovegenError::OutOfBounds(to));
    }
    match board.height(from) {
        0 => Err(MovegenError::Mismatch(from)),
        _ if !board.is_vacant(to) => Err(MovegenError::Mismatch(to)),
        height => Ok(height),
    }
}

fn split_legs(
    board: &Board,
    focus: Pos,
    distribution: Distribution,
    out: &mut Transfers,
) -> Result<(), MovegenError> {
    for (dir, count) in distribution.iter() {
        let to = board
            .neighbor(focus, dir)
            .ok_or(MovegenError::Mismatch(focus))?;
        out.push(Transfer {
            from: focus,
            to,
            count,
        });
    }
    Ok(())
}

/// `arrived` stands in for a donor that is still travelling: the side it
/// will occupy and the height it will have.
fn merge_legs(
    board: &Board,
    focus: Pos,
    sources: Distribution,
    arrived: Option<(Direction, u8)>,
    out: &mut Transfers,
) -> Result<(), MovegenError> {
    if !board.contains(focus) {
        return Err(MovegenError::OutOfBounds(focus));
    }
    for (dir, count) in sources.iter() {
        let donor = board
            .neighbor(focus, dir)
            .ok_or(MovegenError::Mismatch(focus))?;
        let expected = match arrived {
            Some((side, height)) if side == dir => height,
            _ => board.height(donor),
        };
        if count != expected {
            return Err(MovegenError::Mismatch(donor));
        }
        out.push(Transfer {
            from: donor,
            to: focus,
            count,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct LegLimit {
    min: u8,
    max: u8,
}

fn collect_splits(
    limits: &[Option<LegLimit>; 4],
    idx: usize,
    remaining: u8,
    current: Distribution,
    out: &mut Vec<Distribution>,
) {
    if remaining == 0 {
        if current.legs() >= 2 {
            out.push(current);
        }
        return;
    }
    if idx == limits.len() {
        return;
    }
    collect_splits(limits, idx + 1, remaining, current, out);
    if let Some(limit) = limits[idx] {
        let dir = Direction::ORTHOGONAL[idx];
        for count in limit.min..=remaining.min(limit.max) {
            collect_splits(
                limits,
                idx + 1,
                remaining - count,
                current.with(dir, count),
                out,
            );
        }
    }
}

struct MergeSearch {
    donors: [Option<u8>; 4],
    resident: u8,
    required: Option<Direction>,
}

impl MergeSearch {
    fn collect(&self, idx: usize, arriving: u8, current: Distribution, out: &mut Vec<Distribution>) {
        if idx == self.donors.len() {
            if self.accepts(arriving, current) {
                out.push(current);
            }
            return;
        }
        self.collect(idx + 1, arriving, current, out);
        if let Some(height) = self.donors[idx] {
            let total = arriving + height;
            if total + self.resident <= MAX_STACK_HEIGHT {
                let dir = Direction::ORTHOGONAL[idx];
                self.collect(idx + 1, total, current.with(dir, height), out);
            }
        }
    }

    fn accepts(&self, arriving: u8, current: Distribution) -> bool {
        current.legs() >= 2
            && arriving >= self.resident.max(1)
            && self.required.map_or(true, |dir| current.count(dir) > 0)
    }
}
