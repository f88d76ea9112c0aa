use std::fmt;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::constants::STACK_CAPACITY;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const ALL: [Self; 2] = [Self::White, Self::Black];

    pub const fn to_code(self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }

    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'w' => Some(Self::White),
            'b' => Some(Self::Black),
            _ => None,
        }
    }

    pub const fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
}

impl Piece {
    pub const fn new(color: Color) -> Self {
        Self { color }
    }
}

/// A piece intersection, 0-based from the south-west corner.
///
/// Rows grow northwards. In text a position is a column letter followed by a
/// 1-based row, so `Pos::new(2, 0)` reads as `C1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub col: u8,
    pub row: u8,
}

impl Pos {
    pub const fn new(col: u8, row: u8) -> Self {
        Self { col, row }
    }

    /// Steps one cell in `dir`. Only the lower bound is checked here; the
    /// board decides whether the result lies inside it.
    pub fn offset(self, dir: Direction) -> Option<Self> {
        let (dc, dr) = dir.delta();
        let col = self.col.checked_add_signed(dc)?;
        let row = self.row.checked_add_signed(dr)?;
        Some(Self { col, row })
    }

    pub const fn col_letter(self) -> char {
        (b'A' + self.col) as char
    }

    /// Parses the two whitespace-separated halves used in move text, e.g.
    /// `("C", "3")`.
    pub fn from_parts(col: &str, row: &str) -> Option<Self> {
        let mut chars = col.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        if chars.next().is_some() || !letter.is_ascii_uppercase() {
            return None;
        }
        let row: u8 = row.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Self::new(letter as u8 - b'A', row - 1))
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.col_letter(), u16::from(self.row) + 1)
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    N = 0,
    NE = 1,
    E = 2,
    SE = 3,
    S = 4,
    SW = 5,
    W = 6,
    NW = 7,
}

impl Direction {
    pub const ALL: [Self; 8] = [
        Self::N,
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
    ];

    /// Canonical order for distributions and direction strings.
    pub const ORTHOGONAL: [Self; 4] = [Self::N, Self::E, Self::S, Self::W];

    pub const DIAGONAL: [Self; 4] = [Self::NE, Self::SE, Self::SW, Self::NW];

    /// `(column delta, row delta)`.
    pub const fn delta(self) -> (i8, i8) {
        match self {
            Self::N => (0, 1),
            Self::NE => (1, 1),
            Self::E => (1, 0),
            Self::SE => (1, -1),
            Self::S => (0, -1),
            Self::SW => (-1, -1),
            Self::W => (-1, 0),
            Self::NW => (-1, 1),
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::N => Self::S,
            Self::NE => Self::SW,
            Self::E => Self::W,
            Self::SE => Self::NW,
            Self::S => Self::N,
            Self::SW => Self::NE,
            Self::W => Self::E,
            Self::NW => Self::SE,
        }
    }

    pub const fn is_orthogonal(self) -> bool {
        matches!(self, Self::N | Self::E | Self::S | Self::W)
    }

    pub const fn orthogonal_index(self) -> Option<usize> {
        match self {
            Self::N => Some(0),
            Self::E => Some(1),
            Self::S => Some(2),
            Self::W => Some(3),
            _ => None,
        }
    }

    pub const fn letter(self) -> Option<char> {
        match self {
            Self::N => Some('N'),
            Self::E => Some('E'),
            Self::S => Some('S'),
            Self::W => Some('W'),
            _ => None,
        }
    }

    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'N' => Some(Self::N),
            'E' => Some(Self::E),
            'S' => Some(Self::S),
            'W' => Some(Self::W),
            _ => None,
        }
    }
}

/// Piece counts per orthogonal direction, indexed N, E, S, W.
///
/// For a split this is how many pieces leave the focus towards each
/// neighbour. For a merge it is how many pieces arrive from each donor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Distribution {
    counts: [u8; 4],
}

impl Distribution {
    pub const EMPTY: Self = Self { counts: [0; 4] };

    pub const fn from_counts(counts: [u8; 4]) -> Self {
        Self { counts }
    }

    pub const fn counts(self) -> [u8; 4] {
        self.counts
    }

    pub fn count(self, dir: Direction) -> u8 {
        dir.orthogonal_index().map_or(0, |idx| self.counts[idx])
    }

    #[must_use]
    pub fn with(mut self, dir: Direction, count: u8) -> Self {
        if let Some(idx) = dir.orthogonal_index() {
            self.counts[idx] = count;
        }
        self
    }

    pub fn total(self) -> u16 {
        self.counts.iter().map(|count| u16::from(*count)).sum()
    }

    pub fn legs(self) -> usize {
        self.counts.iter().filter(|count| **count > 0).count()
    }

    pub fn iter(self) -> impl Iterator<Item = (Direction, u8)> {
        Direction::ORTHOGONAL
            .into_iter()
            .zip(self.counts)
            .filter(|(_, count)| *count > 0)
    }

    /// One letter per piece, grouped in N, E, S, W order: `[2, 1, 0, 1]`
    /// becomes `"NNEW"`.
    pub fn to_letters(self) -> String {
        let mut out = String::with_capacity(usize::from(self.total()));
        for (dir, count) in self.iter() {
            if let Some(letter) = dir.letter() {
                out.extend(std::iter::repeat(letter).take(usize::from(count)));
            }
        }
        out
    }

    /// Accepts letters in any order and either case. Returns `None` for an
    /// empty string, more letters than a stack can hold, or any character
    /// that is not N, E, S or W.
    pub fn parse_letters(text: &str) -> Option<Self> {
        if text.is_empty() || text.chars().count() > STACK_CAPACITY {
            return None;
        }
        let mut counts = [0u8; 4];
        for ch in text.chars() {
            let idx = Direction::from_letter(ch)?.orthogonal_index()?;
            counts[idx] = counts[idx].checked_add(1)?;
        }
        Some(Self { counts })
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_letters())
    }
}

/// Pieces removed by capture resolution at the end of one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CaptureRecord {
    /// Split moves: captures at the neighbour in each direction, N, E, S, W.
    pub by_direction: [u8; 4],
    pub at_focus: u8,
}

impl CaptureRecord {
    pub fn total(&self) -> u16 {
        self.by_direction
            .iter()
            .chain(std::iter::once(&self.at_focus))
            .map(|count| u16::from(*count))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    /// The whole stack at `from` travels along the river to the empty `to`.
    Slide { from: Pos, to: Pos },
    /// Half-turn: rotate one interior tile. A movement must follow.
    Flip { tile: Pos },
    Split {
        focus: Pos,
        distribution: Distribution,
    },
    Merge { focus: Pos, sources: Distribution },
    /// Slide to `focus`, then split the arrived stack from there.
    SlideSplit {
        from: Pos,
        focus: Pos,
        distribution: Distribution,
    },
    /// Slide to `via`, then merge into the orthogonal neighbour `focus` with
    /// the arrived stack as one of the donors.
    SlideMerge {
        from: Pos,
        via: Pos,
        focus: Pos,
        sources: Distribution,
    },
}

impl Move {
    pub const fn is_flip(&self) -> bool {
        matches!(self, Self::Flip { .. })
    }

    /// The cell where captures are resolved, if the move has one.
    pub const fn focus(&self) -> Option<Pos> {
        match *self {
            Self::Split { focus, .. }
            | Self::Merge { focus, .. }
            | Self::SlideSplit { focus, .. }
            | Self::SlideMerge { focus, .. } => Some(focus),
            Self::Slide { .. } | Self::Flip { .. } => None,
        }
    }

    pub const fn is_split(&self) -> bool {
        matches!(self, Self::Split { .. } | Self::SlideSplit { .. })
    }

    pub const fn is_merge(&self) -> bool {
        matches!(self, Self::Merge { .. } | Self::SlideMerge { .. })
    }
}

/// One aggregated leg of a move: `count` pieces travel from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transfer {
    pub from: Pos,
    pub to: Pos,
    pub count: u8,
}

pub type Transfers = ArrayVec<Transfer, 8>;

pub type MoveList = Vec<Move>;
