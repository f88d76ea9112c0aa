use serde::{Deserialize, Serialize};

use crate::types::Direction;

/// Which pair of opposite corners the water band joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// South-west to north-east.
    Rising,
    /// North-west to south-east.
    Falling,
}

impl Orientation {
    pub const fn flipped(self) -> Self {
        match self {
            Self::Rising => Self::Falling,
            Self::Falling => Self::Rising,
        }
    }

    pub const fn to_code(self) -> char {
        match self {
            Self::Rising => 'r',
            Self::Falling => 'f',
        }
    }

    pub const fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_lowercase() {
            'r' => Some(Self::Rising),
            'f' => Some(Self::Falling),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeColor {
    Land,
    Water,
}

/// A square tile whose south-west corner is the cell that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    orientation: Orientation,
    fixed: bool,
}

impl Tile {
    pub const fn new(orientation: Orientation, fixed: bool) -> Self {
        Self { orientation, fixed }
    }

    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Border tiles never flip.
    pub const fn is_fixed(&self) -> bool {
        self.fixed
    }

    #[must_use]
    pub const fn flipped(self) -> Self {
        Self {
            orientation: self.orientation.flipped(),
            fixed: self.fixed,
        }
    }

    /// Whether the band runs along the diagonal `dir` points at.
    pub const fn joins(&self, dir: Direction) -> bool {
        matches!(
            (self.orientation, dir),
            (Orientation::Rising, Direction::NE | Direction::SW)
                | (Orientation::Falling, Direction::NW | Direction::SE)
        )
    }

    /// Colours of the two halves of one side. North and south sides list the
    /// west half first; east and west sides list the south half first.
    pub const fn edge(&self, side: Direction) -> Option<(EdgeColor, EdgeColor)> {
        use EdgeColor::{Land, Water};
        let pair = match (self.orientation, side) {
            (Orientation::Rising, Direction::S | Direction::W) => (Water, Land),
            (Orientation::Rising, Direction::N | Direction::E) => (Land, Water),
            (Orientation::Falling, Direction::N | Direction::E) => (Water, Land),
            (Orientation::Falling, Direction::S | Direction::W) => (Land, Water),
            _ => return None,
        };
        Some(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_swaps_band() {
        let tile = Tile::new(Orientation::Rising, false);
        assert!(tile.joins(Direction::NE));
        assert!(!tile.joins(Direction::NW));
        let flipped = tile.flipped();
        assert!(flipped.joins(Direction::SE));
        assert!(!flipped.joins(Direction::SW));
        assert_eq!(flipped.flipped(), tile);
    }

    #[test]
    fn shared_edges_match_across_neighbours() {
        let rising = Tile::new(Orientation::Rising, false);
        let falling = Tile::new(Orientation::Falling, false);
        assert_eq!(rising.edge(Direction::E), falling.edge(Direction::W));
        assert_ne!(rising.edge(Direction::E), rising.edge(Direction::W));
        assert_eq!(rising.edge(Direction::N), falling.edge(Direction::S));
        assert_eq!(rising.edge(Direction::NE), None);
    }

    #[test]
    fn orientation_codes() {
        assert_eq!(Orientation::from_code('F'), Some(Orientation::Falling));
        assert_eq!(Orientation::Rising.to_code(), 'r');
        assert_eq!(Orientation::from_code('x'), None);
    }
}
