use tracing::trace;

use crate::board::{Board, BoardError, ConsistencyError};
use crate::river::{region_members, Sweeper};
use crate::types::Pos;

impl Board {
    pub fn region_size(&self, pos: Pos) -> Option<u16> {
        self.cell(pos).and_then(|cell| cell.region_size())
    }

    /// Labels every cell with the size of its river region from scratch.
    pub(crate) fn recompute_regions(&mut self) {
        let positions: Vec<Pos> = self.positions().collect();
        for pos in &positions {
            self.set_region(*pos, None);
        }
        let mut sweep = Sweeper::new(self);
        for pos in positions {
            if self.region_size(pos).is_none() {
                self.label_region(pos, &mut sweep);
            }
        }
    }

    fn label_region(&mut self, start: Pos, sweep: &mut Sweeper) -> u16 {
        let members = region_members(self, start, sweep);
        let size = members.len() as u16;
        for pos in members {
            self.set_region(pos, Some(size));
        }
        size
    }

    /// Rotates an interior tile and relabels only the regions it touched.
    ///
    /// The regions of the four corners are cleared before the flip, then
    /// each corner still unlabelled afterwards is flooded again. Regions
    /// that never reach the tile keep their labels.
    pub(crate) fn flip_tile(&mut self, tile: Pos) -> Result<(), BoardError> {
        if !self.is_flippable(tile) {
            return Err(BoardError::NotFlippable(tile));
        }
        let corners = Board::tile_corners(tile);
        let mut sweep = Sweeper::new(self);
        for corner in corners {
            if self.region_size(corner).is_some() {
                for pos in region_members(self, corner, &mut sweep) {
                    self.set_region(pos, None);
                }
            }
        }
        self.flip_tile_orientation(tile)?;
        for corner in corners {
            if self.region_size(corner).is_none() {
                let size = self.label_region(corner, &mut sweep);
                trace!(%tile, %corner, size, "region relabelled");
            }
        }
        if cfg!(debug_assertions) {
            if let Err(err) = self.verify_regions() {
                panic!("region labels drifted after flipping {tile}: {err}");
            }
        }
        Ok(())
    }

    /// Compares every cached label against a fresh flood fill.
    pub fn verify_regions(&self) -> Result<(), ConsistencyError> {
        let mut sweep = Sweeper::new(self);
        for pos in self.positions() {
            let actual = region_members(self, pos, &mut sweep).len() as u16;
            let cached = self.region_size(pos);
            if cached != Some(actual) {
                return Err(ConsistencyError::RegionMismatch {
                    pos,
                    cached,
                    actual,
                });
            }
        }
        Ok(())
    }
}
