use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_BOARD_DIM, DEFAULT_HOME_ROWS, GAME_ID_MODULUS, MAX_BOARD_DIM, MIN_BOARD_DIM,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "board must be {min}..={max} cells per side, got {cols}x{rows}",
        min = MIN_BOARD_DIM,
        max = MAX_BOARD_DIM
    )]
    Size { cols: u8, rows: u8 },
    #[error("{home_rows} home rows per side do not fit on a board with {rows} rows")]
    HomeRows { home_rows: u8, rows: u8 },
}

/// Parameters for a fresh game. Deserializes with defaults for any missing
/// field, so `{}` is the standard 8x8 board with seed 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub cols: u8,
    pub rows: u8,
    pub home_rows: u8,
    /// Drives the orientation of every interior tile.
    pub seed: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            cols: DEFAULT_BOARD_DIM,
            rows: DEFAULT_BOARD_DIM,
            home_rows: DEFAULT_HOME_ROWS,
            seed: 0,
        }
    }
}

impl BoardConfig {
    pub fn for_game_id(game_id: &str) -> Self {
        Self::default().with_seed(seed_from_game_id(game_id))
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_size(mut self, cols: u8, rows: u8) -> Self {
        self.cols = cols;
        self.rows = rows;
        self
    }

    #[must_use]
    pub fn with_home_rows(mut self, home_rows: u8) -> Self {
        self.home_rows = home_rows;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_size(self.cols, self.rows)?;
        if self.home_rows == 0 || u16::from(self.home_rows) * 2 >= u16::from(self.rows) {
            return Err(ConfigError::HomeRows {
                home_rows: self.home_rows,
                rows: self.rows,
            });
        }
        Ok(())
    }
}

pub fn validate_size(cols: u8, rows: u8) -> Result<(), ConfigError> {
    let range = MIN_BOARD_DIM..=MAX_BOARD_DIM;
    if range.contains(&cols) && range.contains(&rows) {
        Ok(())
    } else {
        Err(ConfigError::Size { cols, rows })
    }
}

/// Folds a game id into a tile seed, two bits per character.
pub fn seed_from_game_id(game_id: &str) -> u64 {
    game_id.chars().fold(0u64, |seed, ch| {
        (seed * 4 + u64::from(u32::from(ch))) % GAME_ID_MODULUS
    })
}
