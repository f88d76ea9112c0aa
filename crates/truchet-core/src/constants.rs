/// Tallest stack a player may build with a merge.
pub const MAX_STACK_HEIGHT: u8 = 4;

/// Room for a stack while pieces are in flight and before captures resolve.
pub const STACK_CAPACITY: usize = 8;

pub const MIN_BOARD_DIM: u8 = 3;
pub const MAX_BOARD_DIM: u8 = 16;
pub const DEFAULT_BOARD_DIM: u8 = 8;
pub const DEFAULT_HOME_ROWS: u8 = 3;

/// Largest number of intersections any board can have.
pub const MAX_CELLS: usize = MAX_BOARD_DIM as usize * MAX_BOARD_DIM as usize;

/// Occupied enemy bases needed to win.
pub const BASES_TO_WIN: usize = 3;

/// Game ids hash into a seed below this modulus.
pub const GAME_ID_MODULUS: u64 = 100_000_000;

pub const KEYWORD_SLIDE: &str = "Move";
pub const KEYWORD_FLIP: &str = "Flip";
pub const KEYWORD_SPLIT: &str = "Split";
pub const KEYWORD_MERGE: &str = "Merge";
pub const KEYWORD_SLIDE_SPLIT: &str = "MoveSplit";
pub const KEYWORD_SLIDE_MERGE: &str = "MoveMerge";
