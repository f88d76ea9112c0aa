use std::fmt;

use thiserror::Error;

use crate::constants::{
    KEYWORD_FLIP, KEYWORD_MERGE, KEYWORD_SLIDE, KEYWORD_SLIDE_MERGE, KEYWORD_SLIDE_SPLIT,
    KEYWORD_SPLIT,
};
use crate::position::Position;
use crate::types::{Distribution, Move, Pos};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("empty move text")]
    Empty,
    #[error("unknown move keyword {0:?}")]
    UnknownKeyword(String),
    #[error("{keyword} takes {expected} fields, found {found}")]
    FieldCount {
        keyword: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("bad coordinate {0:?}")]
    BadCoordinate(String),
    #[error("bad direction string {0:?}")]
    BadDirections(String),
    #[error("illegal move")]
    Illegal,
}

/// Text form of a move: a keyword, space-separated coordinates as column
/// letter and 1-based row, then a direction string for splits and merges.
///
/// `Move A 1 B 2`, `Flip D 4`, `Split C 3 NNSE`, `Merge C 3 WE`,
/// `MoveSplit A 1 C 3 NE`, `MoveMerge A 1 C 3 C 4 SW`.
pub fn move_to_text(mv: &Move) -> String {
    fn coord(pos: Pos) -> String {
        format!("{} {}", pos.col_letter(), u16::from(pos.row) + 1)
    }
    match *mv {
        Move::Slide { from, to } => format!("{KEYWORD_SLIDE} {} {}", coord(from), coord(to)),
        Move::Flip { tile } => format!("{KEYWORD_FLIP} {}", coord(tile)),
        Move::Split {
            focus,
            distribution,
        } => format!("{KEYWORD_SPLIT} {} {distribution}", coord(focus)),
        Move::Merge { focus, sources } => format!("{KEYWORD_MERGE} {} {sources}", coord(focus)),
        Move::SlideSplit {
            from,
            focus,
            distribution,
        } => format!(
            "{KEYWORD_SLIDE_SPLIT} {} {} {distribution}",
            coord(from),
            coord(focus)
        ),
        Move::SlideMerge {
            from,
            via,
            focus,
            sources,
        } => format!(
            "{KEYWORD_SLIDE_MERGE} {} {} {} {sources}",
            coord(from),
            coord(via),
            coord(focus)
        ),
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&move_to_text(self))
    }
}

/// Reads move text without consulting any position. Direction letters may
/// come in any order.
pub fn parse_move_text(text: &str) -> Result<Move, NotationError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    let (&keyword, args) = fields.split_first().ok_or(NotationError::Empty)?;

    let (name, expected) = match keyword {
        k if k.eq_ignore_ascii_case(KEYWORD_SLIDE) => (KEYWORD_SLIDE, 4),
        k if k.eq_ignore_ascii_case(KEYWORD_FLIP) => (KEYWORD_FLIP, 2),
        k if k.eq_ignore_ascii_case(KEYWORD_SPLIT) => (KEYWORD_SPLIT, 3),
        k if k.eq_ignore_ascii_case(KEYWORD_MERGE) => (KEYWORD_MERGE, 3),
        k if k.eq_ignore_ascii_case(KEYWORD_SLIDE_SPLIT) => (KEYWORD_SLIDE_SPLIT, 5),
        k if k.eq_ignore_ascii_case(KEYWORD_SLIDE_MERGE) => (KEYWORD_SLIDE_MERGE, 7),
        other => return Err(NotationError::UnknownKeyword(other.to_string())),
    };
    if args.len() != expected {
        return Err(NotationError::FieldCount {
            keyword: name,
            expected,
            found: args.len(),
        });
    }

    let pos = |i: usize| -> Result<Pos, NotationError> {
        Pos::from_parts(args[i], args[i + 1])
            .ok_or_else(|| NotationError::BadCoordinate(format!("{} {}", args[i], args[i + 1])))
    };
    let dirs = |i: usize| -> Result<Distribution, NotationError> {
        Distribution::parse_letters(args[i])
            .ok_or_else(|| NotationError::BadDirections(args[i].to_string()))
    };

    let mv = match name {
        KEYWORD_SLIDE => Move::Slide {
            from: pos(0)?,
            to: pos(2)?,
        },
        KEYWORD_FLIP => Move::Flip { tile: pos(0)? },
        KEYWORD_SPLIT => Move::Split {
            focus: pos(0)?,
            distribution: dirs(2)?,
        },
        KEYWORD_MERGE => Move::Merge {
            focus: pos(0)?,
            sources: dirs(2)?,
        },
        KEYWORD_SLIDE_SPLIT => Move::SlideSplit {
            from: pos(0)?,
            focus: pos(2)?,
            distribution: dirs(4)?,
        },
        _ => Move::SlideMerge {
            from: pos(0)?,
            via: pos(2)?,
            focus: pos(4)?,
            sources: dirs(6)?,
        },
    };
    Ok(mv)
}

/// Parses `text` and matches it against the legal moves in `position`.
///
/// Merge text may list a donor direction once per piece or once per donor;
/// either form resolves to the legal merge using those donors.
pub fn parse_move(text: &str, position: &Position) -> Result<Move, NotationError> {
    let parsed = parse_move_text(text)?;
    let legal = position.moves();
    if legal.contains(&parsed) {
        return Ok(parsed);
    }
    legal
        .into_iter()
        .find(|candidate| same_donors(candidate, &parsed))
        .ok_or(NotationError::Illegal)
}

fn same_donors(candidate: &Move, parsed: &Move) -> bool {
    let donors = |d: Distribution| d.counts().map(|count| count > 0);
    match (*candidate, *parsed) {
        (
            Move::Merge { focus, sources },
            Move::Merge {
                focus: f,
                sources: s,
            },
        ) => focus == f && donors(sources) == donors(s),
        (
            Move::SlideMerge {
                from,
                via,
                focus,
                sources,
            },
            Move::SlideMerge {
                from: fr,
                via: v,
                focus: f,
                sources: s,
            },
        ) => from == fr && via == v && focus == f && donors(sources) == donors(s),
        _ => false,
    }
}
