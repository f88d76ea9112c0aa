use std::collections::{HashSet, VecDeque};

use truchet_core::{
    Board, BoardConfig, Color, Direction, EdgeColor, Orientation, Pos, Stack, Sweeper,
};

fn standard(seed: u64) -> Board {
    Board::new(&BoardConfig::default().with_seed(seed)).expect("default config is valid")
}

/// Region size by plain breadth-first search, independent of the cached
/// labels.
fn naive_region(board: &Board, start: Pos) -> usize {
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(pos) = queue.pop_front() {
        for dir in Direction::DIAGONAL {
            if board.connects(pos, dir) {
                let next = board.neighbor(pos, dir).expect("connected step stays on board");
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }
    seen.len()
}

#[test]
fn starting_layout_counts() {
    let board = standard(7);
    assert_eq!(board.cols(), 8);
    assert_eq!(board.rows(), 8);
    assert_eq!(board.pieces_on_board(Color::White), 12);
    assert_eq!(board.pieces_on_board(Color::Black), 12);
    assert!(board.captured_by(Color::White).is_empty());

    for pos in board.positions() {
        let stack = board.stack(pos).expect("on board");
        assert!(stack.height() <= 1);
    }
    assert_eq!(board.owner(Pos::new(0, 0)), Some(Color::Black));
    assert_eq!(board.owner(Pos::new(1, 1)), Some(Color::Black));
    assert_eq!(board.owner(Pos::new(0, 7)), Some(Color::White));
    assert_eq!(board.owner(Pos::new(1, 6)), Some(Color::White));
    assert!(board.is_vacant(Pos::new(1, 0)));
    assert!(board.is_vacant(Pos::new(3, 3)));
}

#[test]
fn bases_sit_on_each_home_row() {
    let board = standard(0);
    let black: Vec<Pos> = board.bases(Color::Black).collect();
    let white: Vec<Pos> = board.bases(Color::White).collect();
    assert_eq!(black.len(), 4);
    assert_eq!(white.len(), 4);
    assert!(black.iter().all(|pos| pos.row == 0));
    assert!(white.iter().all(|pos| pos.row == 7));
    assert_eq!(board.bases_occupied_against(Color::Black), 0);
}

#[test]
fn same_seed_same_board() {
    assert_eq!(standard(12345), standard(12345));
    let seeded = Board::new(&BoardConfig::for_game_id("match-17")).expect("valid config");
    let again = Board::new(&BoardConfig::for_game_id("match-17")).expect("valid config");
    assert_eq!(seeded, again);
}

#[test]
fn border_tiles_are_fixed_and_alternate() {
    let board = standard(3);
    for tile in board.positions().filter(|pos| board.is_tile_active(*pos)) {
        let t = board.tile(tile).expect("active");
        let border = tile.col == 0 || tile.row == 0 || tile.col == 6 || tile.row == 6;
        assert_eq!(t.is_fixed(), border, "tile {tile}");
        if border {
            let expected = if (tile.col + tile.row) % 2 == 0 {
                Orientation::Rising
            } else {
                Orientation::Falling
            };
            assert_eq!(t.orientation(), expected, "tile {tile}");
        }
    }
    assert!(board.tile(Pos::new(7, 0)).is_none());
    assert!(board.tile(Pos::new(0, 7)).is_none());
}

#[test]
fn river_connection_is_symmetric() {
    for seed in 0..8 {
        let board = standard(seed);
        for pos in board.positions() {
            for dir in Direction::ALL {
                if board.connects(pos, dir) {
                    let next = board.neighbor(pos, dir).expect("on board");
                    assert!(board.connects(next, dir.opposite()), "{pos} {dir:?}");
                }
                if dir.is_orthogonal() {
                    assert!(!board.connects(pos, dir));
                }
            }
        }
    }
}

#[test]
fn isolated_pair_reaches_both_ways() {
    let mut board = Board::empty(6, 6).expect("valid size");
    let a = Pos::new(2, 2);
    let b = Pos::new(3, 3);
    assert!(board.connects(a, Direction::NE));
    board.set_stack(a, Stack::of(Color::White, 1)).expect("on board");
    let mut sweep = Sweeper::new(&board);
    assert!(truchet_core::reachable(&board, a, &mut sweep).contains(&b));

    board.set_stack(a, Stack::new()).expect("on board");
    board.set_stack(b, Stack::of(Color::White, 1)).expect("on board");
    assert!(truchet_core::reachable(&board, b, &mut sweep).contains(&a));
}

#[test]
fn reachable_has_no_duplicates_and_only_empty_cells() {
    let board = standard(99);
    let mut sweep = Sweeper::new(&board);
    for origin in board.positions() {
        let found = truchet_core::reachable(&board, origin, &mut sweep);
        let unique: HashSet<Pos> = found.iter().copied().collect();
        assert_eq!(unique.len(), found.len());
        assert!(found.iter().all(|pos| board.is_vacant(*pos)));
        assert!(!found.contains(&origin));
    }
}

#[test]
fn region_labels_match_naive_search() {
    for seed in [0, 1, 2, 42, 777] {
        let board = standard(seed);
        for pos in board.positions() {
            assert_eq!(
                board.region_size(pos).map(usize::from),
                Some(naive_region(&board, pos)),
                "seed {seed} at {pos}"
            );
        }
        assert!(board.verify_regions().is_ok());
    }
}

#[test]
fn edge_colors_mirror_under_orientation() {
    let mut board = Board::empty(5, 5).expect("valid size");
    let tile = Pos::new(1, 1);
    let before = board.edge_colors(tile, Direction::S).expect("active tile");
    board
        .set_orientation(tile, Orientation::Falling)
        .expect("interior tile");
    let after = board.edge_colors(tile, Direction::S).expect("active tile");
    assert_eq!(before, (EdgeColor::Water, EdgeColor::Land));
    assert_eq!(after, (EdgeColor::Land, EdgeColor::Water));
    assert_eq!(board.edge_colors(Pos::new(4, 4), Direction::S), None);
}

#[test]
fn flippable_needs_empty_corners() {
    let mut board = Board::empty(6, 6).expect("valid size");
    let tile = Pos::new(2, 2);
    assert!(board.is_flippable(tile));
    board
        .set_stack(Pos::new(3, 3), Stack::of(Color::Black, 1))
        .expect("on board");
    assert!(!board.is_flippable(tile));
    assert!(!board.is_flippable(Pos::new(0, 0)));
    assert!(!board.is_flippable(Pos::new(5, 5)));
}

#[test]
fn occupied_neighbors_counts_orthogonals_only() {
    let mut board = Board::empty(5, 5).expect("valid size");
    let center = Pos::new(2, 2);
    for pos in [Pos::new(2, 3), Pos::new(1, 2), Pos::new(3, 3)] {
        board.set_stack(pos, Stack::of(Color::White, 1)).expect("on board");
    }
    assert_eq!(board.occupied_neighbors(center), 2);
    assert_eq!(board.occupied_neighbors(Pos::new(0, 0)), 0);
}

#[test]
fn config_round_trips_through_json() {
    let config = BoardConfig::default().with_seed(31).with_size(10, 9);
    let json = serde_json::to_string(&config).expect("serializes");
    let back: BoardConfig = serde_json::from_str(&json).expect("deserializes");
    assert_eq!(back, config);

    let partial: BoardConfig = serde_json::from_str(r#"{"seed": 5}"#).expect("defaults fill in");
    assert_eq!(partial, BoardConfig::default().with_seed(5));
}
