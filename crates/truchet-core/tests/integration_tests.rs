use truchet_core::{
    move_to_text, Board, BoardConfig, Color, Distribution, GameError, Move, NotationError,
    Outcome, Pos, Position, PositionError, Session, Stack, Truchet, WinReason,
};

fn small_config() -> BoardConfig {
    BoardConfig::default()
        .with_size(6, 6)
        .with_home_rows(2)
        .with_seed(3)
}

fn perft(position: &mut Position, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = position.moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0u64;
    for mv in moves {
        position.make_move(&mv).expect("apply move");
        nodes += perft(position, depth - 1);
        position.unmake_move().expect("unmake move");
    }
    nodes
}

fn perft_by_fen(fen: &str, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let position = Position::from_fen(fen).expect("valid fen");
    let moves = position.moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0u64;
    for mv in moves {
        let mut next = position.clone();
        next.make_move(&mv).expect("apply move");
        nodes += perft_by_fen(&next.fen(), depth - 1);
    }
    nodes
}

fn game_with(cols: u8, rows: u8, stacks: &[(Pos, Color, u8)], turn: Color) -> Truchet {
    let mut board = Board::empty(cols, rows).expect("valid size");
    for &(pos, color, height) in stacks {
        board
            .set_stack(pos, Stack::of(color, height))
            .expect("on board");
    }
    Truchet::from_position(Position::from_board(board, turn))
}

#[test]
fn perft_agrees_between_unmake_and_fen_replay() {
    let mut position = Position::new(&small_config()).expect("valid config");
    let fen = position.fen();
    let by_unmake = perft(&mut position, 2);
    assert_eq!(position.fen(), fen);
    assert_eq!(by_unmake, perft_by_fen(&fen, 2));
    assert!(by_unmake > 0);
}

#[test]
fn play_and_undo_a_few_moves() {
    let mut game = Truchet::new(&small_config()).expect("valid config");
    let start = game.fen();
    let mut fens = vec![start.clone()];
    for _ in 0..4 {
        let mv = game.moves().into_iter().find(|mv| !mv.is_flip()).expect("a movement");
        let mover = game.turn();
        let report = game.play(&mv).expect("legal move");
        assert_eq!(report.mv, mv);
        assert_eq!(report.mover, mover);
        assert_ne!(game.turn(), mover);
        assert!(report.monochrome);
        fens.push(game.fen());
    }
    assert_eq!(game.history().len(), 4);
    assert_eq!(game.move_number(), 5);

    fens.pop();
    while let Some(fen) = fens.pop() {
        game.undo().expect("history present");
        assert_eq!(game.fen(), fen);
    }
    assert_eq!(game.fen(), start);
}

#[test]
fn illegal_moves_are_rejected() {
    let mut game = Truchet::new(&small_config()).expect("valid config");
    let bogus = Move::Slide {
        from: Pos::new(3, 3),
        to: Pos::new(3, 4),
    };
    assert_eq!(game.play(&bogus), Err(GameError::Illegal(bogus)));
    assert_eq!(
        game.play_text("Teleport A 1"),
        Err(GameError::Notation(NotationError::UnknownKeyword(
            "Teleport".to_string()
        )))
    );
    assert_eq!(
        game.play_text("Move D 4 D 5"),
        Err(GameError::Notation(NotationError::Illegal))
    );
    assert!(game.history().is_empty());
}

#[test]
fn move_text_replays_every_legal_move() {
    let game = Truchet::new(&small_config()).expect("valid config");
    for mv in game.moves() {
        let mut copy = game.clone();
        let report = copy.play_text(&move_to_text(&mv)).expect("own text parses");
        assert_eq!(report.mv, mv);
    }
}

#[test]
fn merge_that_wipes_out_the_opponent_wins() {
    let focus = Pos::new(2, 3);
    let mut game = game_with(
        5,
        5,
        &[
            (focus, Color::Black, 1),
            (Pos::new(1, 3), Color::White, 1),
            (Pos::new(3, 3), Color::White, 1),
        ],
        Color::White,
    );
    let report = game.play_text("merge C 4 EEWW").expect("same donors");
    assert_eq!(
        report.mv,
        Move::Merge {
            focus,
            sources: Distribution::parse_letters("EW").expect("letters"),
        }
    );
    assert_eq!(report.captures, vec![(focus, 1)]);
    assert!(report.monochrome);
    assert_eq!(
        report.outcome,
        Some(Outcome {
            winner: Color::White,
            reason: WinReason::Annihilation
        })
    );
    assert!(game.is_game_over());
    assert_eq!(game.play_text("Flip C 3"), Err(GameError::GameOver));

    game.undo().expect("history present");
    assert_eq!(game.outcome(), None);
    assert_eq!(game.board().owner(focus), Some(Color::Black));
}

#[test]
fn three_bases_win() {
    let game = game_with(
        5,
        5,
        &[
            (Pos::new(0, 0), Color::White, 1),
            (Pos::new(2, 0), Color::White, 1),
            (Pos::new(4, 0), Color::White, 1),
            (Pos::new(2, 4), Color::Black, 1),
        ],
        Color::Black,
    );
    assert_eq!(
        game.outcome(),
        Some(Outcome {
            winner: Color::White,
            reason: WinReason::Bases
        })
    );
}

#[test]
fn side_without_moves_loses() {
    let game = game_with(
        5,
        5,
        &[
            (Pos::new(0, 0), Color::Black, 1),
            (Pos::new(1, 1), Color::White, 1),
        ],
        Color::Black,
    );
    assert!(game.position().moves().is_empty());
    assert_eq!(
        game.outcome(),
        Some(Outcome {
            winner: Color::White,
            reason: WinReason::NoMoves
        })
    );
}

#[test]
fn flip_keeps_the_turn_and_blocks_a_second_flip() {
    let mut game = Truchet::new(&small_config()).expect("valid config");
    let flip = game
        .moves()
        .into_iter()
        .find(Move::is_flip)
        .expect("a flippable tile");
    game.play(&flip).expect("legal flip");
    assert_eq!(game.turn(), Color::White);
    assert_eq!(game.move_number(), 1);
    assert!(game.moves().iter().all(|mv| !mv.is_flip()));
    assert!(matches!(game.play(&flip), Err(GameError::Illegal(_))));
}

#[test]
fn session_builds_a_slide_piece_by_piece() {
    let from = Pos::new(1, 1);
    let mut session = Session::new(game_with(
        6,
        6,
        &[(from, Color::White, 1), (Pos::new(5, 5), Color::Black, 1)],
        Color::White,
    ));
    assert!(session.can_pick(from));
    assert!(!session.can_pick(Pos::new(5, 5)));

    session.pick(from).expect("slide available");
    let targets = session.legal_drop_targets();
    assert!(targets.contains(&Pos::new(2, 2)));
    assert!(!targets.contains(&Pos::new(1, 2)));

    session.drop(Pos::new(2, 2)).expect("river destination");
    assert_eq!(
        session.complete_move(),
        Some(Move::Slide {
            from,
            to: Pos::new(2, 2)
        })
    );
    let report = session.confirm().expect("complete move");
    assert_eq!(report.affected, vec![from, Pos::new(2, 2)]);
    assert_eq!(session.game().turn(), Color::Black);
}

#[test]
fn session_carries_the_whole_stack_on_a_slide() {
    let from = Pos::new(1, 1);
    let mut session = Session::new(game_with(
        6,
        6,
        &[(from, Color::White, 3), (Pos::new(5, 5), Color::Black, 1)],
        Color::White,
    ));
    session.pick(from).expect("piece available");
    // Only slides reach a diagonal cell, and a slide takes everything.
    session.drop(Pos::new(2, 2)).expect("river destination");
    assert_eq!(session.game().board().height(Pos::new(2, 2)), 3);
    assert!(session.game().board().is_vacant(from));
    assert!(session.complete_move().is_some());
}

#[test]
fn session_flip_can_be_taken_back() {
    let mut session = Session::new(game_with(
        6,
        6,
        &[
            (Pos::new(0, 0), Color::White, 2),
            (Pos::new(5, 5), Color::Black, 1),
        ],
        Color::White,
    ));
    let before = session.game().fen();
    let tile = Pos::new(2, 2);
    session.flip(tile).expect("flippable");
    assert_eq!(session.game().position().flipped(), Some(tile));
    session.flip(tile).expect("flip back");
    assert_eq!(session.game().position().flipped(), None);
    assert_eq!(session.game().fen(), before);
}

#[test]
fn session_cancel_restores_the_board() {
    let focus = Pos::new(2, 2);
    let mut session = Session::new(game_with(
        6,
        6,
        &[(focus, Color::White, 2), (Pos::new(5, 5), Color::Black, 1)],
        Color::White,
    ));
    let before = session.game().fen();
    session.pick(focus).expect("split available");
    session.drop(Pos::new(2, 3)).expect("north is open");
    session.pick(focus).expect("second piece");
    session.cancel().expect("ledger unwinds");
    assert_eq!(session.game().fen(), before);
    assert_eq!(session.in_hand(), None);
}

#[test]
fn resignation_ends_play() {
    let mut game = Truchet::new(&small_config()).expect("valid config");
    let outcome = game.resign(Color::Black).expect("game running");
    assert_eq!(outcome.winner, Color::White);
    assert_eq!(outcome.reason, WinReason::Resignation);
    assert!(game.moves().is_empty());
    assert_eq!(
        game.undo(),
        Err(GameError::Position(PositionError::EmptyHistory))
    );
}
