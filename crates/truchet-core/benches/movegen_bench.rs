use criterion::{black_box, criterion_group, criterion_main, Criterion};
use truchet_core::movegen::generate_moves;
use truchet_core::{reachable, Board, BoardConfig, Color, Position, Sweeper};

fn movegen_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("movegen");
    group.sample_size(100);

    let standard = Board::new(&BoardConfig::default().with_seed(1)).expect("valid config");
    let large = Board::new(&BoardConfig::default().with_size(12, 12).with_seed(1))
        .expect("valid config");

    group.bench_function("standard_with_flips", |b| {
        b.iter(|| generate_moves(black_box(&standard), Color::White, true))
    });

    group.bench_function("standard_movements", |b| {
        b.iter(|| generate_moves(black_box(&standard), Color::White, false))
    });

    group.bench_function("large_movements", |b| {
        b.iter(|| generate_moves(black_box(&large), Color::White, false))
    });

    group.bench_function("reachable_all_origins", |b| {
        let mut sweep = Sweeper::new(&standard);
        b.iter(|| {
            standard
                .positions()
                .map(|pos| reachable(black_box(&standard), pos, &mut sweep).len())
                .sum::<usize>()
        })
    });

    group.bench_function("position_from_fen", |b| {
        let fen = Position::new(&BoardConfig::default().with_seed(1))
            .expect("valid config")
            .fen();
        b.iter(|| Position::from_fen(black_box(&fen)).expect("parse").moves())
    });

    group.finish();
}

criterion_group!(benches, movegen_benchmarks);
criterion_main!(benches);
