use criterion::{Criterion, criterion_group, criterion_main};
use minesweeper_core::*;
use std::hint::black_box;

fn first_click(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_click");
    for (name, config) in [
        ("beginner", BoardConfig::beginner()),
        ("intermediate", BoardConfig::intermediate()),
        ("expert", BoardConfig::expert()),
    ] {
        let center = usize::from(config.total_cells()) / 2;
        group.bench_function(name, |b| {
            let mut seed = 0;
            b.iter(|| {
                seed += 1;
                let mut engine = BoardEngine::with_seed(config, seed).unwrap();
                black_box(engine.operate(black_box(center), CellAction::Open, false))
            })
        });
    }
    group.finish();
}

fn flood_fill(c: &mut Criterion) {
    // a single mine in the corner leaves one huge zero region
    let config = BoardConfig::new(255, 255, 1).unwrap();
    let snapshot = Snapshot {
        width: config.width,
        height: config.height,
        mine_count: 1,
        cell_bits: vec![(0, CellBits::MINE.bits())],
        duration: 0,
    };

    c.bench_function("flood_fill_255x255", |b| {
        let mut engine = BoardEngine::with_seed(config, 0).unwrap();
        b.iter(|| {
            engine.restore(&snapshot).unwrap();
            black_box(engine.operate(black_box(65_024), CellAction::Open, false))
        })
    });
}

fn dump(c: &mut Criterion) {
    let mut engine = BoardEngine::with_seed(BoardConfig::expert(), 42).unwrap();
    engine.operate(240, CellAction::Open, false).unwrap();

    c.bench_function("dump_expert", |b| b.iter(|| black_box(engine.dump())));
}

criterion_group!(benches, first_click, flood_fill, dump);
criterion_main!(benches);
