use cogsuite_geometry::{Layout, PartitionConfig};
use cogsuite_render::{Renderer as _, SkiaRenderer, render_puzzle};
use cogsuite_tasks::matrix::{MatrixPuzzle, levels};
use cogsuite_tasks::search::CellState;
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

pub fn bench_layout(c: &mut Criterion) {
    let mut g = c.benchmark_group("rasterize");
    g.sample_size(40);

    let mut rng = StdRng::seed_from_u64(3);
    let shattered = Layout::shattered(1280.0, 720.0, 100, &PartitionConfig::default(), &mut rng)
        .expect("layout");
    let grid = Layout::grid(720.0, 720.0, 9, &mut rng).expect("grid");

    for (name, layout) in [("shattered_100", &shattered), ("grid_9", &grid)] {
        g.bench_function(name, |b| {
            b.iter_batched(
                || SkiaRenderer::for_layout(layout).expect("canvas"),
                |mut r| {
                    r.draw_layout(black_box(layout), &|i| {
                        if i % 7 == 0 { CellState::Found } else { CellState::Idle }
                    });
                    r
                },
                BatchSize::LargeInput,
            )
        });
    }

    let level = levels().remove(5);
    let puzzle = MatrixPuzzle {
        level: 5,
        rule: level.rule,
        cells: level.cells,
        options: vec![level.answer; 6],
    };
    g.bench_function("matrix_puzzle", |b| {
        b.iter(|| render_puzzle(black_box(&puzzle), 120).expect("puzzle"))
    });

    g.finish();
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
