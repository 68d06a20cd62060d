use criterion::{Criterion, black_box, criterion_group, criterion_main};
use dvt_surface::{Dimensions, Surface, SurfaceActor, SurfaceConfig, SurfaceModel};

struct BenchSize {
    columns: usize,
    screen_lines: usize,
}

impl Dimensions for BenchSize {
    fn total_lines(&self) -> usize {
        self.screen_lines
    }

    fn screen_lines(&self) -> usize {
        self.screen_lines
    }

    fn columns(&self) -> usize {
        self.columns
    }
}

fn filled_surface() -> Surface {
    let size = BenchSize {
        columns: 120,
        screen_lines: 50,
    };
    let mut surface = Surface::new(SurfaceConfig::default(), &size);

    for _ in 0..size.screen_lines {
        for ch in "the quick brown fox jumps over the lazy dog".chars() {
            surface.print(ch);
        }
        surface.carriage_return();
        surface.line_feed();
    }

    surface
}

fn bench_snapshot_owned(c: &mut Criterion) {
    let mut surface = filled_surface();

    c.bench_function("surface_snapshot_owned", |b| {
        b.iter(|| {
            let frame = surface.snapshot_owned();
            let view = frame.view();
            black_box(view.visible_cell_count);
        });
    });
}

criterion_group!(snapshot, bench_snapshot_owned);
criterion_main!(snapshot);
