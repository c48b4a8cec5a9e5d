//! Benchmarks for the per-frame and per-request paths

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use globe_explorer::data::{generate_simple_world, Dataset};
use globe_explorer::export::all_cities_csv;
use globe_explorer::figure::{build_figure, ContinentFilter, StyleVariant, ViewMode};
use globe_explorer::map::{MapRenderer, MapView};

fn bench_build_figure(c: &mut Criterion) {
    let dataset = Dataset::embedded().unwrap();
    let style = StyleVariant::Glow.style();

    c.bench_function("build_figure", |b| {
        b.iter(|| {
            build_figure(
                black_box(ViewMode::Globe),
                black_box(&ContinentFilter::All),
                &dataset,
                &style,
            )
        })
    });
}

fn bench_export_csv(c: &mut Criterion) {
    let dataset = Dataset::embedded().unwrap();
    c.bench_function("all_cities_csv", |b| {
        b.iter(|| all_cities_csv(black_box(&dataset)).unwrap())
    });
}

fn bench_render(c: &mut Criterion) {
    let dataset = Dataset::embedded().unwrap();
    let style = StyleVariant::Classic.style();
    let mut renderer = MapRenderer::new();
    generate_simple_world(&mut renderer);

    let mut group = c.benchmark_group("render");
    for mode in [ViewMode::Globe, ViewMode::FlatMap] {
        let figure = build_figure(mode, &ContinentFilter::All, &dataset, &style);
        for (w, h) in [(80usize, 24usize), (200, 60)] {
            let mut view = MapView::new(w * 2, h * 4);
            view.set_mode(mode);
            group.bench_with_input(
                BenchmarkId::new(format!("{mode:?}"), format!("{w}x{h}")),
                &(w, h),
                |b, &(w, h)| b.iter(|| renderer.render(w, h, black_box(&view), &figure, None)),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_build_figure, bench_export_csv, bench_render);
criterion_main!(benches);
