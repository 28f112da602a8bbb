use criterion::{Criterion, black_box, criterion_group, criterion_main};
use zebra::LuminanceGrid;
use zebra::utils::binarization::{binarize, otsu_binarize, threshold_binarize};

/// Gradient with a checkerboard on top, so blocks have real contrast
fn grid(width: usize, height: usize) -> LuminanceGrid {
    let data = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            let base = (x * 128 / width) as u8;
            if (x / 8 + y / 8) % 2 == 0 { base } else { base + 120 }
        })
        .collect();
    LuminanceGrid::new(width, height, data).expect("valid grid")
}

fn bench_block_adaptive(c: &mut Criterion) {
    for (w, h) in [(100, 100), (640, 480), (1920, 1080)] {
        let gray = grid(w, h);
        c.bench_function(&format!("binarize_{w}x{h}"), |b| {
            b.iter(|| binarize(black_box(&gray)))
        });
    }
}

fn bench_otsu(c: &mut Criterion) {
    let gray = grid(640, 480);
    c.bench_function("otsu_binarize_640x480", |b| {
        b.iter(|| otsu_binarize(black_box(&gray)))
    });
}

fn bench_threshold(c: &mut Criterion) {
    let gray = grid(640, 480);
    c.bench_function("threshold_binarize_640x480", |b| {
        b.iter(|| threshold_binarize(black_box(&gray), black_box(128)))
    });
}

criterion_group!(benches, bench_block_adaptive, bench_otsu, bench_threshold);
criterion_main!(benches);
