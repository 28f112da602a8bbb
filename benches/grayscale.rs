use criterion::{Criterion, black_box, criterion_group, criterion_main};
use zebra::utils::grayscale::{normalize, nv21_to_rgba};
use zebra::{PixelBuffer, PixelFormat};

fn buffer(width: usize, height: usize, format: PixelFormat) -> PixelBuffer {
    let data = (0..format.buffer_len(width, height)).map(|i| (i % 251) as u8).collect();
    PixelBuffer::new(width, height, format, data).expect("valid buffer")
}

fn bench_normalize_rgb(c: &mut Criterion) {
    for (w, h) in [(100, 100), (640, 480), (1920, 1080)] {
        let image = buffer(w, h, PixelFormat::Rgb);
        c.bench_function(&format!("normalize_rgb_{w}x{h}"), |b| {
            b.iter(|| normalize(black_box(&image)))
        });
    }
}

fn bench_normalize_rgba(c: &mut Criterion) {
    let image = buffer(640, 480, PixelFormat::Rgba);
    c.bench_function("normalize_rgba_640x480", |b| {
        b.iter(|| normalize(black_box(&image)))
    });
}

fn bench_normalize_nv21(c: &mut Criterion) {
    let image = buffer(1920, 1080, PixelFormat::Nv21);
    c.bench_function("normalize_nv21_1920x1080", |b| {
        b.iter(|| normalize(black_box(&image)))
    });
}

fn bench_nv21_to_rgba(c: &mut Criterion) {
    let image = buffer(640, 480, PixelFormat::Nv21);
    c.bench_function("nv21_to_rgba_640x480", |b| {
        b.iter(|| nv21_to_rgba(black_box(image.data()), black_box(640), black_box(480)))
    });
}

criterion_group!(
    benches,
    bench_normalize_rgb,
    bench_normalize_rgba,
    bench_normalize_nv21,
    bench_nv21_to_rgba
);
criterion_main!(benches);
