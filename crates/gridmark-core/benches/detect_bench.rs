#![allow(clippy::unwrap_used)]
//! Benchmarks for the full recognition pipeline.
//!
//! Run with `cargo bench --bench detect_bench`.

use divan::Bencher;
use gridmark_core::catalog::BUILTIN_CATALOG;
use gridmark_core::test_utils::{MarkerPlacement, SceneBuilder};
use gridmark_core::Detector;

fn main() {
    divan::main();
}

fn marker_scene(width: usize, height: usize) -> gridmark_core::image::GrayImage {
    SceneBuilder::new(width, height)
        .add_marker(MarkerPlacement {
            code: BUILTIN_CATALOG.code(3).unwrap(),
            center_x: width as f64 / 2.0,
            center_y: height as f64 / 2.0,
            size: 300.0,
            rotation_rad: 0.2,
        })
        .build()
}

#[divan::bench]
fn bench_recognize_vga(bencher: Bencher) {
    let img = marker_scene(640, 480);
    let detector = Detector::new();
    bencher.bench_local(move || divan::black_box(detector.recognize(&img.view())));
}

#[divan::bench]
fn bench_recognize_1080p(bencher: Bencher) {
    let img = marker_scene(1920, 1080);
    let detector = Detector::new();
    bencher.bench_local(move || divan::black_box(detector.recognize(&img.view())));
}

#[divan::bench]
fn bench_recognize_by_id_hit(bencher: Bencher) {
    let img = marker_scene(640, 480);
    let detector = Detector::new();
    bencher.bench_local(move || divan::black_box(detector.recognize_by_id(&img.view(), 3)));
}

#[divan::bench]
fn bench_recognize_empty_frame(bencher: Bencher) {
    let pixels = vec![255u8; 640 * 480];
    let img = gridmark_core::ImageView::new(&pixels, 640, 480, 640).unwrap();
    let detector = Detector::new();
    bencher.bench_local(move || divan::black_box(detector.recognize(&img)));
}
