#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

//! End-to-end recognition scenarios on synthetic frames.
//!
//! With an axis-aligned marker the hole border is traced clockwise from
//! its top-left corner, the polygon starts at the corner diagonally
//! opposite the trace start, and rectification therefore observes the
//! printed grid rotated 180 degrees: a marker printed with the base
//! pattern decodes with `rotations == 2`, and pre-rotating the printed
//! grid by one CCW step shifts the count to 3.

use gridmark_core::catalog::BUILTIN_CATALOG;
use gridmark_core::config::DetectorConfig;
use gridmark_core::test_utils::{MarkerPlacement, SceneBuilder};
use gridmark_core::{Detector, ImageView};

fn place(code: gridmark_core::Code, cx: f64, cy: f64, size: f64, rot: f64) -> MarkerPlacement {
    MarkerPlacement { code, center_x: cx, center_y: cy, size, rotation_rad: rot }
}

#[test]
fn recognizes_single_clean_marker() {
    let code = BUILTIN_CATALOG.code(3).unwrap();
    let img = SceneBuilder::new(640, 640)
        .add_marker(place(code, 320.0, 320.0, 300.0, 0.0))
        .build();

    let detector = Detector::new();
    let (markers, stats) = detector.recognize_with_stats(&img.view()).unwrap();

    assert_eq!(markers.len(), 1, "stats: {stats:?}");
    let marker = &markers[0];
    assert_eq!(marker.id, 3);
    assert_eq!(marker.rotations, 2);
    assert!(
        (marker.position.0 - 320).abs() <= 1 && (marker.position.1 - 320).abs() <= 1,
        "position {:?} should be within 1px of the true centroid",
        marker.position
    );

    // The frame also produces the background quad and the white code
    // cells as candidates; all of them fail the border validator.
    assert!(stats.num_candidates >= 2);
    assert!(stats.num_rejected_border >= 1);
    assert_eq!(stats.num_markers, 1);
}

#[test]
fn pre_rotated_grid_shifts_rotation_count() {
    let entry = &BUILTIN_CATALOG.entries()[2]; // id 3
    assert_eq!(entry.id, 3);

    // Print the pattern rotated one CCW step: the marker reads as the
    // same identity with the rotation count advanced by one.
    let img = SceneBuilder::new(640, 640)
        .add_marker(place(entry.rotations[1], 320.0, 320.0, 300.0, 0.0))
        .build();

    let markers = Detector::new().recognize(&img.view()).unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].id, 3);
    assert_eq!(markers[0].rotations, 3);
}

#[test]
fn recognizes_marker_at_an_angle() {
    let code = BUILTIN_CATALOG.code(2).unwrap();
    let img = SceneBuilder::new(640, 640)
        .add_marker(place(code, 320.0, 320.0, 350.0, 0.35))
        .build();

    let markers = Detector::new().recognize(&img.view()).unwrap();
    assert_eq!(markers.len(), 1);
    let marker = &markers[0];
    assert_eq!(marker.id, 2);
    assert_eq!(marker.rotations, 2);
    assert!((marker.position.0 - 320).abs() <= 2);
    assert!((marker.position.1 - 320).abs() <= 2);
}

#[test]
fn solid_dark_square_fails_pattern_match() {
    // A borderless dark blob survives every shape filter and the border
    // check (it is uniformly dark), but its all-zero code matches nothing.
    let mut img = gridmark_core::image::GrayImage::zeroed(400, 400);
    img.data.fill(255);
    for y in 100..300 {
        for x in 100..300 {
            img.set_pixel(x, y, 0);
        }
    }

    let detector = Detector::new();
    let (markers, stats) = detector.recognize_with_stats(&img.view()).unwrap();
    assert!(markers.is_empty());
    assert!(stats.num_rejected_code >= 1, "stats: {stats:?}");
}

#[test]
fn bright_quadrilateral_fails_border_check() {
    // A dark ring that is far thinner than one canonical cell leaves the
    // border strips mostly white after rectification.
    let mut img = gridmark_core::image::GrayImage::zeroed(400, 400);
    img.data.fill(255);
    for y in 100..300 {
        for x in 100..300 {
            let on_ring = !(106..294).contains(&x) || !(106..294).contains(&y);
            if on_ring {
                img.set_pixel(x, y, 0);
            }
        }
    }

    let detector = Detector::new();
    let (markers, stats) = detector.recognize_with_stats(&img.view()).unwrap();
    assert!(markers.is_empty());
    assert!(stats.num_rejected_border >= 1, "stats: {stats:?}");
}

#[test]
fn seeded_noise_does_not_break_recognition() {
    use rand::SeedableRng;
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);

    let code = BUILTIN_CATALOG.code(5).unwrap();
    let img = SceneBuilder::new(640, 640)
        .add_marker(place(code, 320.0, 320.0, 300.0, 0.0))
        .with_noise(25.0)
        .build_with_rng(&mut rng);

    let markers = Detector::new().recognize(&img.view()).unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].id, 5);
}

#[test]
fn recognizes_multiple_markers() {
    let img = SceneBuilder::new(640, 640)
        .add_marker(place(BUILTIN_CATALOG.code(1).unwrap(), 160.0, 160.0, 180.0, 0.0))
        .add_marker(place(BUILTIN_CATALOG.code(4).unwrap(), 470.0, 470.0, 180.0, 0.0))
        .build();

    let markers = Detector::new().recognize(&img.view()).unwrap();
    let mut ids: Vec<u32> = markers.iter().map(|m| m.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, [1, 4]);
}

#[test]
fn recognize_by_id_finds_only_the_requested_marker() {
    let img = SceneBuilder::new(640, 640)
        .add_marker(place(BUILTIN_CATALOG.code(1).unwrap(), 160.0, 160.0, 180.0, 0.0))
        .add_marker(place(BUILTIN_CATALOG.code(4).unwrap(), 470.0, 470.0, 180.0, 0.0))
        .build();

    let detector = Detector::new();
    let found = detector.recognize_by_id(&img.view(), 4).unwrap();
    assert_eq!(found.map(|m| m.id), Some(4));

    let absent = detector.recognize_by_id(&img.view(), 6).unwrap();
    assert!(absent.is_none());
}

#[test]
fn custom_catalog_is_honored() {
    use gridmark_core::{Catalog, Code};

    // A one-entry catalog under a test identity: the built-in pattern 3
    // no longer matches, the custom pattern does.
    let custom_pattern = Code::from_cells([[1, 1, 0], [0, 0, 0], [0, 0, 1]]);
    let catalog = Catalog::new([(9, custom_pattern)]);
    let detector = Detector::with_catalog(DetectorConfig::default(), catalog);

    let img = SceneBuilder::new(640, 640)
        .add_marker(place(custom_pattern, 320.0, 320.0, 300.0, 0.0))
        .build();
    let markers = detector.recognize(&img.view()).unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].id, 9);

    let other = SceneBuilder::new(640, 640)
        .add_marker(place(BUILTIN_CATALOG.code(3).unwrap(), 320.0, 320.0, 300.0, 0.0))
        .build();
    assert!(detector.recognize(&other.view()).unwrap().is_empty());
}

#[test]
fn bearing_from_recognized_marker_is_stable() {
    let code = BUILTIN_CATALOG.code(3).unwrap();
    let img = SceneBuilder::new(640, 640)
        .add_marker(place(code, 320.0, 320.0, 300.0, 0.0))
        .build();

    let markers = Detector::new().recognize(&img.view()).unwrap();
    let marker = &markers[0];

    // Bearing to the marker's own major axis is zero by definition, and
    // the unnormalized difference convention admits negative results.
    assert_eq!(marker.angle_to_point(marker.major_axis), 0);
    let east = marker.angle_to_point((marker.position.0 + 100, marker.position.1));
    assert!((-360..360).contains(&east));
}

#[test]
fn stride_padded_input_behaves_like_contiguous() {
    let code = BUILTIN_CATALOG.code(6).unwrap();
    let img = SceneBuilder::new(320, 320)
        .add_marker(place(code, 160.0, 160.0, 200.0, 0.0))
        .build();

    // Re-embed the frame in a padded buffer with a larger stride.
    let stride = 320 + 13;
    let mut padded = vec![0u8; stride * 320];
    for y in 0..320 {
        padded[y * stride..y * stride + 320].copy_from_slice(&img.data[y * 320..(y + 1) * 320]);
    }
    let view = ImageView::new(&padded, 320, 320, stride).unwrap();

    let markers = Detector::new().recognize(&view).unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].id, 6);
}

#[cfg(feature = "extended-tests")]
mod extended {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn grid_of_all_six_markers_with_jitter() {
        let mut rng = ChaCha8Rng::seed_from_u64(1234);
        let mut scene = SceneBuilder::new(1280, 1280).with_noise(10.0);

        for id in 1..=6u32 {
            let col = (id - 1) % 3;
            let row = (id - 1) / 3;
            let cx = 220.0 + f64::from(col) * 420.0;
            let cy = 320.0 + f64::from(row) * 620.0;
            let angle = rng.gen_range(-0.25..0.25);
            scene = scene.add_marker(place(
                BUILTIN_CATALOG.code(id).unwrap(),
                cx,
                cy,
                260.0,
                angle,
            ));
        }

        let img = scene.build_with_rng(&mut rng);
        let markers = Detector::new().recognize(&img.view()).unwrap();
        let mut ids: Vec<u32> = markers.iter().map(|m| m.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, [1, 2, 3, 4, 5, 6]);
    }
}
