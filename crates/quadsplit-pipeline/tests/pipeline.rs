//! Integration tests: synthetic composites through the full per-image pipeline.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use image::Rgb;
use quadsplit_pipeline::{Config, ImageType, Pipeline, Rect, RgbImage, SplitError};

const COLORS: [Rgb<u8>; 4] = [
    Rgb([200, 30, 30]),
    Rgb([30, 160, 30]),
    Rgb([30, 30, 200]),
    Rgb([160, 140, 20]),
];

/// Deterministic high-variance texture.
fn noise(x: u32, y: u32) -> Rgb<u8> {
    let v = x.wrapping_mul(73).wrapping_add(y.wrapping_mul(151)) ^ (x * y);
    let v = u8::try_from(v % 200).unwrap() + 20;
    Rgb([v, v + 17, v / 2])
}

fn dims(outcome: &quadsplit_pipeline::ProcessOutcome) -> Vec<(u32, u32)> {
    outcome
        .result
        .images()
        .expect("split should succeed")
        .iter()
        .map(RgbImage::dimensions)
        .collect()
}

fn pipeline(config: Config) -> Pipeline {
    Pipeline::new(config).expect("config should validate")
}

#[test]
fn divided_composite_uses_projection_profile() {
    // 1000x1000, white 20px divider cross at [490, 510), coloured quadrants.
    let image = RgbImage::from_fn(1000, 1000, |x, y| {
        if (490..510).contains(&x) || (490..510).contains(&y) {
            Rgb([255, 255, 255])
        } else {
            COLORS[usize::from(x >= 510) + 2 * usize::from(y >= 510)]
        }
    });

    let outcome = pipeline(Config::default()).process(&image, "cross.png");
    assert_eq!(outcome.image_type, ImageType::DividersFull);
    assert_eq!(outcome.result.strategy_used, "projection_profile");
    assert!(outcome.result.confidence > 0.75);

    let d = dims(&outcome);
    assert_eq!(d[0].1, d[1].1, "top panels share a height");
    assert_eq!(d[2].1, d[3].1, "bottom panels share a height");
    assert_eq!(d[0].0, d[2].0, "left panels share a width");
    assert_eq!(d[1].0, d[3].0, "right panels share a width");
    assert_eq!(d, [(490, 490); 4]);

    let tl = &outcome.result.images().unwrap()[0];
    assert_eq!(tl.get_pixel(0, 0), &COLORS[0]);
    assert_eq!(tl.get_pixel(489, 489), &COLORS[0]);
    assert!(!outcome.diagnostics.standardized, "projection panels are never re-centred");
}

#[test]
fn horizontal_divider_only_uses_hybrid() {
    let image = RgbImage::from_fn(400, 400, |x, y| {
        if (190..210).contains(&y) {
            Rgb([255, 255, 255])
        } else {
            noise(x, y)
        }
    });

    let outcome = pipeline(Config::default()).process(&image, "rows.png");
    assert_eq!(outcome.image_type, ImageType::DividersHorizontalOnly);
    assert_eq!(outcome.result.strategy_used, "horizontal_projection_split");
    assert_eq!(dims(&outcome), [(200, 190); 4]);
}

#[test]
fn vertical_divider_only_uses_hybrid() {
    let image = RgbImage::from_fn(400, 400, |x, y| {
        if (190..210).contains(&x) {
            Rgb([255, 255, 255])
        } else {
            noise(x, y)
        }
    });

    let outcome = pipeline(Config::default()).process(&image, "cols.png");
    assert_eq!(outcome.image_type, ImageType::DividersVerticalOnly);
    assert_eq!(outcome.result.strategy_used, "vertical_projection_split");
    assert_eq!(dims(&outcome), [(190, 200); 4]);
}

/// Four differently sized boxes on white, with no straight gutter between them.
fn staggered() -> RgbImage {
    let boxes = [
        Rect::new(50, 50, 470, 390),
        Rect::new(560, 50, 390, 470),
        Rect::new(50, 480, 420, 470),
        Rect::new(500, 560, 450, 390),
    ];
    RgbImage::from_fn(1000, 1000, |x, y| {
        boxes
            .iter()
            .zip(COLORS)
            .find(|(b, _)| x >= b.x && x < b.right() && y >= b.y && y < b.bottom())
            .map_or(Rgb([255, 255, 255]), |(_, c)| c)
    })
}

#[test]
fn seamless_composite_is_split_and_recentred() {
    let mut config = Config::default();
    config.trimming.enabled = true;
    let outcome = pipeline(config).process(&staggered(), "seamless.png");

    assert_eq!(outcome.image_type, ImageType::SeamlessUniform);
    assert_eq!(outcome.result.strategy_used, "contour_analysis");
    assert!(outcome.diagnostics.standardized);
    assert_eq!(dims(&outcome), [(500, 500); 4]);
    assert_eq!(
        outcome.result.bounds().unwrap()[0],
        Rect::new(15, 55, 470, 390)
    );
    for (panel, color) in outcome.result.images().unwrap().iter().zip(COLORS) {
        assert!(panel.pixels().all(|p| *p == color), "canvas fill follows the panel");
    }
}

#[test]
fn seamless_without_trimming_keeps_raw_crops() {
    let outcome = pipeline(Config::default()).process(&staggered(), "seamless.png");
    assert_eq!(outcome.result.strategy_used, "contour_analysis");
    assert!(!outcome.diagnostics.standardized);
    assert_eq!(
        dims(&outcome),
        [(470, 390), (390, 470), (420, 470), (450, 390)]
    );
}

#[test]
fn fallback_chain_reaches_midpoint() {
    let image = RgbImage::from_pixel(300, 200, Rgb([128, 128, 128]));
    let mut config = Config::default();
    config.midpoint_fallback.confidence_threshold = 0.1;

    let outcome = pipeline(config).process(&image, "flat.png");
    assert_eq!(outcome.result.strategy_used, "midpoint_fallback");
    assert!((outcome.result.confidence - 0.2).abs() < f64::EPSILON);
    assert_eq!(dims(&outcome), [(150, 100); 4]);
    let last = outcome.diagnostics.attempts.last().unwrap();
    assert_eq!(last.strategy, "midpoint_fallback");
}

#[test]
fn exhaustion_is_a_normal_result() {
    let image = RgbImage::from_pixel(300, 200, Rgb([128, 128, 128]));
    let outcome = pipeline(Config::default()).process(&image, "flat.png");
    assert!(!outcome.is_success());
    assert_eq!(outcome.result.strategy_used, "pipeline_exhausted");
    assert_eq!(outcome.result.error(), Some(&SplitError::PipelineExhausted));
    assert_eq!(
        outcome.result.error_message().as_deref(),
        Some("all strategies failed")
    );
}

#[test]
fn pipeline_is_shareable_across_threads() {
    fn assert_sync<T: Send + Sync>() {}
    assert_sync::<Pipeline>();
}
