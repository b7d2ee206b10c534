//! Canny edge detection on pre-blurred grayscale images.
//!
//! Unlike `imageproc::edges::canny`, this does not blur internally: the
//! caller controls smoothing through [`crate::blur::gaussian_blur`].
//! Hysteresis walks all eight neighbours with explicit bounds checks, so
//! edges that touch the image border are traced without panicking (see
//! <https://github.com/image-rs/imageproc/issues/705>). Panel crops
//! routinely have subjects touching their borders.

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel;

/// Minimum allowed Canny threshold.
///
/// A low threshold of zero turns every pixel with any gradient into an
/// edge candidate, which makes every panel's subject span the full panel.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Detect edges using the Canny algorithm.
///
/// Returns a binary image: 255 for edge pixels, 0 for non-edge.
/// Pixels with gradient magnitude above `high_threshold` are definite
/// edges; those between the thresholds are edges only when connected to
/// a definite edge.
///
/// Both thresholds are clamped to at least [`MIN_THRESHOLD`] and
/// `low_threshold` is clamped to at most `high_threshold`. Images
/// smaller than 3x3 have no interior and produce no edges.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let high = high_threshold.max(MIN_THRESHOLD);
    let low = low_threshold.max(MIN_THRESHOLD).min(high);

    let (w, h) = image.dimensions();
    if w < 3 || h < 3 {
        return GrayImage::new(w, h);
    }

    let gx: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);
    let magnitude: Vec<f32> = gx
        .as_raw()
        .iter()
        .zip(gy.as_raw())
        .map(|(&dx, &dy)| f32::from(dx).hypot(f32::from(dy)))
        .collect();

    let (wu, hu) = (w as usize, h as usize);
    let thinned = suppress_non_maxima(&magnitude, gx.as_raw(), gy.as_raw(), wu, hu);
    let edges = hysteresis(&thinned, wu, hu, low, high);
    GrayImage::from_raw(w, h, edges).unwrap_or_else(|| GrayImage::new(w, h))
}

/// Keep only pixels that are local maxima across the gradient direction.
///
/// The one-pixel border is always suppressed.
fn suppress_non_maxima(magnitude: &[f32], gx: &[i16], gy: &[i16], w: usize, h: usize) -> Vec<f32> {
    let mut out = vec![0.0; magnitude.len()];
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            let m = magnitude[i];
            if m <= 0.0 {
                continue;
            }
            let mut angle = f32::from(gy[i]).atan2(f32::from(gx[i])).to_degrees();
            if angle < 0.0 {
                angle += 180.0;
            }
            // Neighbours along the quantized gradient direction (y grows down).
            let (a, b) = if !(22.5..157.5).contains(&angle) {
                (i - 1, i + 1)
            } else if angle < 67.5 {
                (i - w - 1, i + w + 1)
            } else if angle < 112.5 {
                (i - w, i + w)
            } else {
                (i - w + 1, i + w - 1)
            };
            if m >= magnitude[a] && m >= magnitude[b] {
                out[i] = m;
            }
        }
    }
    out
}

/// Double-threshold edge tracking with an explicit stack.
fn hysteresis(strength: &[f32], w: usize, h: usize, low: f32, high: f32) -> Vec<u8> {
    let mut out = vec![0u8; strength.len()];
    let mut stack = Vec::new();
    for seed in 0..strength.len() {
        if strength[seed] < high || out[seed] != 0 {
            continue;
        }
        out[seed] = 255;
        stack.push(seed);
        while let Some(i) = stack.pop() {
            let (x, y) = (i % w, i / w);
            for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    let j = ny * w + nx;
                    if out[j] == 0 && strength[j] >= low {
                        out[j] = 255;
                        stack.push(j);
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_count(edges: &GrayImage) -> u32 {
        edges.pixels().map(|p| u32::from(p.0[0] > 0)).sum()
    }

    /// 20x20 image with a sharp vertical boundary at x = 10.
    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(20, 20, |x, _y| Luma([if x < 10 { 0 } else { 255 }]))
    }

    #[test]
    fn blank_image_produces_no_edges() {
        let img = GrayImage::from_pixel(20, 20, Luma([128]));
        assert_eq!(edge_count(&canny(&img, 50.0, 150.0)), 0);
    }

    #[test]
    fn sharp_edge_detected_near_boundary() {
        let edges = canny(&sharp_edge_image(), 50.0, 150.0);
        assert!(edge_count(&edges) > 0, "expected edges at sharp boundary");
        for (x, _y, p) in edges.enumerate_pixels() {
            if p.0[0] > 0 {
                assert!((8..=11).contains(&x), "edge pixel far from boundary at x={x}");
            }
        }
    }

    #[test]
    fn output_dimensions_match_input() {
        let edges = canny(&GrayImage::new(17, 31), 50.0, 150.0);
        assert_eq!(edges.dimensions(), (17, 31));
    }

    #[test]
    fn tiny_images_have_no_edges() {
        let img = GrayImage::from_fn(2, 2, |x, _| Luma([if x == 0 { 0 } else { 255 }]));
        assert_eq!(edge_count(&canny(&img, 1.0, 2.0)), 0);
    }

    #[test]
    fn border_edge_does_not_panic() {
        // A bright column next to the left border drives hysteresis into x=0.
        let img = GrayImage::from_fn(10, 10, |x, _| Luma([if x == 1 { 255 } else { 0 }]));
        let edges = canny(&img, 1.0, 2.0);
        assert!(edge_count(&edges) > 0);
    }

    #[test]
    fn thresholds_are_clamped() {
        let img = sharp_edge_image();
        assert_eq!(canny(&img, 0.0, 150.0), canny(&img, MIN_THRESHOLD, 150.0));
        assert_eq!(canny(&img, 200.0, 100.0), canny(&img, 100.0, 100.0));
    }
}
