//! Band-scan divider localization.
//!
//! Starting from a seed pixel believed to lie on a divider, walk outward
//! in each of the four directions one pixel at a time. At every step a
//! short band perpendicular to the walk is sampled; the walk stops at the
//! first band whose median strays from the divider colour by more than
//! the configured tolerance.

use image::GrayImage;

use crate::config::BandScanConfig;
use crate::stats::median;
use crate::types::DividerBounds;

/// Round `n` up to the next odd number.
const fn odd(n: u32) -> u32 {
    n | 1
}

/// Inclusive sample range `[c - half, c + half]` clipped to `[0, len)`.
fn clipped(c: u32, half: u32, len: u32) -> std::ops::Range<u32> {
    c.saturating_sub(half)..c.saturating_add(half).saturating_add(1).min(len)
}

/// Median of the column segment at `x` spanning `rows`.
fn column_median(gray: &GrayImage, x: u32, rows: std::ops::Range<u32>, buf: &mut Vec<u8>) -> Option<f64> {
    buf.clear();
    buf.extend(rows.map(|y| gray.get_pixel(x, y).0[0]));
    median(buf)
}

/// Median of the row segment at `y` spanning `cols`.
fn row_median(gray: &GrayImage, y: u32, cols: std::ops::Range<u32>, buf: &mut Vec<u8>) -> Option<f64> {
    buf.clear();
    buf.extend(cols.map(|x| gray.get_pixel(x, y).0[0]));
    median(buf)
}

/// Full rectangular extent of the divider containing `(cx, cy)`.
///
/// The divider colour is the median of a `seed_patch`-sized square at the
/// seed (rounded up to odd, clipped to the image). Each directional walk
/// samples a `band_thickness`-long perpendicular band. End coordinates of
/// the result are exclusive.
///
/// Returns `None` when the seed lies outside the image (the seed patch is
/// empty).
#[must_use]
pub fn find_precise_bounds(
    gray: &GrayImage,
    cx: u32,
    cy: u32,
    config: &BandScanConfig,
) -> Option<DividerBounds> {
    let (w, h) = gray.dimensions();
    if cx >= w || cy >= h {
        return None;
    }

    let patch_half = odd(config.seed_patch) / 2;
    let mut patch: Vec<u8> = clipped(cy, patch_half, h)
        .flat_map(|y| clipped(cx, patch_half, w).map(move |x| (x, y)))
        .map(|(x, y)| gray.get_pixel(x, y).0[0])
        .collect();
    let color = median(&mut patch)?;

    let tolerance = f64::from(config.divider_color_tolerance);
    let band_half = odd(config.band_thickness) / 2;
    let rows = clipped(cy, band_half, h);
    let cols = clipped(cx, band_half, w);
    let matches = |m: Option<f64>| m.is_some_and(|m| (m - color).abs() <= tolerance);
    let mut buf = Vec::with_capacity(odd(config.band_thickness) as usize);

    let mut x_start = cx;
    for x in (0..cx).rev() {
        if !matches(column_median(gray, x, rows.clone(), &mut buf)) {
            break;
        }
        x_start = x;
    }

    let mut x_end = cx;
    for x in cx + 1..w {
        if !matches(column_median(gray, x, rows.clone(), &mut buf)) {
            break;
        }
        x_end = x;
    }

    let mut y_start = cy;
    for y in (0..cy).rev() {
        if !matches(row_median(gray, y, cols.clone(), &mut buf)) {
            break;
        }
        y_start = y;
    }

    let mut y_end = cy;
    for y in cy + 1..h {
        if !matches(row_median(gray, y, cols.clone(), &mut buf)) {
            break;
        }
        y_end = y;
    }

    Some(DividerBounds {
        x_start,
        x_end: x_end + 1,
        y_start,
        y_end: y_end + 1,
    })
}
