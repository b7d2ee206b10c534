//! Intensity statistics over rows, columns and pixel samples.
//!
//! All functions take a grayscale buffer and work on its raw row-major
//! slice. Standard deviations are population deviations.

use std::ops::Range;

use image::GrayImage;

use crate::types::Axis;

/// Values closer than this are treated as equal when finding extremum runs.
const RUN_EPSILON: f64 = 1e-6;

/// Population mean and standard deviation of an iterator of samples.
///
/// Returns `None` for an empty iterator.
#[allow(clippy::cast_precision_loss)]
pub fn mean_std(samples: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for v in samples {
        count += 1;
        sum += v;
        sum_sq += v * v;
    }
    if count == 0 {
        return None;
    }
    let n = count as f64;
    let mean = sum / n;
    let variance = (sum_sq / n - mean * mean).max(0.0);
    Some((mean, variance.sqrt()))
}

/// Standard deviation of the pixels along one full line.
///
/// For [`Axis::Horizontal`] `index` is a row; for [`Axis::Vertical`] a column.
/// Out-of-range indices yield `None`.
#[must_use]
pub fn line_std(gray: &GrayImage, axis: Axis, index: u32) -> Option<f64> {
    let (w, h) = gray.dimensions();
    let raw = gray.as_raw();
    match axis {
        Axis::Horizontal if index < h => {
            let start = index as usize * w as usize;
            mean_std(raw[start..start + w as usize].iter().map(|&p| f64::from(p)))
                .map(|(_, s)| s)
        }
        Axis::Vertical if index < w => mean_std(
            raw.iter()
                .skip(index as usize)
                .step_by(w as usize)
                .map(|&p| f64::from(p)),
        )
        .map(|(_, s)| s),
        _ => None,
    }
}

/// Standard deviation of every line in `range` (rows or columns by `axis`).
#[must_use]
pub fn line_stds(gray: &GrayImage, axis: Axis, range: Range<u32>) -> Vec<f64> {
    range
        .filter_map(|i| line_std(gray, axis, i))
        .collect()
}

/// Sum of intensities for every line along `axis`: one entry per row
/// ([`Axis::Horizontal`]) or per column ([`Axis::Vertical`]).
#[must_use]
pub fn projection(gray: &GrayImage, axis: Axis) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let mut sums = vec![0u64; match axis {
        Axis::Horizontal => h as usize,
        Axis::Vertical => w as usize,
    }];
    if w == 0 {
        return sums;
    }
    for (y, row) in gray.as_raw().chunks_exact(w as usize).enumerate() {
        match axis {
            Axis::Horizontal => sums[y] = row.iter().map(|&p| u64::from(p)).sum(),
            Axis::Vertical => {
                for (x, &p) in row.iter().enumerate() {
                    sums[x] += u64::from(p);
                }
            }
        }
    }
    sums
}

/// Median of a sample of intensities, averaging the middle pair for
/// even-sized samples. Sorts the slice in place.
#[must_use]
pub fn median(samples: &mut [u8]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    samples.sort_unstable();
    let mid = samples.len() / 2;
    if samples.len() % 2 == 1 {
        Some(f64::from(samples[mid]))
    } else {
        Some((f64::from(samples[mid - 1]) + f64::from(samples[mid])) / 2.0)
    }
}

/// Which end of the value range [`extremum_run_center`] looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
}

/// Index at the centre of the first contiguous run of extremal values.
///
/// A divider several pixels thick shows up as a plateau of equal
/// minimum (or maximum) values; the plateau centre is a much safer seed
/// than its first index, which sits on the divider's edge.
#[must_use]
pub fn extremum_run_center(values: &[f64], which: Extremum) -> Option<usize> {
    let target = match which {
        Extremum::Min => values.iter().copied().reduce(f64::min)?,
        Extremum::Max => values.iter().copied().reduce(f64::max)?,
    };
    let start = values
        .iter()
        .position(|&v| (v - target).abs() <= RUN_EPSILON)?;
    let len = values[start..]
        .iter()
        .take_while(|&&v| (v - target).abs() <= RUN_EPSILON)
        .count();
    Some(start + (len - 1) / 2)
}
