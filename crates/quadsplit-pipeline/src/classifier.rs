//! Structural classification of composite images.
//!
//! The classifier looks for divider bands with a variance test on the
//! central band of each axis: a divider is a line that is flat *and*
//! sits in a band whose other lines are clearly noisier. Without
//! dividers, the image border decides between uniform and textured
//! seamless backgrounds.

use std::sync::Arc;

use image::imageops;
use serde::Serialize;
use tracing::debug;

use crate::config::{ClassifierConfig, Config};
use crate::stats::{line_stds, mean_std};
use crate::types::{Axis, ImageType, RgbImage};

/// Flattest-line statistics for one axis's central band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandReport {
    /// Smallest line standard deviation in the band.
    pub min_std: f64,
    /// Mean line standard deviation across the band.
    pub mean_std: f64,
    /// Whether the band qualifies as containing a divider.
    pub divider: bool,
}

/// Full classifier output, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Diagnosis {
    /// The structural verdict.
    pub image_type: ImageType,
    /// Row band report (horizontal divider), if the band had any lines.
    pub horizontal: Option<BandReport>,
    /// Column band report (vertical divider), if the band had any lines.
    pub vertical: Option<BandReport>,
    /// Mean per-channel standard deviation of the border strips, when
    /// the decision reached that stage.
    pub edge_std: Option<f64>,
}

/// Variance-band structural classifier.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: Arc<Config>,
}

impl Classifier {
    /// Create a classifier reading the `classifier` section of `config`.
    #[must_use]
    pub const fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    fn section(&self) -> &ClassifierConfig {
        &self.config.classifier
    }

    /// Structural type of `image`.
    #[must_use]
    pub fn diagnose(&self, image: &RgbImage) -> ImageType {
        self.diagnose_detailed(image).image_type
    }

    /// Structural type of `image` together with the statistics behind it.
    #[must_use]
    pub fn diagnose_detailed(&self, image: &RgbImage) -> Diagnosis {
        let (w, h) = image.dimensions();
        let unknown = Diagnosis {
            image_type: ImageType::Unknown,
            horizontal: None,
            vertical: None,
            edge_std: None,
        };
        if w == 0 || h == 0 {
            return unknown;
        }

        let gray = imageops::grayscale(image);
        let horizontal = self.band_report(&gray, Axis::Horizontal);
        let vertical = self.band_report(&gray, Axis::Vertical);
        let has_h = horizontal.is_some_and(|r| r.divider);
        let has_v = vertical.is_some_and(|r| r.divider);
        debug!(?horizontal, ?vertical, "divider band statistics");

        let image_type = match (has_h, has_v) {
            (true, true) => Some(ImageType::DividersFull),
            (true, false) => Some(ImageType::DividersHorizontalOnly),
            (false, true) => Some(ImageType::DividersVerticalOnly),
            (false, false) => None,
        };
        if let Some(image_type) = image_type {
            return Diagnosis {
                image_type,
                horizontal,
                vertical,
                edge_std: None,
            };
        }

        let Some(edge_std) = self.edge_std(image) else {
            return Diagnosis {
                horizontal,
                vertical,
                ..unknown
            };
        };
        debug!(edge_std, "border strip deviation");
        let image_type = if edge_std < self.section().edge_uniformity_threshold {
            ImageType::SeamlessUniform
        } else {
            ImageType::SeamlessComplex
        };
        Diagnosis {
            image_type,
            horizontal,
            vertical,
            edge_std: Some(edge_std),
        }
    }

    /// Line statistics for the central band of `axis`.
    ///
    /// [`Axis::Horizontal`] examines rows across the vertical midline band;
    /// [`Axis::Vertical`] examines columns across the horizontal one.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn band_report(&self, gray: &image::GrayImage, axis: Axis) -> Option<BandReport> {
        let len = match axis {
            Axis::Horizontal => gray.height(),
            Axis::Vertical => gray.width(),
        };
        let band = ((f64::from(len) * self.section().band_fraction).round() as u32).min(len);
        let start = (len - band) / 2;
        let stds = line_stds(gray, axis, start..start + band);

        let min_std = stds.iter().copied().reduce(f64::min)?;
        let mean_std = stds.iter().sum::<f64>() / stds.len() as f64;
        let divider = min_std < self.section().uniform_line_threshold
            && mean_std >= self.section().noise_margin * min_std.max(1.0);
        Some(BandReport {
            min_std,
            mean_std,
            divider,
        })
    }

    /// Mean per-channel standard deviation of the pooled border strips.
    ///
    /// The strip width is `edge_margin`, limited to half of each dimension.
    fn edge_std(&self, image: &RgbImage) -> Option<f64> {
        let (w, h) = image.dimensions();
        let m = self.section().edge_margin.min(w / 2).min(h / 2);
        if m == 0 {
            return None;
        }
        let in_strip = |x: u32, y: u32| x < m || x >= w - m || y < m || y >= h - m;

        let mut total = 0.0;
        for channel in 0..3 {
            let samples = image
                .enumerate_pixels()
                .filter(|&(x, y, _)| in_strip(x, y))
                .map(|(_, _, p)| f64::from(p.0[channel]));
            total += mean_std(samples)?.1;
        }
        Some(total / 3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Deterministic high-variance texture.
    fn noise(x: u32, y: u32) -> Rgb<u8> {
        let v = x.wrapping_mul(73).wrapping_add(y.wrapping_mul(151)) ^ (x * y);
        let v = u8::try_from(v % 200).unwrap_or(0) + 20;
        Rgb([v, v.wrapping_add(17), v / 2])
    }

    fn composite(h_band: bool, v_band: bool) -> RgbImage {
        RgbImage::from_fn(400, 400, |x, y| {
            let in_h = h_band && (190..210).contains(&y);
            let in_v = v_band && (190..210).contains(&x);
            if in_h || in_v {
                Rgb([255, 255, 255])
            } else {
                noise(x, y)
            }
        })
    }

    fn diagnose(image: &RgbImage) -> ImageType {
        Classifier::default().diagnose(image)
    }

    #[test]
    fn two_bands_are_full_dividers() {
        assert_eq!(diagnose(&composite(true, true)), ImageType::DividersFull);
    }

    #[test]
    fn one_band_is_single_axis() {
        assert_eq!(
            diagnose(&composite(true, false)),
            ImageType::DividersHorizontalOnly
        );
        assert_eq!(
            diagnose(&composite(false, true)),
            ImageType::DividersVerticalOnly
        );
    }

    #[test]
    fn flat_background_is_seamless_uniform() {
        // Two blocks on white, staggered so no central line is flat.
        let img = RgbImage::from_fn(300, 300, |x, y| {
            if (20..170).contains(&x) && (20..160).contains(&y) {
                Rgb([200, 40, 40])
            } else if (130..280).contains(&x) && (140..280).contains(&y) {
                Rgb([40, 40, 200])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let diagnosis = Classifier::default().diagnose_detailed(&img);
        assert_eq!(diagnosis.image_type, ImageType::SeamlessUniform);
        assert!(diagnosis.edge_std.is_some_and(|s| s < 1e-9));
    }

    #[test]
    fn noisy_background_is_seamless_complex() {
        let img = RgbImage::from_fn(300, 300, noise);
        assert_eq!(diagnose(&img), ImageType::SeamlessComplex);
    }

    #[test]
    fn flat_image_is_not_a_divider() {
        // Every line is flat, so no band is noisier than its flattest line.
        let img = RgbImage::from_pixel(200, 200, Rgb([90, 90, 90]));
        assert_eq!(diagnose(&img), ImageType::SeamlessUniform);
    }

    #[test]
    fn empty_image_is_unknown() {
        assert_eq!(diagnose(&RgbImage::new(0, 0)), ImageType::Unknown);
        assert_eq!(diagnose(&RgbImage::new(1, 1)), ImageType::Unknown);
    }
}
