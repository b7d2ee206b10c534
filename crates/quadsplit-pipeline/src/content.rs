//! Subject bounding boxes via edge detection.

use image::imageops;

use crate::blur::gaussian_blur;
use crate::config::ContentBoundsConfig;
use crate::edge::canny;
use crate::types::{Rect, RgbImage};

/// Bounding rectangle of every edge pixel in `panel`.
///
/// The panel is converted to grayscale, blurred with
/// [`ContentBoundsConfig::blur_sigma`] and run through Canny with the
/// configured thresholds. Returns `None` for an empty panel or when no
/// edges are found (a single-colour panel has no subject).
#[must_use]
pub fn find_content_bounds(panel: &RgbImage, config: &ContentBoundsConfig) -> Option<Rect> {
    let (w, h) = panel.dimensions();
    if w == 0 || h == 0 {
        return None;
    }

    let gray = imageops::grayscale(panel);
    let blurred = gaussian_blur(&gray, config.blur_sigma);
    let edges = canny(&blurred, config.canny_low, config.canny_high);

    let mut extent: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in edges.enumerate_pixels() {
        if p.0[0] == 0 {
            continue;
        }
        extent = Some(match extent {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    extent.map(|(x0, y0, x1, y1)| Rect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}
