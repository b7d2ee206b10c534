//! Re-centre panel subjects on uniform, equally sized canvases.

use image::{Rgb, imageops};
use tracing::{info, warn};

use crate::types::{Panels, Rect, RgbImage};

/// Clip `bounds` to a `width` x `height` panel, `None` if nothing is left.
fn clip(bounds: Rect, width: u32, height: u32) -> Option<Rect> {
    if bounds.is_degenerate() || bounds.x >= width || bounds.y >= height {
        return None;
    }
    Some(Rect::new(
        bounds.x,
        bounds.y,
        bounds.width.min(width - bounds.x),
        bounds.height.min(height - bounds.y),
    ))
}

/// Per-channel median of the panel's four corner pixels.
///
/// With four samples the median is the floored mean of the middle two,
/// so one corner landing on content cannot shift the result.
#[must_use]
pub fn background_color(panel: &RgbImage) -> Rgb<u8> {
    let (w, h) = panel.dimensions();
    if w == 0 || h == 0 {
        return Rgb([0, 0, 0]);
    }
    let corners = [
        panel.get_pixel(0, 0),
        panel.get_pixel(w - 1, 0),
        panel.get_pixel(0, h - 1),
        panel.get_pixel(w - 1, h - 1),
    ];
    Rgb(std::array::from_fn(|c| {
        let mut v = corners.map(|p| u16::from(p.0[c]));
        v.sort_unstable();
        u8::try_from(u16::midpoint(v[1], v[2])).unwrap_or(u8::MAX)
    }))
}

/// Where a `content`-sized subject lands when centred on a `canvas`.
#[must_use]
pub const fn placement(canvas: (u32, u32), content: (u32, u32)) -> Rect {
    Rect::new(
        canvas.0.saturating_sub(content.0) / 2,
        canvas.1.saturating_sub(content.1) / 2,
        content.0,
        content.1,
    )
}

/// Paste each panel's subject, centred, onto a canvas of common size.
///
/// The canvas is the largest valid subject plus `padding` on every side,
/// filled with the panel's own [`background_color`]. Panels whose bounds
/// are degenerate get a background-only canvas. If no panel has valid
/// bounds the panels are returned unchanged.
///
/// The returned bounds are the subject placements on the new canvases
/// (zero for background-only canvases).
#[must_use]
pub fn standardize_and_center(panels: &[RgbImage; 4], bounds: &[Rect; 4], padding: u32) -> Panels {
    let valid: [Option<Rect>; 4] =
        std::array::from_fn(|i| clip(bounds[i], panels[i].width(), panels[i].height()));

    let Some((max_w, max_h)) = valid
        .iter()
        .flatten()
        .map(|b| (b.width, b.height))
        .reduce(|(aw, ah), (bw, bh)| (aw.max(bw), ah.max(bh)))
    else {
        warn!("no panel has valid content bounds; leaving panels unchanged");
        return Panels {
            images: panels.clone(),
            bounds: Some(*bounds),
        };
    };

    let canvas_w = max_w.saturating_add(padding.saturating_mul(2));
    let canvas_h = max_h.saturating_add(padding.saturating_mul(2));
    info!(canvas_w, canvas_h, "standardizing panels");

    let mut placements = [Rect::ZERO; 4];
    let images = std::array::from_fn(|i| {
        let panel = &panels[i];
        let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, background_color(panel));
        if let Some(b) = valid[i] {
            let subject = imageops::crop_imm(panel, b.x, b.y, b.width, b.height).to_image();
            let at = placement((canvas_w, canvas_h), (b.width, b.height));
            imageops::replace(&mut canvas, &subject, i64::from(at.x), i64::from(at.y));
            placements[i] = at;
        }
        canvas
    });

    Panels {
        images,
        bounds: Some(placements),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BG: Rgb<u8> = Rgb([250, 245, 240]);
    const INK: Rgb<u8> = Rgb([10, 20, 30]);

    /// Panel of `size` with an `INK` subject at `subject`.
    fn panel(size: (u32, u32), subject: Rect) -> RgbImage {
        RgbImage::from_fn(size.0, size.1, |x, y| {
            if x >= subject.x && x < subject.right() && y >= subject.y && y < subject.bottom() {
                INK
            } else {
                BG
            }
        })
    }

    fn sample() -> ([RgbImage; 4], [Rect; 4]) {
        let bounds = [
            Rect::new(5, 5, 20, 10),
            Rect::new(0, 10, 30, 8),
            Rect::new(12, 3, 10, 25),
            Rect::ZERO,
        ];
        let panels = [
            panel((40, 30), bounds[0]),
            panel((50, 30), bounds[1]),
            panel((35, 40), bounds[2]),
            RgbImage::from_pixel(20, 20, Rgb([0, 0, 255])),
        ];
        (panels, bounds)
    }

    #[test]
    fn canvases_share_size_from_largest_subject() {
        let (panels, bounds) = sample();
        let out = standardize_and_center(&panels, &bounds, 4);
        for img in &out.images {
            assert_eq!(img.dimensions(), (38, 33));
        }
    }

    #[test]
    fn subject_is_centered_on_own_background() {
        let (panels, bounds) = sample();
        let out = standardize_and_center(&panels, &bounds, 4);
        let at = out.bounds.unwrap()[0];
        assert_eq!(at, Rect::new(9, 11, 20, 10));
        let img = &out.images[0];
        assert_eq!(img.get_pixel(at.x, at.y), &INK);
        assert_eq!(img.get_pixel(at.right() - 1, at.bottom() - 1), &INK);
        assert_eq!(img.get_pixel(at.x - 1, at.y), &BG);
        assert_eq!(img.get_pixel(0, 0), &BG);
    }

    #[test]
    fn degenerate_panel_gets_background_canvas() {
        let (panels, bounds) = sample();
        let out = standardize_and_center(&panels, &bounds, 4);
        assert_eq!(out.bounds.unwrap()[3], Rect::ZERO);
        assert!(out.images[3].pixels().all(|p| *p == Rgb([0, 0, 255])));
    }

    #[test]
    fn no_valid_bounds_returns_panels_unchanged() {
        let (panels, _) = sample();
        let out = standardize_and_center(&panels, &[Rect::ZERO; 4], 4);
        for (a, b) in out.images.iter().zip(&panels) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn rerun_on_output_is_a_fixed_point() {
        let (panels, bounds) = sample();
        let first = standardize_and_center(&panels, &bounds, 4);
        let second = standardize_and_center(&first.images, &first.bounds.unwrap(), 4);
        for (a, b) in first.images.iter().zip(&second.images) {
            assert_eq!(a.dimensions(), b.dimensions());
        }
        assert_eq!(first.images[0], second.images[0]);
    }

    #[test]
    fn background_ignores_one_content_corner() {
        let mut img = RgbImage::from_pixel(10, 10, Rgb([200, 200, 200]));
        img.put_pixel(0, 0, Rgb([0, 0, 0]));
        assert_eq!(background_color(&img), Rgb([200, 200, 200]));
    }

    #[test]
    fn background_of_two_tone_corners_is_their_mean() {
        let img = RgbImage::from_fn(4, 4, |x, _| {
            if x < 2 { Rgb([100, 0, 51]) } else { Rgb([201, 0, 50]) }
        });
        assert_eq!(background_color(&img), Rgb([150, 0, 50]));
    }

    #[test]
    fn oversized_bounds_are_clipped() {
        assert_eq!(clip(Rect::new(5, 5, 100, 3), 20, 20), Some(Rect::new(5, 5, 15, 3)));
        assert_eq!(clip(Rect::new(25, 5, 1, 1), 20, 20), None);
    }
}
