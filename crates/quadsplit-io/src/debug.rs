//! Debug overlays: draw a strategy's internal geometry onto a copy of the
//! composite.
//!
//! Rendering reads a finished [`SplitResult`] and writes a separate file;
//! nothing here feeds back into splitting.

use std::path::{Path, PathBuf};

use image::Rgb;
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use quadsplit_pipeline::{Axis, DebugArtifact, DebugArtifacts, Rect, RgbImage, SplitResult};
use tracing::debug;

use crate::image_io::save_image;

/// Stroke width of rectangle outlines, in pixels.
const LINE_THICKNESS: u32 = 3;

const SEED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const DIVIDER_COLOR: Rgb<u8> = Rgb([0, 90, 255]);
const CANDIDATE_COLOR: Rgb<u8> = Rgb([255, 200, 0]);
const SELECTED_COLOR: Rgb<u8> = Rgb([0, 200, 0]);

/// Outline `rect` with [`LINE_THICKNESS`] nested strokes, clipped to the canvas.
fn outline(canvas: &mut RgbImage, rect: Rect, color: Rgb<u8>) {
    let (w, h) = canvas.dimensions();
    if rect.x >= w || rect.y >= h {
        return;
    }
    let rw = rect.width.min(w - rect.x);
    let rh = rect.height.min(h - rect.y);
    for t in 0..LINE_THICKNESS {
        let inner_w = rw.saturating_sub(2 * t);
        let inner_h = rh.saturating_sub(2 * t);
        if inner_w == 0 || inner_h == 0 {
            break;
        }
        let (Ok(x), Ok(y)) = (i32::try_from(rect.x + t), i32::try_from(rect.y + t)) else {
            return;
        };
        draw_hollow_rect_mut(
            canvas,
            imageproc::rect::Rect::at(x, y).of_size(inner_w, inner_h),
            color,
        );
    }
}

/// Draw a full-length line across the canvas at `position` along `axis`.
#[allow(clippy::cast_precision_loss)]
fn seed_line(canvas: &mut RgbImage, axis: Axis, position: u32) {
    let (w, h) = canvas.dimensions();
    let p = position as f32;
    let (start, end) = match axis {
        Axis::Horizontal => ((0.0, p), (w.saturating_sub(1) as f32, p)),
        Axis::Vertical => ((p, 0.0), (p, h.saturating_sub(1) as f32)),
    };
    draw_line_segment_mut(canvas, start, end, SEED_COLOR);
}

/// A copy of `image` with every drawable artifact overlaid.
///
/// Seed lines are red, divider extents blue, contour candidates yellow
/// and the selected contour boxes green. Scalars are not drawn.
#[must_use]
pub fn render_overlay(image: &RgbImage, artifacts: &DebugArtifacts) -> RgbImage {
    let mut canvas = image.clone();
    for (name, artifact) in artifacts {
        match artifact {
            DebugArtifact::SeedLine { axis, position } => seed_line(&mut canvas, *axis, *position),
            DebugArtifact::Divider(d) => outline(
                &mut canvas,
                Rect::new(d.x_start, d.y_start, d.width(), d.height()),
                DIVIDER_COLOR,
            ),
            DebugArtifact::Boxes(boxes) => {
                let color = if name == "selected" {
                    SELECTED_COLOR
                } else {
                    CANDIDATE_COLOR
                };
                for b in boxes {
                    outline(&mut canvas, *b, color);
                }
            }
            DebugArtifact::Scalar(_) => {}
        }
    }
    canvas
}

/// `<debug_dir>/<stem>_debug_<strategy><ext>` for a source file.
#[must_use]
pub fn debug_path(debug_dir: &Path, source: &Path, strategy: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map_or_else(|| "image".into(), |s| s.to_string_lossy());
    let ext = source
        .extension()
        .map_or_else(String::new, |e| format!(".{}", e.to_string_lossy()));
    debug_dir.join(format!("{stem}_debug_{strategy}{ext}"))
}

/// Render and save the overlay for `result`, if it carries any artifacts.
///
/// Returns the written path.
pub fn save_debug_overlay(
    image: &RgbImage,
    result: &SplitResult,
    source: &Path,
    debug_dir: &Path,
) -> Option<PathBuf> {
    if result.debug_artifacts.is_empty() {
        return None;
    }
    let path = debug_path(debug_dir, source, result.strategy_used);
    let overlay = render_overlay(image, &result.debug_artifacts);
    save_image(&overlay, &path).then(|| {
        debug!(path = %path.display(), "wrote debug overlay");
        path
    })
}
