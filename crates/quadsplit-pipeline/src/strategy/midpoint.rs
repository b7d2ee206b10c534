use tracing::debug;

use super::{SplitStrategy, StrategyKind, crop, grid_cells};
use crate::types::{Axis, DebugArtifact, DebugArtifacts, Panels, Rect, RgbImage, SplitError, SplitResult};

/// Cuts the image into four quadrants at the exact pixel midpoints.
///
/// Succeeds for any image at least 2x2 with a fixed, deliberately low
/// confidence so it only wins when nothing better is available. Performs
/// no content analysis, so the bounds are all zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MidpointFallback;

impl MidpointFallback {
    /// Confidence reported for every successful split.
    pub const CONFIDENCE: f64 = 0.2;
}

impl SplitStrategy for MidpointFallback {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MidpointFallback
    }

    fn split(&self, image: &RgbImage, filename: &str) -> SplitResult {
        let name = self.kind().as_str();
        let (width, height) = image.dimensions();
        if width < 2 || height < 2 {
            return SplitResult::failure(name, SplitError::EmptyImage { width, height });
        }

        let (mid_x, mid_y) = (width / 2, height / 2);
        debug!(filename, mid_x, mid_y, "splitting at midpoints");
        let cells = grid_cells(width, height, (mid_x, mid_x), (mid_y, mid_y));

        let mut artifacts = DebugArtifacts::new();
        artifacts.insert(
            "mid_x".to_owned(),
            DebugArtifact::SeedLine {
                axis: Axis::Vertical,
                position: mid_x,
            },
        );
        artifacts.insert(
            "mid_y".to_owned(),
            DebugArtifact::SeedLine {
                axis: Axis::Horizontal,
                position: mid_y,
            },
        );

        SplitResult::success(
            name,
            Self::CONFIDENCE,
            Panels {
                images: cells.map(|cell| crop(image, cell)),
                bounds: Some([Rect::ZERO; 4]),
            },
        )
        .with_artifacts(artifacts)
    }
}
