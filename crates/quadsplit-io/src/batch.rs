//! Batch driver: split every supported image in a directory.
//!
//! Files are independent, so they are processed in parallel on the
//! current rayon pool with one shared, read-only [`Pipeline`]. A file
//! that cannot be read, split or written is recorded in the summary and
//! the batch moves on.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use quadsplit_pipeline::{ImageDiagnostics, ImageType, Pipeline, Quadrant};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::debug::save_debug_overlay;
use crate::error::IoError;
use crate::image_io::{load_image, save_image};

/// Lower-case extensions the batch driver picks up.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tiff"];

/// Whether `path` has a supported image extension (case-insensitive).
#[must_use]
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SUPPORTED_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
}

/// Supported image files directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns [`IoError::InputDir`] if `dir` cannot be listed.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>, IoError> {
    let entries = fs::read_dir(dir).map_err(|source| IoError::InputDir {
        path: dir.to_owned(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|p| p.is_file() && is_supported(p))
        .collect();
    files.sort();
    Ok(files)
}

/// The four output paths for `source`: `<stem>_<suffix><ext>` in `output_dir`.
#[must_use]
pub fn output_paths(output_dir: &Path, source: &Path) -> [PathBuf; 4] {
    let stem = source
        .file_stem()
        .map_or_else(|| "image".into(), |s| s.to_string_lossy());
    let ext = source
        .extension()
        .map_or_else(|| ".png".to_owned(), |e| format!(".{}", e.to_string_lossy()));
    Quadrant::ALL.map(|q| output_dir.join(format!("{stem}_{}{ext}", q.suffix())))
}

/// Where batch output goes.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory receiving the split panels.
    pub output_dir: PathBuf,
    /// Directory receiving debug overlays; `None` disables them.
    pub debug_dir: Option<PathBuf>,
}

/// What happened to one input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// All four panels were written.
    Split,
    /// The image loaded but every strategy failed.
    Failed,
    /// The image could not be loaded.
    Unreadable,
    /// The split succeeded but at least one panel could not be written.
    WriteFailed,
}

/// Per-file line of the batch summary.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Input file.
    pub file: PathBuf,
    /// Outcome.
    pub status: FileStatus,
    /// Classifier verdict, if the image loaded.
    pub image_type: Option<ImageType>,
    /// Winning (or terminal) strategy name, if the image loaded.
    pub strategy: Option<String>,
    /// Confidence of the winning result; 0 on failure.
    pub confidence: f64,
    /// Failure reason.
    pub error: Option<String>,
    /// Panel files written.
    pub outputs: Vec<PathBuf>,
    /// Debug overlay written, if any.
    pub debug_image: Option<PathBuf>,
    /// Strategy attempts that did not produce the result.
    pub rejected_attempts: usize,
    /// Classifier statistics and strategy attempts.
    pub diagnostics: Option<ImageDiagnostics>,
}

impl FileReport {
    fn unreadable(file: &Path) -> Self {
        Self {
            file: file.to_owned(),
            status: FileStatus::Unreadable,
            image_type: None,
            strategy: None,
            confidence: 0.0,
            error: Some("could not load image".to_owned()),
            outputs: Vec::new(),
            debug_image: None,
            rejected_attempts: 0,
            diagnostics: None,
        }
    }
}

/// Result of a whole batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// Files found.
    pub total: usize,
    /// Files whose four panels were written.
    pub succeeded: usize,
    /// Everything else.
    pub failed: usize,
    /// Wall-clock time of the batch in seconds.
    pub elapsed_secs: f64,
    /// One entry per file, in input order.
    pub files: Vec<FileReport>,
}

impl BatchSummary {
    fn from_reports(files: Vec<FileReport>, elapsed_secs: f64) -> Self {
        let succeeded = files
            .iter()
            .filter(|f| f.status == FileStatus::Split)
            .count();
        Self {
            total: files.len(),
            succeeded,
            failed: files.len() - succeeded,
            elapsed_secs,
            files,
        }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Summary`] if serialization fails.
    pub fn to_json(&self) -> Result<String, IoError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Load, split and save one file.
#[must_use]
pub fn process_file(pipeline: &Pipeline, path: &Path, options: &BatchOptions) -> FileReport {
    let Some(image) = load_image(path) else {
        return FileReport::unreadable(path);
    };
    let filename = path
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());

    let outcome = pipeline.process(&image, &filename);

    let debug_image = options
        .debug_dir
        .as_deref()
        .and_then(|dir| save_debug_overlay(&image, &outcome.result, path, dir));

    let mut report = FileReport {
        file: path.to_owned(),
        status: FileStatus::Failed,
        image_type: Some(outcome.image_type),
        strategy: Some(outcome.result.strategy_used.to_owned()),
        confidence: outcome.result.confidence,
        error: outcome.result.error_message(),
        outputs: Vec::new(),
        debug_image,
        rejected_attempts: outcome.diagnostics.rejected_attempts(),
        diagnostics: None,
    };
    debug!(
        file = %filename,
        attempts = outcome.diagnostics.attempts.len(),
        rejected = report.rejected_attempts,
        "strategy attempts"
    );

    if let Some(panels) = outcome.result.images() {
        let targets = output_paths(&options.output_dir, path);
        for (panel, target) in panels.iter().zip(targets) {
            if save_image(panel, &target) {
                report.outputs.push(target);
            }
        }
        if report.outputs.len() == panels.len() {
            report.status = FileStatus::Split;
            info!(file = %filename, strategy = outcome.result.strategy_used, "wrote panels");
        } else {
            report.status = FileStatus::WriteFailed;
            report.error = Some("failed to write one or more panels".to_owned());
        }
    }
    report.diagnostics = Some(outcome.diagnostics);
    report
}

/// Split every supported image in `input_dir`.
///
/// # Errors
///
/// Returns [`IoError::InputDir`] if the directory cannot be listed.
/// Per-file problems are reported in the summary instead.
pub fn run_batch(
    pipeline: &Pipeline,
    input_dir: &Path,
    options: &BatchOptions,
) -> Result<BatchSummary, IoError> {
    let files = collect_images(input_dir)?;
    if files.is_empty() {
        warn!(dir = %input_dir.display(), "no supported images found");
    } else {
        info!(count = files.len(), dir = %input_dir.display(), "processing images");
    }

    let start = Instant::now();
    let reports: Vec<FileReport> = files
        .par_iter()
        .map(|path| process_file(pipeline, path, options))
        .collect();
    let summary = BatchSummary::from_reports(reports, start.elapsed().as_secs_f64());

    if summary.failed > 0 {
        error!(
            failed = summary.failed,
            total = summary.total,
            "some images could not be split"
        );
    }
    info!(
        succeeded = summary.succeeded,
        total = summary.total,
        elapsed_secs = summary.elapsed_secs,
        "batch complete"
    );
    Ok(summary)
}
