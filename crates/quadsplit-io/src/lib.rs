//! quadsplit-io: File-system shell around the sans-IO splitting core.
//!
//! Loads and saves images, reads the YAML configuration, renders debug
//! overlays and drives whole directories through a shared
//! [`Pipeline`](quadsplit_pipeline::Pipeline) in parallel.

pub mod batch;
pub mod config;
pub mod debug;
pub mod error;
pub mod image_io;

pub use batch::{BatchOptions, BatchSummary, FileReport, FileStatus, run_batch};
pub use config::{load_config, parse_config};
pub use error::IoError;
pub use image_io::{load_image, save_image};
