//! Image load and save. Both fail soft: problems are logged and reported
//! as `None` / `false`, never as errors.

use std::fs;
use std::path::Path;

use quadsplit_pipeline::RgbImage;
use tracing::{debug, warn};

/// Decode the image at `path` as 8-bit RGB.
///
/// Returns `None` (and logs why) if the file is missing, cannot be
/// decoded, or has no pixels.
#[must_use]
pub fn load_image(path: &Path) -> Option<RgbImage> {
    let image = match image::open(path) {
        Ok(image) => image.into_rgb8(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not load image");
            return None;
        }
    };
    if image.width() == 0 || image.height() == 0 {
        warn!(path = %path.display(), "image has no pixels");
        return None;
    }
    debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "loaded image"
    );
    Some(image)
}

/// Encode `image` to `path`, choosing the format from the extension.
///
/// Missing parent directories are created. Returns whether the file was
/// written.
#[must_use]
pub fn save_image(image: &RgbImage, path: &Path) -> bool {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!(path = %parent.display(), error = %e, "could not create output directory");
        return false;
    }
    match image.save(path) {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not save image");
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn save_creates_directories_and_round_trips_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/panel.png");
        let image = RgbImage::from_fn(6, 4, |x, y| {
            Rgb([u8::try_from(x * 40).unwrap(), 0, u8::try_from(y).unwrap()])
        });
        assert!(save_image(&image, &path));
        assert_eq!(load_image(&path).unwrap(), image);
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_image(&dir.path().join("nope.png")).is_none());
    }

    #[test]
    fn corrupt_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"not a png").unwrap();
        assert!(load_image(&path).is_none());
    }

    #[test]
    fn unknown_extension_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let image = RgbImage::new(2, 2);
        assert!(!save_image(&image, &dir.path().join("panel.xyz")));
    }
}
