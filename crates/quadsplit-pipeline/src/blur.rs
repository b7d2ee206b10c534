//! Gaussian blur for noise reduction before edge detection.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`] so that high-frequency
//! texture inside a panel does not register as subject edges.

use image::GrayImage;

/// Apply Gaussian blur to a grayscale image.
///
/// Non-positive sigma values return the image unchanged, since
/// `imageproc`'s underlying function panics on `sigma <= 0.0`.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    imageproc::filter::gaussian_blur_f32(image, sigma)
}
