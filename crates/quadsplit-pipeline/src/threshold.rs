//! Binarization for contour extraction: local-mean thresholding and
//! morphological blob merging.

use image::GrayImage;
use image::imageops;
use imageproc::contrast;
use imageproc::distance_transform::Norm;
use imageproc::morphology;

/// Mark pixels darker than their neighbourhood as foreground.
///
/// A pixel becomes 255 when its value is below the mean of the
/// `(2r + 1)`-square window around it (clipped to the image) minus
/// `offset`; everything else is 0. Uniform regions, whatever their
/// colour, come out as background, so only the dark side of each
/// content boundary survives. A radius of zero is treated as one.
#[must_use]
pub fn adaptive_threshold(gray: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return GrayImage::new(w, h);
    }
    // imageproc keeps pixels at or above `mean - offset`; the rest is ours.
    let mut binary = contrast::adaptive_threshold(gray, block_radius.max(1), offset);
    imageops::invert(&mut binary);
    binary
}

/// Close then open a binary mask so each panel's content forms one blob.
///
/// Closing bridges gaps up to `close_radius`; opening then removes specks
/// thinner than `open_radius`. A radius of zero skips that step.
#[must_use]
pub fn merge_blobs(binary: &GrayImage, close_radius: u8, open_radius: u8) -> GrayImage {
    let closed = if close_radius > 0 {
        morphology::close(binary, Norm::LInf, close_radius)
    } else {
        binary.clone()
    };
    if open_radius > 0 {
        morphology::open(&closed, Norm::LInf, open_radius)
    } else {
        closed
    }
}
