//! Embedded image extraction: decoded pixels → files under the image directory.
//!
//! Each image is handled in isolation. A decode, encode or write failure is
//! logged, reported through the progress callback and collected as an
//! [`ImageError`]; the rest of the document converts as usual.
//!
//! JPEG has no alpha channel, so JPEG output is always encoded from an RGB8
//! copy of the pixels.

use crate::config::ImageConfig;
use crate::error::ImageError;
use crate::pipeline::decode::{DecodedImage, ImageSlot, LoadedDocument};
use crate::progress::ProgressCallback;
use image::{DynamicImage, ImageFormat};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, error, info};

/// Where extracted images went, keyed by 0-based page index.
pub type ImageLocations = BTreeMap<usize, Vec<String>>;

/// Result of [`extract_images`].
#[derive(Debug, Clone, Default)]
pub struct ImageExtraction {
    /// File names (relative to the image directory) per 0-based page index,
    /// in extraction order.
    pub locations: ImageLocations,
    pub saved: usize,
    /// Images dropped for being smaller than `min_size`.
    pub skipped_small: usize,
    pub errors: Vec<ImageError>,
}

/// Saves images one at a time as they are handed over.
///
/// Used as the decoder's image sink so that pixel buffers are released as
/// soon as each image is written.
pub struct ImageExtractor<'a> {
    image_dir: &'a Path,
    config: &'a ImageConfig,
    callback: Option<&'a ProgressCallback>,
    out: ImageExtraction,
}

impl<'a> ImageExtractor<'a> {
    /// `image_dir` must already exist.
    pub fn new(
        image_dir: &'a Path,
        config: &'a ImageConfig,
        callback: Option<&'a ProgressCallback>,
    ) -> Self {
        Self {
            image_dir,
            config,
            callback,
            out: ImageExtraction::default(),
        }
    }

    /// Filter, encode and save one decoded image. Indices are 0-based.
    pub fn accept(&mut self, page_idx: usize, img_idx: usize, slot: ImageSlot) {
        let result = match slot {
            Ok(decoded) => save_image(&decoded, page_idx, img_idx, self.image_dir, self.config),
            Err(detail) => Err(ImageError::Decode {
                page: page_idx + 1,
                index: img_idx + 1,
                detail,
            }),
        };

        match result {
            Ok(Some(filename)) => {
                self.out.locations.entry(page_idx).or_default().push(filename);
                self.out.saved += 1;
            }
            Ok(None) => self.out.skipped_small += 1,
            Err(e) => {
                error!("Error extracting image {} on page {}: {}", img_idx + 1, page_idx + 1, e);
                if let Some(cb) = self.callback {
                    cb.on_image_error(page_idx + 1, &e.to_string());
                }
                self.out.errors.push(e);
            }
        }
    }

    pub fn finish(self) -> ImageExtraction {
        info!(
            "Extracted {} images ({} too small, {} failed)",
            self.out.saved,
            self.out.skipped_small,
            self.out.errors.len()
        );
        self.out
    }
}

/// Save every sufficiently large embedded image of `doc` into `image_dir`.
///
/// The image slots are moved out of the pages, so `doc` carries no pixel
/// data afterwards. `image_dir` must already exist.
pub fn extract_images(
    doc: &mut LoadedDocument,
    image_dir: &Path,
    config: &ImageConfig,
    callback: Option<&ProgressCallback>,
) -> ImageExtraction {
    let mut extractor = ImageExtractor::new(image_dir, config, callback);
    for (page_idx, page) in doc.pages.iter_mut().enumerate() {
        for (img_idx, slot) in std::mem::take(&mut page.images).into_iter().enumerate() {
            extractor.accept(page_idx, img_idx, slot);
        }
    }
    extractor.finish()
}

/// `Ok(None)` when the image is below the size threshold.
fn save_image(
    decoded: &DecodedImage,
    page_idx: usize,
    img_idx: usize,
    image_dir: &Path,
    config: &ImageConfig,
) -> Result<Option<String>, ImageError> {
    let (width, height) = (decoded.image.width(), decoded.image.height());
    if width.min(height) < config.min_size {
        debug!(
            "Skipping {}x{} image {} on page {}",
            width,
            height,
            img_idx + 1,
            page_idx + 1
        );
        return Ok(None);
    }

    let ext = choose_extension(&decoded.source_ext, &config.formats);
    let bytes = encode_image(&decoded.image, &ext).map_err(|e| ImageError::Encode {
        page: page_idx + 1,
        index: img_idx + 1,
        format: ext.clone(),
        detail: e.to_string(),
    })?;

    let filename = image_filename(page_idx, img_idx, &ext);
    let path = image_dir.join(&filename);
    std::fs::write(&path, bytes).map_err(|e| ImageError::Save {
        path: path.clone(),
        detail: e.to_string(),
    })?;

    debug!("Saved {}", path.display());
    Ok(Some(filename))
}

/// `image_p<page>_<n>.<ext>`, both numbers 1-based.
pub fn image_filename(page_idx: usize, img_idx: usize, ext: &str) -> String {
    format!("image_p{}_{}.{}", page_idx + 1, img_idx + 1, ext)
}

/// The source extension when it is an allowed output format, else `png`.
pub fn choose_extension(source_ext: &str, formats: &[String]) -> String {
    let source = source_ext.to_ascii_lowercase();
    if formats.iter().any(|f| f.eq_ignore_ascii_case(&source)) {
        source
    } else {
        "png".to_string()
    }
}

/// Encode `img` in the format named by `ext`. Unknown extensions encode as PNG.
pub fn encode_image(img: &DynamicImage, ext: &str) -> Result<Vec<u8>, image::ImageError> {
    let format = ImageFormat::from_extension(ext).unwrap_or(ImageFormat::Png);
    let mut buf = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            DynamicImage::ImageRgb8(img.to_rgb8()).write_to(&mut Cursor::new(&mut buf), format)?
        }
        _ => img.write_to(&mut Cursor::new(&mut buf), format)?,
    }
    Ok(buf)
}
