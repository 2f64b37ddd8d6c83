//! Image transformer - derives fixed-width thumbnails from source images
//!
//! Resizes to a fixed target width with proportional height and re-encodes in
//! the input format, so the bytes always match the declared content type.
//!
//! Uses `spawn_blocking` for the CPU-intensive work to avoid blocking the
//! async runtime.

use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use image::imageops::FilterType;
use image::{GenericImageView, ImageOutputFormat};
use tracing::debug;

use crate::config::DEFAULT_TARGET_WIDTH;
use crate::error::{Result, WorkerError};

/// Configuration for thumbnail generation
#[derive(Clone, Debug)]
pub struct ResizeConfig {
    /// Target width in pixels; height scales proportionally
    pub target_width: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_TARGET_WIDTH,
        }
    }
}

/// Thumbnail processor
pub struct ThumbnailProcessor {
    config: ResizeConfig,
}

impl ThumbnailProcessor {
    /// Create a new processor with the given configuration
    pub fn new(config: ResizeConfig) -> Self {
        Self { config }
    }

    /// Create a processor with default configuration
    pub fn with_defaults() -> Self {
        Self::new(ResizeConfig::default())
    }

    /// Generate a thumbnail from the given image data (blocking version)
    ///
    /// **Note:** This method performs CPU-intensive operations and should not
    /// be called directly from async code. Use `generate_async` instead.
    pub fn generate(&self, original: &[u8]) -> Result<Bytes> {
        let format = image::guess_format(original)
            .map_err(|e| WorkerError::Transform(format!("unrecognized image format: {e}")))?;
        let img = image::load_from_memory_with_format(original, format)
            .map_err(|e| WorkerError::Transform(format!("failed to decode image: {e}")))?;

        let (orig_w, orig_h) = img.dimensions();
        let (new_w, new_h) = self.target_dimensions(orig_w, orig_h);

        debug!(
            original_width = orig_w,
            original_height = orig_h,
            width = new_w,
            height = new_h,
            "Resizing image"
        );

        let resized = img.resize_exact(new_w, new_h, FilterType::Triangle);

        // Re-encode in the source format; the stored content type stays the
        // source's, so the bytes have to match it.
        let mut buf = Vec::new();
        resized
            .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::from(format))
            .map_err(|e| WorkerError::Transform(format!("failed to encode thumbnail: {e}")))?;

        Ok(Bytes::from(buf))
    }

    /// Generate a thumbnail asynchronously on the blocking thread pool.
    ///
    /// Pure CPU work with no shared mutable state; safe to run concurrently
    /// across jobs.
    pub async fn generate_async(self: Arc<Self>, original: Bytes) -> Result<Bytes> {
        let processor = self.clone();

        tokio::task::spawn_blocking(move || processor.generate(&original))
            .await
            .map_err(|e| WorkerError::Transform(format!("thumbnail task panicked: {e}")))?
    }

    /// Fixed target width, height scaled by the same ratio
    fn target_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let ratio = self.config.target_width as f32 / width as f32;
        let new_h = ((height as f32) * ratio).round() as u32;
        (self.config.target_width, new_h.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .expect("encode test png");
        buf
    }

    #[test]
    fn test_target_dimensions_landscape() {
        let processor = ThumbnailProcessor::with_defaults();
        assert_eq!(processor.target_dimensions(400, 300), (200, 150));
    }

    #[test]
    fn test_target_dimensions_portrait() {
        let processor = ThumbnailProcessor::with_defaults();
        assert_eq!(processor.target_dimensions(300, 600), (200, 400));
    }

    #[test]
    fn test_target_dimensions_never_zero_height() {
        let processor = ThumbnailProcessor::with_defaults();
        assert_eq!(processor.target_dimensions(4000, 1), (200, 1));
    }

    #[test]
    fn test_generate_resizes_and_keeps_format() {
        let processor = ThumbnailProcessor::with_defaults();
        let thumb = processor.generate(&png_bytes(400, 300)).unwrap();

        assert_eq!(image::guess_format(&thumb).unwrap(), ImageFormat::Png);
        let img = image::load_from_memory(&thumb).unwrap();
        assert_eq!(img.dimensions(), (200, 150));
    }

    #[test]
    fn test_generate_rejects_undecodable_input() {
        let processor = ThumbnailProcessor::with_defaults();
        let err = processor.generate(b"not an image").unwrap_err();
        assert!(matches!(err, WorkerError::Transform(_)));
    }

    #[test]
    fn test_generate_rejects_unencodable_format() {
        // Radiance HDR decodes but has no encoder, so re-encoding in the
        // source format must fail
        let mut data = Vec::new();
        data.extend_from_slice(b"#?RADIANCE\n");
        data.extend_from_slice(b"FORMAT=32-bit_rle_rgbe\n\n");
        data.extend_from_slice(b"-Y 1 +X 1\n");
        data.extend_from_slice(&[0x80, 0x80, 0x80, 0x81]);

        let processor = ThumbnailProcessor::with_defaults();
        let err = processor.generate(&data).unwrap_err();
        assert!(matches!(err, WorkerError::Transform(_)));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let processor = ThumbnailProcessor::with_defaults();
        let data = png_bytes(640, 480);
        let first = processor.generate(&data).unwrap();
        let second = processor.generate(&data).unwrap();
        assert_eq!(first, second);
    }
}
