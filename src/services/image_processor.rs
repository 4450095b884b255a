// src/services/image_processor.rs
use crate::errors::ShelfScanError;
use crate::models::CapturedImage;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use image::{GenericImageView, ImageFormat as ImgFormat};

const MAX_DIMENSION: u32 = 8192;

/// Checks captured uploads before they are handed to the model.
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_image(&self, data: &[u8]) -> Result<ImgFormat, ShelfScanError> {
        let format = image::guess_format(data)
            .map_err(|e| ShelfScanError::ImageProcessing(format!("Unrecognised image: {}", e)))?;

        let img = image::load_from_memory_with_format(data, format)
            .map_err(|e| ShelfScanError::ImageProcessing(format!("Invalid image format: {}", e)))?;

        let (width, height) = img.dimensions();

        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(ShelfScanError::ImageProcessing(format!(
                "Image dimensions exceed {MAX_DIMENSION}x{MAX_DIMENSION}"
            )));
        }

        Ok(format)
    }

    /// Validates an upload and wraps it with a data-URL preview.
    pub fn capture(&self, filename: String, data: Vec<u8>) -> Result<CapturedImage, ShelfScanError> {
        let format = self.validate_image(&data)?;
        let mime_type = format.to_mime_type().to_string();
        let preview = format!(
            "data:{};base64,{}",
            mime_type,
            general_purpose::STANDARD.encode(&data)
        );

        Ok(CapturedImage {
            filename,
            mime_type,
            data: Bytes::from(data),
            preview,
        })
    }

    /// File extension for generated image bytes, `jpg` when the format is unknown.
    pub fn extension_for(data: &[u8]) -> &'static str {
        match image::guess_format(data) {
            Ok(ImgFormat::Png) => "png",
            Ok(ImgFormat::WebP) => "webp",
            Ok(ImgFormat::Gif) => "gif",
            _ => "jpg",
        }
    }

    pub fn content_type_for(data: &[u8]) -> &'static str {
        image::guess_format(data)
            .map(|f| f.to_mime_type())
            .unwrap_or("image/jpeg")
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::png_bytes;

    #[test]
    fn capture_builds_data_url_preview() {
        let processor = ImageProcessor::new();
        let image = processor.capture("shelf.png".into(), png_bytes(4, 3)).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert!(image.preview.starts_with("data:image/png;base64,"));
        assert_eq!(image.filename, "shelf.png");
    }

    #[test]
    fn rejects_non_image_payload() {
        let processor = ImageProcessor::new();
        let err = processor.capture("notes.txt".into(), b"hello".to_vec()).unwrap_err();
        assert!(matches!(err, ShelfScanError::ImageProcessing(_)));
    }

    #[test]
    fn extension_follows_image_bytes() {
        assert_eq!(ImageProcessor::extension_for(&png_bytes(1, 1)), "png");
        assert_eq!(ImageProcessor::extension_for(b"????"), "jpg");
        assert_eq!(ImageProcessor::content_type_for(b"????"), "image/jpeg");
    }
}
