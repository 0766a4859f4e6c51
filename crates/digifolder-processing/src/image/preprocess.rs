use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;

use super::orientation::ImageOrientation;
use crate::error::ConversionResult;

/// A page image ready for OCR or PDF embedding.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Orientation fix, bounded resize and JPEG re-encoding.
///
/// Images already inside the bounds are never upscaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePreprocessor {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: u8,
}

impl ImagePreprocessor {
    /// Profile applied before OCR.
    pub const OCR: Self = Self {
        max_width: 2000,
        max_height: 2000,
        quality: 90,
    };

    /// Profile applied to pages combined into a PDF.
    pub const PDF_PAGE: Self = Self {
        max_width: 1700,
        max_height: 2200,
        quality: 80,
    };

    pub fn prepare(&self, data: &[u8]) -> ConversionResult<PreparedImage> {
        let img = decode(data)?;
        let img = ImageOrientation::normalize(img, data);
        let img = self.fit(img);
        let (width, height) = img.dimensions();

        let mut jpeg = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut jpeg, self.quality);
        DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;

        tracing::debug!(
            width = width,
            height = height,
            input_bytes = data.len(),
            output_bytes = jpeg.len(),
            quality = self.quality,
            "Image prepared"
        );

        Ok(PreparedImage {
            jpeg,
            width,
            height,
        })
    }

    fn fit(&self, img: DynamicImage) -> DynamicImage {
        let (width, height) = img.dimensions();
        if width <= self.max_width && height <= self.max_height {
            return img;
        }
        img.resize(self.max_width, self.max_height, FilterType::Lanczos3)
    }
}

fn decode(data: &[u8]) -> ConversionResult<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    Ok(reader.decode()?)
}
