//! JPEG downscaling

use crate::error::{AppError, Result};
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, GenericImageView};

/// A re-encoded image and its dimensions
#[derive(Debug, Clone)]
pub struct ResizedJpeg {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode `bytes`, shrink so the longest side is at most `max_dim`, re-encode as JPEG
///
/// Aspect ratio is preserved and smaller images keep their size.
pub fn resize_jpeg(bytes: &[u8], max_dim: u32, quality: u8) -> Result<ResizedJpeg> {
    if max_dim == 0 {
        return Err(AppError::validation("Resize dimension must be positive"));
    }

    let img = image::load_from_memory(bytes)?;
    let (width, height) = img.dimensions();

    let img = if width.max(height) > max_dim {
        img.resize(max_dim, max_dim, FilterType::Lanczos3)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, quality.clamp(1, 100)).encode_image(&rgb)?;

    Ok(ResizedJpeg {
        data,
        width: rgb.width(),
        height: rgb.height(),
    })
}
