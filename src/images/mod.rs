//! Sample image acquisition: download, cache and optional resizing

pub mod cache;
pub mod fetch;
pub mod resize;

pub use cache::ImageCache;
pub use fetch::ImageFetcher;
pub use resize::{resize_jpeg, ResizedJpeg};

use crate::{
    error::{AppError, ErrorContext, Result},
    logging::Logger,
    models::{Config, SampleImage},
};

/// Load every configured image, through the cache, resized when requested
pub async fn prepare_images(config: &Config, logger: &Logger) -> Result<Vec<SampleImage>> {
    let cache = ImageCache::new(&config.cache_dir);
    let fetcher = ImageFetcher::new()?;

    let mut images = Vec::with_capacity(config.image_urls.len());
    for url in &config.image_urls {
        let (bytes, hit) = cache
            .get_or_fetch(url, &fetcher)
            .await
            .with_context(|| format!("Loading image {}", url))?;

        logger
            .info(if hit { "Image loaded from cache" } else { "Image downloaded" })
            .field("url", url)
            .field("bytes", bytes.len())
            .field("cache_file", cache.path_for(url))
            .log()
            .await;

        let image = match config.resize_max_dim {
            Some(max_dim) => resize_image(url, bytes, max_dim, config.jpeg_quality, logger).await?,
            None => SampleImage::original(url.clone(), bytes),
        };
        images.push(image);
    }

    if images.is_empty() {
        return Err(AppError::config("No images configured"));
    }

    Ok(images)
}

async fn resize_image(
    url: &str,
    bytes: Vec<u8>,
    max_dim: u32,
    quality: u8,
    logger: &Logger,
) -> Result<SampleImage> {
    let original_bytes = bytes.len();

    // Decoding and encoding are CPU bound
    let resized = tokio::task::spawn_blocking(move || resize_jpeg(&bytes, max_dim, quality))
        .await
        .map_err(|e| AppError::internal(format!("Resize task failed: {}", e)))?
        .with_context(|| format!("Resizing image {}", url))?;

    logger
        .info("Image resized")
        .field("url", url)
        .field("width", resized.width)
        .field("height", resized.height)
        .field("original_bytes", original_bytes)
        .field("bytes", resized.data.len())
        .log()
        .await;

    Ok(SampleImage::resized(
        url,
        resized.data,
        original_bytes,
        (resized.width, resized.height),
    ))
}
