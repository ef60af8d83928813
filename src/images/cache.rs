//! Flat on-disk cache of downloaded images

use super::fetch::ImageFetcher;
use crate::error::{AppError, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Directory of raw image files keyed by source URL
#[derive(Debug, Clone)]
pub struct ImageCache {
    dir: PathBuf,
}

impl ImageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stable file name for a URL: lowercase hex SHA-256
    pub fn key(url: &str) -> String {
        hex::encode(Sha256::digest(url.as_bytes()))
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(Self::key(url))
    }

    /// Cached bytes for `url`, if present
    pub async fn get(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(url);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::cache(format!("Failed to read {}: {}", path.display(), e))),
        }
    }

    /// Store bytes for `url`
    pub async fn put(&self, url: &str, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::cache(format!("Failed to create cache directory {}: {}", self.dir.display(), e))
        })?;

        let path = self.path_for(url);
        // Readers never see a half-written file
        let partial = path.with_extension("part");
        tokio::fs::write(&partial, bytes)
            .await
            .map_err(|e| AppError::cache(format!("Failed to write {}: {}", partial.display(), e)))?;
        tokio::fs::rename(&partial, &path)
            .await
            .map_err(|e| AppError::cache(format!("Failed to store {}: {}", path.display(), e)))?;

        Ok(path)
    }

    /// Cached bytes when present, otherwise download and store them
    ///
    /// Returns the bytes and whether they came from the cache.
    pub async fn get_or_fetch(&self, url: &str, fetcher: &ImageFetcher) -> Result<(Vec<u8>, bool)> {
        if let Some(bytes) = self.get(url).await? {
            return Ok((bytes, true));
        }

        let bytes = fetcher.download(url).await?;
        self.put(url, &bytes).await?;
        Ok((bytes, false))
    }

    /// Whether a file name is a cache key or an interrupted write of one
    fn is_entry_name(name: &str) -> bool {
        let key = name.strip_suffix(".part").unwrap_or(name);
        key.len() == 64 && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Delete every cached entry, returning how many files were removed
    ///
    /// Files not named after a cache key are left alone, so the cache may
    /// share its directory with other files.
    pub async fn clear(&self) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(AppError::cache(format!("Failed to list {}: {}", self.dir.display(), e)))
            }
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let is_entry = entry.file_name().to_str().map(Self::is_entry_name).unwrap_or(false);
            if is_entry && entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path()).await.map_err(|e| {
                    AppError::cache(format!("Failed to remove {}: {}", entry.path().display(), e))
                })?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}
