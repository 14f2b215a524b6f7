//! Asset storage
//!
//! Image download is an external concern; the crawl asks an `AssetStore`
//! for a local path and records whatever it gets back.

use async_trait::async_trait;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use url::Url;

/// Hex characters of the source hash used as the file stem
const FILE_STEM_LEN: usize = 24;

/// Extensions stored under their own name; anything else becomes `.bin`
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "ico", "avif", "tif", "tiff"];

/// Stores asset binaries next to the crawl output
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Stores the asset at `src` for the page identified by `page_key`
    ///
    /// Returns the stored path relative to the output directory, or `None`
    /// if the asset was not stored.
    async fn store(&self, src: &str, page_key: &str) -> Option<String>;
}

/// Store that keeps nothing; used when asset download is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAssetStore;

#[async_trait]
impl AssetStore for NullAssetStore {
    async fn store(&self, _src: &str, _page_key: &str) -> Option<String> {
        None
    }
}

/// Downloads images into `images/{host}/{page_key}/{hash}{ext}`
pub struct DiskAssetStore {
    client: Client,
    output_dir: PathBuf,
}

impl DiskAssetStore {
    pub fn new(client: Client, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
        }
    }

    async fn download(&self, url: &Url, target: &Path) -> Result<(), String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP status {}", response.status().as_u16()));
        }
        let bytes = response.bytes().await.map_err(|e| e.to_string())?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }
        tokio::fs::write(target, &bytes)
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl AssetStore for DiskAssetStore {
    async fn store(&self, src: &str, page_key: &str) -> Option<String> {
        let url = Url::parse(src).ok()?;
        let relative = asset_path(&url, page_key)?;
        let target = self.output_dir.join(&relative);

        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Some(relative);
        }

        match self.download(&url, &target).await {
            Ok(()) => Some(relative),
            Err(e) => {
                tracing::debug!("Asset {} not stored: {}", src, e);
                None
            }
        }
    }
}

/// Computes where an asset is stored, relative to the output directory
///
/// Returns `None` for SVG, which is markup rather than an image binary.
pub fn asset_path(src: &Url, page_key: &str) -> Option<String> {
    let filename = src.path().rsplit('/').next().unwrap_or("");
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if ext == "svg" {
        return None;
    }
    let ext = if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        ext
    } else {
        "bin".to_string()
    };

    let mut stem = hex::encode(Sha256::digest(src.as_str().as_bytes()));
    stem.truncate(FILE_STEM_LEN);

    let host = src.host_str().unwrap_or("unknown-host");
    Some(format!("images/{}/{}/{}.{}", host, page_key, stem, ext))
}
