use super::types::{DownloadOptions, DownloadedMedia};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Downloader: Send + Sync {
    /// Human-readable name of the downloader
    fn name(&self) -> &'static str;

    /// Apply the fixed download configuration. Called once, before `download`.
    fn configure(&mut self, options: DownloadOptions);

    /// Download the media behind the given URL into the configured location
    async fn download(&self, url: &str) -> Result<DownloadedMedia>;

    /// Test if this downloader is available on the system
    async fn is_available(&self) -> bool {
        true
    }
}
