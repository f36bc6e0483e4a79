mod downloader;
mod types;
mod ytdlp;

pub use downloader::Downloader;
pub use types::{
    DownloadOptions, DownloadOutcome, DownloadRequest, FetchError, ProgressEvent, ProgressHook,
    ProgressStatus,
};
pub use ytdlp::YtDlpDownloader;

use crate::config::DownloadConfig;
use crate::console::Reporter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const OUTPUT_NAME_TEMPLATE: &str = "%(id)s.%(ext)s";

pub struct Fetcher {
    backend: Box<dyn Downloader>,
    output_dir: PathBuf,
    reporter: Arc<dyn Reporter>,
}

impl Fetcher {
    pub fn new(
        mut backend: Box<dyn Downloader>,
        settings: &DownloadConfig,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let hook_reporter = reporter.clone();
        let progress_hook: ProgressHook = Arc::new(move |event: &ProgressEvent| {
            if event.status != ProgressStatus::Downloading {
                return;
            }
            if let Some(percent) = event.percent {
                hook_reporter.progress(percent);
            }
        });

        let output_template = settings
            .output_dir
            .join(OUTPUT_NAME_TEMPLATE)
            .to_string_lossy()
            .to_string();

        backend.configure(DownloadOptions {
            output_template,
            format: settings.format.clone(),
            progress_hooks: vec![progress_hook],
        });

        info!(
            "Fetcher initialized - using {} with format '{}' into {}",
            backend.name(),
            settings.format,
            settings.output_dir.display()
        );

        Self {
            backend,
            output_dir: settings.output_dir.clone(),
            reporter,
        }
    }

    /// Never returns an error: every failure ends up in `DownloadOutcome::Failure`.
    pub async fn fetch(&self, source_url: &str) -> DownloadOutcome {
        let request = match DownloadRequest::new(source_url) {
            Ok(request) => request,
            Err(e) => return self.fail(e),
        };

        info!(
            "Starting download for URL: {} (host: {})",
            request.source_url(),
            request.host().as_deref().unwrap_or("unknown")
        );

        if let Err(e) = self.ensure_output_dir().await {
            return self.fail(e);
        }

        self.reporter.started(&request);

        match self.backend.download(request.source_url()).await {
            Ok(media) => {
                info!(
                    "Successfully downloaded {}.{} with {}: {}",
                    media.id,
                    media.ext,
                    self.backend.name(),
                    media.path.display()
                );
                self.reporter.completed(&media.path);
                DownloadOutcome::Success(media.path)
            }
            Err(e) => self.fail(FetchError::Backend(format!("{e:#}"))),
        }
    }

    async fn ensure_output_dir(&self) -> Result<(), FetchError> {
        debug!("Ensuring output directory {}", self.output_dir.display());

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| FetchError::OutputDir {
                path: self.output_dir.clone(),
                source,
            })
    }

    fn describe_failure(&self, error: &FetchError) -> String {
        match error {
            FetchError::Backend(_) => format!("{} failed: {}", self.backend.name(), error),
            FetchError::InvalidRequest(_) | FetchError::OutputDir { .. } => {
                format!("Fetch aborted before download: {}", error)
            }
        }
    }

    fn fail(&self, error: FetchError) -> DownloadOutcome {
        warn!("{}", self.describe_failure(&error));
        self.reporter.failed(&error);
        DownloadOutcome::Failure(error)
    }
}
