use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Anything the backend reported: network, extraction, unsupported URL.
    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    source_url: String,
}

impl DownloadRequest {
    /// Only emptiness is checked here; everything else is up to the backend.
    pub fn new(source_url: &str) -> Result<Self, FetchError> {
        let source_url = source_url.trim();
        if source_url.is_empty() {
            return Err(FetchError::InvalidRequest("URL must not be empty".to_string()));
        }

        Ok(Self {
            source_url: source_url.to_string(),
        })
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.source_url)
            .ok()
            .and_then(|url| url.host_str().map(|host| host.to_string()))
    }
}

#[derive(Debug)]
pub enum DownloadOutcome {
    Success(PathBuf),
    Failure(FetchError),
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Success(path) => Some(path),
            Self::Failure(_) => None,
        }
    }

    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    Downloading,
    Finished,
    Error,
}

impl ProgressStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "downloading" => Some(Self::Downloading),
            "finished" => Some(Self::Finished),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    /// `None` when the backend does not know the total size.
    pub percent: Option<f64>,
}

impl ProgressEvent {
    #[cfg(test)]
    pub fn downloading(percent: f64) -> Self {
        Self {
            status: ProgressStatus::Downloading,
            percent: Some(percent),
        }
    }
}

pub type ProgressHook = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Backend configuration handed over once, before any download.
#[derive(Clone)]
pub struct DownloadOptions {
    pub output_template: String,
    pub format: String,
    pub progress_hooks: Vec<ProgressHook>,
}

impl DownloadOptions {
    pub fn emit(&self, event: &ProgressEvent) {
        for hook in &self.progress_hooks {
            hook(event);
        }
    }
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("output_template", &self.output_template)
            .field("format", &self.format)
            .field("progress_hooks", &self.progress_hooks.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadedMedia {
    pub id: String,
    pub ext: String,
    #[serde(rename = "filepath")]
    pub path: PathBuf,
}
