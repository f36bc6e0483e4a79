use super::{
    downloader::Downloader,
    types::{DownloadOptions, DownloadedMedia, ProgressEvent, ProgressStatus},
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

const PROGRESS_PREFIX: &str = "[progress]";
const PROGRESS_TEMPLATE: &str =
    "download:[progress] %(progress.status)s %(progress._percent_str)s";
// Printed once the final file is in place, after any merging.
const RESULT_TEMPLATE: &str = "after_move:%(.{id,ext,filepath})j";

#[derive(Debug, PartialEq)]
enum BackendLine {
    Progress(ProgressEvent),
    Finished(DownloadedMedia),
    Error(String),
    Warning(String),
}

fn parse_percent(value: &str) -> Option<f64> {
    value.trim().trim_end_matches('%').trim().parse::<f64>().ok()
}

fn parse_line(line: &str) -> Option<BackendLine> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix(PROGRESS_PREFIX) {
        let mut parts = rest.split_whitespace();
        let status = ProgressStatus::parse(parts.next()?)?;
        let percent = parts.next().and_then(parse_percent);
        return Some(BackendLine::Progress(ProgressEvent { status, percent }));
    }

    if line.starts_with('{') {
        return serde_json::from_str(line).ok().map(BackendLine::Finished);
    }

    if let Some(rest) = line.strip_prefix("ERROR:") {
        return Some(BackendLine::Error(rest.trim().to_string()));
    }

    if let Some(rest) = line.strip_prefix("WARNING:") {
        return Some(BackendLine::Warning(rest.trim().to_string()));
    }

    None
}

#[derive(Debug, Default)]
struct StreamSummary {
    media: Option<DownloadedMedia>,
    errors: Vec<String>,
}

async fn consume_output<R>(reader: R, options: &DownloadOptions) -> std::io::Result<StreamSummary>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut summary = StreamSummary::default();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        // Titles and paths are not guaranteed to be UTF-8 under every locale.
        let line = String::from_utf8_lossy(&buf);
        match parse_line(&line) {
            Some(BackendLine::Progress(event)) => options.emit(&event),
            Some(BackendLine::Finished(media)) => {
                debug!("yt-dlp reported file: {}", media.path.display());
                if summary.media.is_none() {
                    summary.media = Some(media);
                }
            }
            Some(BackendLine::Error(message)) => summary.errors.push(message),
            Some(BackendLine::Warning(message)) => warn!("yt-dlp: {}", message),
            None => {
                let line = line.trim();
                if !line.is_empty() {
                    debug!("yt-dlp: {}", line);
                }
            }
        }
    }

    Ok(summary)
}

pub struct YtDlpDownloader {
    program: String,
    options: Option<DownloadOptions>,
}

impl YtDlpDownloader {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            options: None,
        }
    }

    fn build_args(options: &DownloadOptions, url: &str) -> Vec<String> {
        vec![
            "--format".to_string(),
            options.format.clone(),
            "--output".to_string(),
            options.output_template.clone(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
            "--print".to_string(),
            RESULT_TEMPLATE.to_string(),
            "--no-simulate".to_string(),
            "--".to_string(),
            url.to_string(),
        ]
    }
}

#[async_trait]
impl Downloader for YtDlpDownloader {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    fn configure(&mut self, options: DownloadOptions) {
        debug!("Configuring {} with {:?}", self.program, options);
        self.options = Some(options);
    }

    async fn download(&self, url: &str) -> Result<DownloadedMedia> {
        let options = self
            .options
            .as_ref()
            .context("yt-dlp downloader used before being configured")?;

        info!("Downloading media with {}: {}", self.program, url);

        let mut child = Command::new(&self.program)
            .args(Self::build_args(options, url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", self.program))?;

        let stdout = child.stdout.take().context("Failed to get yt-dlp stdout")?;
        let stderr = child.stderr.take().context("Failed to get yt-dlp stderr")?;

        let (stdout_summary, stderr_summary) = tokio::join!(
            consume_output(stdout, options),
            consume_output(stderr, options),
        );
        let stdout_summary = stdout_summary.context("Failed to read yt-dlp output")?;
        let stderr_summary = stderr_summary.context("Failed to read yt-dlp errors")?;

        let status = child.wait().await.context("Failed to wait for yt-dlp")?;

        if !status.success() {
            let message = stderr_summary
                .errors
                .last()
                .or(stdout_summary.errors.last())
                .cloned()
                .unwrap_or_else(|| format!("{} exited with {}", self.program, status));
            return Err(anyhow::anyhow!(message));
        }

        stdout_summary
            .media
            .or(stderr_summary.media)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "{} finished without reporting a downloaded file",
                    self.program
                )
            })
    }

    async fn is_available(&self) -> bool {
        match Command::new(&self.program).arg("--version").output().await {
            Ok(output) => {
                if output.status.success() {
                    let version = String::from_utf8_lossy(&output.stdout);
                    info!("{} is available, version: {}", self.program, version.trim());
                    true
                } else {
                    warn!("{} --version failed", self.program);
                    false
                }
            }
            Err(e) => {
                warn!("{} not found: {}", self.program, e);
                false
            }
        }
    }
}
