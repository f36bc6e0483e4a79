use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod config;
mod console;
mod media;

use config::{Config, LogFormat};
use console::ConsoleReporter;
use media::{Downloader, Fetcher, YtDlpDownloader};

#[derive(Parser, Debug)]
#[command(name = "fetch", author, version, about = "Download the video behind a social-media post", long_about = None)]
struct Args {
    /// URL of the post to download
    url: String,

    /// Path to the config file
    #[arg(short, long)]
    config: Option<String>,

    /// Directory to save the video into
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Format selector passed to the backend
    #[arg(short, long)]
    format: Option<String>,

    /// yt-dlp compatible executable to use
    #[arg(long)]
    backend: Option<String>,
}

fn get_config_path(args: &Args) -> Option<String> {
    resolve_config_path(
        args.config.clone(),
        std::env::var("FETCH_CONFIG").ok(),
        std::env::var("XDG_CONFIG_HOME").ok(),
        dirs::home_dir(),
    )
}

/// Lookup order: explicit path, `FETCH_CONFIG`, XDG config home, `~/.config`.
fn resolve_config_path(
    explicit: Option<String>,
    fetch_config: Option<String>,
    xdg_config_home: Option<String>,
    home: Option<PathBuf>,
) -> Option<String> {
    if let Some(path) = explicit {
        return Some(path);
    }

    if let Some(path) = fetch_config {
        return Some(path);
    }

    if let Some(xdg_config_home) = xdg_config_home {
        let config_path = format!("{}/postfetch/config.toml", xdg_config_home);
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    if let Some(home) = home {
        let config_path = format!("{}/.config/postfetch/config.toml", home.display());
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    None
}

fn init_tracing(format: LogFormat) {
    // Progress goes to stdout, so logs stay on stderr and quiet by default.
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config_path = get_config_path(&args);
    let config = match &config_path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::default(),
    };

    init_tracing(config.get_logging_format());

    match &config_path {
        Some(path) => info!("Loaded config from: {}", path),
        None => info!("No config file found, using defaults"),
    }

    let settings = config.download.with_overrides(
        args.output_dir.clone(),
        args.format.clone(),
        args.backend.clone(),
    );

    let backend = YtDlpDownloader::new(&settings.backend);
    if !backend.is_available().await {
        warn!(
            "{} does not seem to be installed, the download will likely fail",
            settings.backend
        );
    }

    let fetcher = Fetcher::new(
        Box::new(backend),
        &settings,
        Arc::new(ConsoleReporter::stdout()),
    );

    let outcome = fetcher.fetch(&args.url).await;

    match outcome.path() {
        Some(path) => info!("Saved to {}", path.display()),
        None => info!(
            "Nothing saved: {}",
            outcome.reason().unwrap_or_default()
        ),
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
