use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadConfig {
    /// Directory the backend writes into, relative to the working directory
    pub output_dir: PathBuf,
    /// Backend format selector
    pub format: String,
    /// Backend executable, any yt-dlp compatible program
    pub backend: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            format: "best".to_string(),
            backend: "yt-dlp".to_string(),
        }
    }
}

impl DownloadConfig {
    pub fn with_overrides(
        mut self,
        output_dir: Option<PathBuf>,
        format: Option<String>,
        backend: Option<String>,
    ) -> Self {
        if let Some(output_dir) = output_dir {
            self.output_dir = output_dir;
        }
        if let Some(format) = format {
            self.format = format;
        }
        if let Some(backend) = backend {
            self.backend = backend;
        }
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub logging: LoggingConfig,
    pub download: DownloadConfig,
}

impl Config {
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid config file")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn get_logging_format(&self) -> LogFormat {
        self.logging.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.get_logging_format(), LogFormat::Pretty);
        assert_eq!(config.download.output_dir, PathBuf::from("downloads"));
        assert_eq!(config.download.format, "best");
        assert_eq!(config.download.backend, "yt-dlp");
    }

    #[test]
    fn test_parse_partial_config() {
        let config = Config::parse(
            r#"
            [logging]
            format = "json"

            [download]
            output_dir = "/tmp/videos"
            "#,
        )
        .unwrap();

        assert_eq!(config.get_logging_format(), LogFormat::Json);
        assert_eq!(config.download.output_dir, PathBuf::from("/tmp/videos"));
        assert_eq!(config.download.format, "best");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.download, DownloadConfig::default());
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        assert!(Config::parse("[download]\nretries = 3\n").is_err());
        assert!(Config::parse("[logging]\nformat = \"xml\"\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[download]\nformat = \"bestvideo+bestaudio\"\nbackend = \"youtube-dl\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.download.format, "bestvideo+bestaudio");
        assert_eq!(config.download.backend, "youtube-dl");
    }

    #[test]
    fn test_from_missing_file() {
        let err = Config::from_file("/nonexistent/postfetch/config.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_overrides() {
        let settings = DownloadConfig::default().with_overrides(
            Some(PathBuf::from("out")),
            None,
            Some("yt-dlp-nightly".to_string()),
        );
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert_eq!(settings.format, "best");
        assert_eq!(settings.backend, "yt-dlp-nightly");
    }
}
