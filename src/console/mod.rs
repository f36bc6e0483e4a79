use crate::media::{DownloadRequest, FetchError};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Receives the user-facing milestones of a fetch.
pub trait Reporter: Send + Sync {
    fn started(&self, request: &DownloadRequest);
    fn progress(&self, percent: f64);
    fn completed(&self, path: &Path);
    fn failed(&self, error: &FetchError);
}

struct ConsoleState<W> {
    out: W,
    // A progress line has been drawn without a trailing newline.
    line_open: bool,
}

pub struct ConsoleReporter<W: Write + Send> {
    state: Mutex<ConsoleState<W>>,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            state: Mutex::new(ConsoleState {
                out,
                line_open: false,
            }),
        }
    }

    fn finish_line(&self, message: std::fmt::Arguments<'_>) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if state.line_open {
            let _ = writeln!(state.out);
            state.line_open = false;
        }
        let _ = writeln!(state.out, "{}", message);
        let _ = state.out.flush();
    }
}

#[cfg(test)]
impl ConsoleReporter<Vec<u8>> {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.state.lock().unwrap().out).into_owned()
    }
}

pub fn format_percent(percent: f64) -> String {
    format!("{:>5.1}%", percent.clamp(0.0, 100.0))
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn started(&self, request: &DownloadRequest) {
        self.finish_line(format_args!(
            "Starting video download: {}",
            request.source_url()
        ));
    }

    fn progress(&self, percent: f64) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        let _ = write!(state.out, "\rDownload progress: {}", format_percent(percent));
        let _ = state.out.flush();
        state.line_open = true;
    }

    fn completed(&self, path: &Path) {
        self.finish_line(format_args!("Download complete: {}", path.display()));
    }

    fn failed(&self, error: &FetchError) {
        self.finish_line(format_args!("Download failed: {}", error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.0), "  0.0%");
        assert_eq!(format_percent(55.24), " 55.2%");
        assert_eq!(format_percent(100.0), "100.0%");
        assert_eq!(format_percent(130.0), "100.0%");
    }

    #[test]
    fn test_progress_overwrites_line() {
        let reporter = ConsoleReporter::new(Vec::new());
        let request = DownloadRequest::new("https://x.com/a/status/1").unwrap();

        reporter.started(&request);
        reporter.progress(10.0);
        reporter.progress(55.0);
        reporter.completed(&PathBuf::from("downloads/1.mp4"));

        assert_eq!(
            reporter.contents(),
            "Starting video download: https://x.com/a/status/1\n\
             \rDownload progress:  10.0%\rDownload progress:  55.0%\n\
             Download complete: downloads/1.mp4\n"
        );
    }

    #[test]
    fn test_failure_without_progress() {
        let reporter = ConsoleReporter::new(Vec::new());
        reporter.failed(&FetchError::Backend("rate limited".to_string()));

        assert_eq!(reporter.contents(), "Download failed: rate limited\n");
    }
}
