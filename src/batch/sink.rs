//! HTTP-backed download-submission sink.
//!
//! [`HttpSink`] adapts the [`DownloadSink`](super::DownloadSink) capability
//! onto a plain HTTP GET that writes the response body into an output
//! directory. All transfer failures surface as
//! [`DispatchError`](super::DispatchError) values for the orchestrator to
//! count.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use super::{DispatchError, DownloadSink};

/// Connection timeout for submissions.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fallback filename when neither the caller nor the URL provides one.
const FALLBACK_FILENAME: &str = "download.bin";

/// Download sink that fetches URLs over HTTP and saves them to a directory.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    output_dir: PathBuf,
}

impl HttpSink {
    /// Creates a sink writing into `output_dir`.
    #[must_use]
    pub fn new(output_dir: &Path) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Picks the filename to save under: the caller's preference, else the
    /// last URL path segment, else a fixed fallback.
    fn target_filename(url: &str, preferred: Option<&str>) -> String {
        if let Some(name) = preferred {
            return sanitize_for_filesystem(name);
        }

        Url::parse(url)
            .ok()
            .and_then(|u| {
                u.path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
            })
            .filter(|segment| !segment.is_empty())
            .map_or_else(|| FALLBACK_FILENAME.to_string(), |s| sanitize_for_filesystem(&s))
    }
}

#[async_trait]
impl DownloadSink for HttpSink {
    #[instrument(skip(self))]
    async fn submit(&self, url: &str, filename: Option<&str>) -> Result<(), DispatchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DispatchError::failed(url, e.to_string()))?
            .error_for_status()
            .map_err(|e| DispatchError::failed(url, e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DispatchError::failed(url, e.to_string()))?;

        let name = Self::target_filename(url, filename);
        let path = self.output_dir.join(&name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| DispatchError::failed(url, e.to_string()))?;

        debug!(path = %path.display(), bytes = bytes.len(), "saved download");
        Ok(())
    }
}

/// Strips path separators and control characters from a filename.
fn sanitize_for_filesystem(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if sanitized.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        sanitized
    }
}
