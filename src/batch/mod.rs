//! Batch download orchestration.
//!
//! The orchestrator dispatches downloads to a [`DownloadSink`] in fixed-size,
//! order-preserving windows. Every item in a window is submitted
//! concurrently and the window waits for all of them to settle before the
//! next window starts; a rate-limiting delay runs between windows. One
//! item's failure never aborts its siblings or later windows.
//!
//! This is deliberately a fixed-width wave scheduler, not a sliding pool:
//! a window holds its remaining capacity until its slowest member settles.
//! That keeps peak concurrency bounded exactly at `max_concurrent` and the
//! inter-window delay trivial to reason about, at the cost of idle slots
//! when item durations are uneven.
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::batch::{run_batch, BatchConfig, BatchRequest, HttpSink};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sink = HttpSink::new(Path::new("./downloads"));
//! let items = vec![BatchRequest::from("https://example.com/a.pdf")];
//! let outcome = run_batch(&items, &BatchConfig::default(), &sink).await?;
//! println!("ok: {}, failed: {}", outcome.succeeded, outcome.failed);
//! # Ok(())
//! # }
//! ```

mod sink;

pub use sink::HttpSink;

use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::metadata::{self, generate_filename};
use crate::page::DocumentTree;
use crate::scanner::ResourceLink;

/// Default window size, matching the stock concurrency setting.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Default delay between windows.
pub const DEFAULT_INTER_BATCH_DELAY: Duration = Duration::from_millis(1000);

/// Configuration for one orchestration run. Immutable for its duration.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Window size; peak concurrency bound. Must be positive.
    pub max_concurrent: usize,
    /// Delay between consecutive windows (never applied after the last).
    pub inter_batch_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            inter_batch_delay: DEFAULT_INTER_BATCH_DELAY,
        }
    }
}

/// Fatal configuration error, raised before any dispatch begins.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// `max_concurrent` must be a positive integer.
    #[error("invalid max_concurrent value {value}: must be at least 1")]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// Failure of one submission. Isolated at the window level and counted;
/// never escalates into a run-level failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
    /// The submission facility rejected or failed the item.
    #[error("dispatch failed for {url}: {reason}")]
    Failed {
        /// URL of the failed item.
        url: String,
        /// Human-readable failure reason.
        reason: String,
    },
}

impl DispatchError {
    /// Creates a dispatch failure for `url`.
    #[must_use]
    pub fn failed(url: &str, reason: impl Into<String>) -> Self {
        Self::Failed {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

/// External download-submission capability.
///
/// The orchestrator owns no transfer logic; it only submits. Implementations
/// decide what "submit" means (enqueue with a browser, fetch over HTTP,
/// record in a test). Any timeout is the implementation's responsibility.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Submits one download, optionally with a preferred filename.
    async fn submit(&self, url: &str, filename: Option<&str>) -> Result<(), DispatchError>;
}

/// One item handed to the orchestrator: a URL plus an optional preferred
/// filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    /// URL to submit.
    pub url: String,
    /// Preferred filename, `None` for default naming.
    pub filename: Option<String>,
}

impl BatchRequest {
    /// Creates a request with a preferred filename.
    #[must_use]
    pub fn with_filename(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: Some(filename.into()),
        }
    }
}

impl From<&str> for BatchRequest {
    fn from(url: &str) -> Self {
        Self {
            url: url.to_string(),
            filename: None,
        }
    }
}

impl From<String> for BatchRequest {
    fn from(url: String) -> Self {
        Self {
            url,
            filename: None,
        }
    }
}

impl From<&ResourceLink> for BatchRequest {
    fn from(link: &ResourceLink) -> Self {
        Self {
            url: link.url.clone(),
            filename: None,
        }
    }
}

/// Aggregate outcome of one orchestration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Items whose submission settled successfully.
    pub succeeded: usize,
    /// Items whose submission settled with an error.
    pub failed: usize,
}

impl BatchOutcome {
    /// Total items settled.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Runs a batch of downloads in rate-limited, concurrency-bounded windows.
///
/// The input is partitioned into consecutive windows of
/// `config.max_concurrent` items, preserving order; the last window may be
/// shorter. Each window is submitted concurrently and awaited with
/// all-settled semantics, then the inter-window delay runs before the next
/// window (never after the final one).
///
/// # Errors
///
/// Returns [`BatchError::InvalidConcurrency`] when `config.max_concurrent`
/// is zero, before any submission is made. This is the only condition that
/// aborts a run; per-item failures are absorbed into the outcome counts.
#[instrument(skip(items, sink), fields(items = items.len(), window = config.max_concurrent))]
pub async fn run_batch(
    items: &[BatchRequest],
    config: &BatchConfig,
    sink: &dyn DownloadSink,
) -> Result<BatchOutcome, BatchError> {
    if config.max_concurrent == 0 {
        return Err(BatchError::InvalidConcurrency { value: 0 });
    }

    let mut outcome = BatchOutcome::default();

    for (window_index, window) in items.chunks(config.max_concurrent).enumerate() {
        if window_index > 0 && !config.inter_batch_delay.is_zero() {
            debug!(
                delay_ms = config.inter_batch_delay.as_millis(),
                "inter-window delay"
            );
            tokio::time::sleep(config.inter_batch_delay).await;
        }

        debug!(window_index, size = window.len(), "dispatching window");

        // All-settled: every submission in the window runs to completion;
        // failures become values, never early aborts.
        let settled = join_all(
            window
                .iter()
                .map(|item| sink.submit(&item.url, item.filename.as_deref())),
        )
        .await;

        for (item, result) in window.iter().zip(settled) {
            match result {
                Ok(()) => outcome.succeeded += 1,
                Err(e) => {
                    warn!(url = %item.url, error = %e, "submission failed");
                    outcome.failed += 1;
                }
            }
        }
    }

    info!(
        succeeded = outcome.succeeded,
        failed = outcome.failed,
        total = outcome.total(),
        "batch complete"
    );

    Ok(outcome)
}

/// Submits a single download: one dispatch, no retry.
///
/// # Errors
///
/// Returns the [`DispatchError`] from the sink; the item is reported, not
/// retried.
#[instrument(skip(sink))]
pub async fn download_one(
    sink: &dyn DownloadSink,
    url: &str,
    filename: Option<&str>,
) -> Result<(), DispatchError> {
    sink.submit(url, filename).await
}

/// Submits a single academic download, deriving a preferred filename from
/// the page's metadata first. Otherwise identical to [`download_one`].
///
/// # Errors
///
/// Returns the [`DispatchError`] from the sink.
#[instrument(skip(sink, metadata_source))]
pub async fn download_academic(
    sink: &dyn DownloadSink,
    url: &str,
    metadata_source: &dyn DocumentTree,
) -> Result<(), DispatchError> {
    let metadata = metadata::extract(metadata_source);
    let filename = generate_filename(url, &metadata);
    debug!(filename = filename.as_deref(), "derived academic filename");
    sink.submit(url, filename.as_deref()).await
}
