//! Queue item types and status definitions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Process-wide monotonic id source for queue items.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Status of a queue item.
///
/// Transitions are strictly forward: `queued -> downloading ->
/// {completed | failed}`. No item regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    /// Waiting for dispatch.
    Queued,
    /// Submitted, awaiting outcome.
    Downloading,
    /// Settled successfully.
    Completed,
    /// Settled with a failure.
    Failed,
}

impl QueueStatus {
    /// Returns the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns true when moving from `self` to `next` is a valid forward
    /// transition.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Downloading)
                | (Self::Downloading, Self::Completed | Self::Failed)
        )
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QueueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "downloading" => Ok(Self::Downloading),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid queue status: {s}")),
        }
    }
}

/// A single item in the download queue.
///
/// Created on an explicit enqueue request and mutated only through
/// [`QueueStore::update_status`](super::QueueStore::update_status).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Monotonically increasing identifier.
    pub id: u64,
    /// URL to download.
    pub url: String,
    /// Title of the page the link came from.
    pub title: String,
    /// URL of the page the link came from.
    pub source_url: String,
    /// Enqueue time as Unix milliseconds.
    pub added_at: u64,
    /// Current lifecycle status.
    pub status: QueueStatus,
}

impl QueueItem {
    /// Creates a new queued item with a fresh id and the current time.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
            url: url.into(),
            title: title.into(),
            source_url: source_url.into(),
            added_at: now_millis(),
            status: QueueStatus::Queued,
        }
    }
}

impl fmt::Display for QueueItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QueueItem {{ id: {}, url: {}, status: {} }}",
            self.id, self.url, self.status
        )
    }
}

/// Current time as Unix milliseconds; zero if the clock is before the epoch.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
