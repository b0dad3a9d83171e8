//! Operator command dispatch.
//!
//! The host surfaces a handful of commands (download this link, download
//! everything, academic download, queue management). They are modeled as a
//! [`Command`] enum dispatched through an exhaustive `match`, so adding a
//! command without a handler fails to compile. [`App`] wires the scanner,
//! orchestrator, queue, and counter store together; per-item download
//! failures are absorbed into outcome counts and only configuration errors
//! surface.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::batch::{
    self, BatchConfig, BatchError, BatchOutcome, BatchRequest, DownloadSink,
};
use crate::config::Settings;
use crate::metadata::{self, UniqueNames, generate_filename};
use crate::page::DocumentTree;
use crate::queue::{QueueItem, QueueStore};
use crate::scanner::{self, ScanConfig, detect_academic_page};
use crate::store::{KeyValueStore, UsageCounters};

/// An operator command against the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Download one link.
    DownloadLink {
        /// URL to download.
        url: String,
    },
    /// Download every candidate link on the page.
    DownloadAllLinks,
    /// Academic download: one link, or all academic candidates when no
    /// link is given. Only applies on academic pages.
    AcademicDownload {
        /// Specific link, or `None` for all academic candidates.
        url: Option<String>,
    },
    /// Add one link to the download queue.
    AddToQueue {
        /// URL to enqueue.
        url: String,
    },
    /// List the download queue.
    ViewQueue,
}

/// What a dispatched command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Aggregate counts from a download command.
    Download(BatchOutcome),
    /// The enqueued item.
    Queued(QueueItem),
    /// Current queue contents.
    QueueListing(Vec<QueueItem>),
    /// The command did not apply to this page.
    Skipped {
        /// Why the command was skipped.
        reason: String,
    },
}

/// Errors that abort a command. Per-item download failures never appear
/// here; they are counted in the returned [`BatchOutcome`].
#[derive(Debug, Error)]
pub enum CommandError {
    /// Invalid orchestrator configuration.
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Wires the scanner, orchestrator, queue, and counter store together.
pub struct App {
    scan_config: ScanConfig,
    batch_config: BatchConfig,
    academic_mode: bool,
    sink: Arc<dyn DownloadSink>,
    queue: Arc<dyn QueueStore>,
    store: Arc<dyn KeyValueStore>,
}

impl App {
    /// Creates an app over the given collaborators, with the academic
    /// pipeline enabled.
    #[must_use]
    pub fn new(
        scan_config: ScanConfig,
        batch_config: BatchConfig,
        sink: Arc<dyn DownloadSink>,
        queue: Arc<dyn QueueStore>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            scan_config,
            batch_config,
            academic_mode: true,
            sink,
            queue,
            store,
        }
    }

    /// Creates an app configured from operator settings: window size and
    /// inter-window delay come from the settings, and the academic pipeline
    /// is enabled only when `academic_mode` is.
    #[must_use]
    pub fn from_settings(
        scan_config: ScanConfig,
        settings: &Settings,
        sink: Arc<dyn DownloadSink>,
        queue: Arc<dyn QueueStore>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            scan_config,
            batch_config: settings.batch_config(),
            academic_mode: settings.academic_mode,
            sink,
            queue,
            store,
        }
    }

    /// Dispatches one command against `page`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Batch`] when the orchestrator configuration
    /// is invalid; everything else resolves into a [`CommandOutcome`].
    #[instrument(skip(self, page))]
    pub async fn dispatch(
        &self,
        page: &dyn DocumentTree,
        command: Command,
    ) -> Result<CommandOutcome, CommandError> {
        match command {
            Command::DownloadLink { url } => self.download_link(&url).await,
            Command::DownloadAllLinks => self.download_all_links(page).await,
            Command::AcademicDownload { url } => self.academic_download(page, url.as_deref()).await,
            Command::AddToQueue { url } => Ok(self.add_to_queue(page, &url)),
            Command::ViewQueue => Ok(CommandOutcome::QueueListing(self.queue.list())),
        }
    }

    async fn download_link(&self, url: &str) -> Result<CommandOutcome, CommandError> {
        let outcome = match batch::download_one(self.sink.as_ref(), url, None).await {
            Ok(()) => {
                self.bump(|c| c.total_downloads += 1);
                BatchOutcome {
                    succeeded: 1,
                    failed: 0,
                }
            }
            Err(e) => {
                warn!(url, error = %e, "single download failed");
                BatchOutcome {
                    succeeded: 0,
                    failed: 1,
                }
            }
        };
        Ok(CommandOutcome::Download(outcome))
    }

    async fn download_all_links(
        &self,
        page: &dyn DocumentTree,
    ) -> Result<CommandOutcome, CommandError> {
        let result = scanner::scan(page, &self.scan_config);
        self.bump(|c| c.found_links += count(result.stats.downloadable));

        if result.links.is_empty() {
            info!("no downloadable links found");
            return Ok(CommandOutcome::Download(BatchOutcome::default()));
        }

        let requests: Vec<BatchRequest> = result.links.iter().map(BatchRequest::from).collect();
        let outcome = batch::run_batch(&requests, &self.batch_config, self.sink.as_ref()).await?;
        self.bump(|c| c.total_downloads += count(outcome.succeeded));
        Ok(CommandOutcome::Download(outcome))
    }

    async fn academic_download(
        &self,
        page: &dyn DocumentTree,
        url: Option<&str>,
    ) -> Result<CommandOutcome, CommandError> {
        if !self.academic_mode {
            return Ok(CommandOutcome::Skipped {
                reason: "academic mode disabled".to_string(),
            });
        }

        if !detect_academic_page(page, &self.scan_config) {
            return Ok(CommandOutcome::Skipped {
                reason: "not an academic page".to_string(),
            });
        }

        if let Some(url) = url {
            let outcome = match batch::download_academic(self.sink.as_ref(), url, page).await {
                Ok(()) => {
                    self.bump(|c| {
                        c.total_downloads += 1;
                        c.processed_files += 1;
                    });
                    BatchOutcome {
                        succeeded: 1,
                        failed: 0,
                    }
                }
                Err(e) => {
                    warn!(url, error = %e, "academic download failed");
                    BatchOutcome {
                        succeeded: 0,
                        failed: 1,
                    }
                }
            };
            return Ok(CommandOutcome::Download(outcome));
        }

        // All academic candidates on the page, each named from the page's
        // own metadata when it is complete enough. Repeated names get a
        // counter suffix so files never overwrite each other.
        let result = scanner::scan(page, &self.scan_config);
        let academic_metadata = metadata::extract(page);
        let mut names = UniqueNames::new();
        let requests: Vec<BatchRequest> = result
            .academic_links
            .iter()
            .map(|link| BatchRequest {
                url: link.url.clone(),
                filename: generate_filename(&link.url, &academic_metadata)
                    .map(|name| names.claim(name)),
            })
            .collect();

        let outcome = batch::run_batch(&requests, &self.batch_config, self.sink.as_ref()).await?;
        self.bump(|c| {
            c.total_downloads += count(outcome.succeeded);
            c.processed_files += count(outcome.succeeded);
        });
        Ok(CommandOutcome::Download(outcome))
    }

    fn add_to_queue(&self, page: &dyn DocumentTree, url: &str) -> CommandOutcome {
        let item = QueueItem::new(url, page.title(), page.location());
        self.queue.append(item.clone());
        info!(id = item.id, url, "added to queue");
        CommandOutcome::Queued(item)
    }

    /// Read-modify-write of the usage counters through the store.
    fn bump(&self, update: impl FnOnce(&mut UsageCounters)) {
        let mut counters = UsageCounters::load(self.store.as_ref());
        update(&mut counters);
        counters.save(self.store.as_ref());
    }
}

/// Widens a collection count into a counter increment.
fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}
