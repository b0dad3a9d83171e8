//! Harvester Core Library
//!
//! This library classifies downloadable resources on web pages and
//! orchestrates batch downloads of them, with an academic pipeline that
//! extracts citation metadata and derives descriptive filenames.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`page`] - Document tree abstraction and HTML backend
//! - [`scanner`] - Link classification and page scanning
//! - [`metadata`] - Citation metadata extraction and filename generation
//! - [`batch`] - Windowed batch download orchestration
//! - [`queue`] - Download queue with forward-only status transitions
//! - [`store`] - Key-value persistence for counters and settings
//! - [`commands`] - Operator command dispatch
//! - [`rescan`] - Debounced rescan scheduling for mutating pages

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod commands;
pub mod config;
pub mod metadata;
pub mod page;
pub mod queue;
pub mod rescan;
pub mod scanner;
pub mod store;

// Re-export commonly used types
pub use batch::{
    BatchConfig, BatchError, BatchOutcome, BatchRequest, DEFAULT_INTER_BATCH_DELAY,
    DEFAULT_MAX_CONCURRENT, DispatchError, DownloadSink, HttpSink, download_academic,
    download_one, run_batch,
};
pub use commands::{App, Command, CommandError, CommandOutcome};
pub use config::Settings;
pub use metadata::{AcademicMetadata, PageMetadata, UniqueNames, generate_filename};
pub use page::{DocumentTree, HtmlPage};
pub use queue::{MemoryQueue, QueueError, QueueItem, QueueStatus, QueueStore};
pub use rescan::RescanDebouncer;
pub use scanner::{MimeClass, ResourceLink, ScanConfig, ScanResult, scan};
pub use store::{KeyValueStore, MemoryStore, UsageCounters, seed_defaults};
