//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use harvester_core::DEFAULT_MAX_CONCURRENT;

/// Scan pages for downloadable resources and batch-download them.
///
/// Harvester classifies the links on a web page (PDFs, datasets, media,
/// archives), recognizes academic pages, and downloads selected resources
/// in rate-limited batches with metadata-derived filenames.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Scan a page and report classified resources without downloading
    Scan {
        /// Page to scan: a URL or a path to a local HTML file
        input: String,

        /// Base URL for resolving relative links in local files
        #[arg(short, long)]
        base_url: Option<String>,
    },

    /// Scan a page and download every candidate resource
    Download {
        /// Page to scan: a URL or a path to a local HTML file
        input: String,

        /// Base URL for resolving relative links in local files
        #[arg(short, long)]
        base_url: Option<String>,

        /// Maximum concurrent downloads per window (1-100)
        #[arg(short = 'c', long, default_value_t = DEFAULT_MAX_CONCURRENT as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
        max_concurrent: u8,

        /// Delay between download windows in milliseconds (max 60000)
        #[arg(short = 'l', long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(0..=60000))]
        delay_ms: u64,

        /// Restrict to academic candidates and derive citation filenames
        #[arg(short, long)]
        academic: bool,

        /// Directory to write downloaded files into
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}
