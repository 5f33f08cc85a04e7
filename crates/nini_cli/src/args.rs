use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use log::LevelFilter;
use nini_core::ExportFormat;
use nini_engine::{ExportOptions, FetchSettings, RetryPolicy, RunConfig};
use nini_logging::LogDestination;
use url::Url;

/// Export a discussion thread, every page of it, to org, Markdown or JSON.
#[derive(Debug, Parser)]
#[command(name = "get-the-nini", version)]
pub struct Args {
    /// Address of the thread's first page.
    pub url: Url,

    /// Output format; repeat for several (org, md, json).
    #[arg(short, long = "format", value_name = "FORMAT", default_value = "org")]
    pub formats: Vec<ExportFormat>,

    /// Directory the documents are written to.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Write the document to stdout instead of a file (one format only).
    #[arg(long)]
    pub stdout: bool,

    /// Give up on threads with more pages than this.
    #[arg(long, value_name = "N", default_value_t = 50)]
    pub max_pages: u32,

    /// Pages downloaded at once when the page count is known.
    #[arg(long, value_name = "N", default_value_t = 4)]
    pub concurrency: usize,

    /// Per-request timeout.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Retries after a network error or timeout.
    #[arg(long, value_name = "N", default_value_t = 2)]
    pub retries: u32,

    /// Pause between pages fetched one after another.
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub delay_ms: u64,

    /// Leave right-to-left author names unisolated.
    #[arg(long)]
    pub no_bidi: bool,

    /// List org posts straight under the title instead of per page.
    #[arg(long)]
    pub no_paginate: bool,

    /// More log output; repeat for trace.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Also write the log to this file.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// Requested formats, first occurrence wins.
    pub fn formats(&self) -> Vec<ExportFormat> {
        let mut formats = Vec::with_capacity(self.formats.len());
        for format in &self.formats {
            if !formats.contains(format) {
                formats.push(*format);
            }
        }
        formats
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            fetch: FetchSettings {
                request_timeout: Duration::from_secs(self.timeout.max(1)),
                request_delay: Duration::from_millis(self.delay_ms),
                ..FetchSettings::default()
            },
            retry: RetryPolicy {
                max_attempts: self.retries.saturating_add(1),
                ..RetryPolicy::default()
            },
            max_pages: self.max_pages,
            page_concurrency: self.concurrency,
            export: ExportOptions {
                bidi_isolate_authors: !self.no_bidi,
                group_by_page: !self.no_paginate,
            },
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }
}
