//! Renderers from the canonical thread to each output format.
//!
//! Every renderer is a pure function of `(&Thread, &ExportOptions)`: no
//! clocks, no environment, no shared state, so repeated exports of the same
//! thread are byte-identical and formats can render side by side.
mod json;
mod markdown;
mod org;
mod text;

use std::thread;

use nini_core::{ExportDocument, ExportFormat, Thread};
use nini_logging::scrape_debug;

use crate::filename::suggested_filename;

pub use json::{thread_from_json, FORMAT_VERSION};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Wrap right-to-left author names in Unicode isolates so they do not
    /// reorder the surrounding left-to-right text.
    pub bidi_isolate_authors: bool,
    /// Org only: file posts under one heading per forum page. Replies nest
    /// within their page; a reply to a post on another page starts a new
    /// subtree there.
    pub group_by_page: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            bidi_isolate_authors: true,
            group_by_page: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("json serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("{0} renderer panicked")]
    RendererPanicked(ExportFormat),
}

pub fn export(
    thread: &Thread,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<ExportDocument, ExportError> {
    let content = match format {
        ExportFormat::Org => org::render(thread, options).into_bytes(),
        ExportFormat::Markdown => markdown::render(thread, options).into_bytes(),
        ExportFormat::Json => json::render(thread)?,
    };
    scrape_debug!("rendered {} ({} bytes)", format, content.len());
    Ok(ExportDocument {
        format,
        content,
        suggested_filename: suggested_filename(&thread.title, &thread.id, format),
    })
}

/// Render several formats in parallel. Duplicates are rendered once and the
/// result keeps the order of first appearance.
pub fn export_all(
    thread: &Thread,
    formats: &[ExportFormat],
    options: &ExportOptions,
) -> Result<Vec<ExportDocument>, ExportError> {
    let mut unique: Vec<ExportFormat> = Vec::with_capacity(formats.len());
    for format in formats {
        if !unique.contains(format) {
            unique.push(*format);
        }
    }

    thread::scope(|scope| {
        let handles: Vec<_> = unique
            .iter()
            .map(|format| {
                let format = *format;
                (format, scope.spawn(move || export(thread, format, options)))
            })
            .collect();
        handles
            .into_iter()
            .map(|(format, handle)| {
                handle
                    .join()
                    .map_err(|_| ExportError::RendererPanicked(format))?
            })
            .collect()
    })
}
