use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nini_core::{ExportDocument, PageWarning};
use nini_engine::OutputDir;

/// Write every document into `dir`, returning the paths in document order.
pub fn write_documents(dir: &Path, documents: &[ExportDocument]) -> Result<Vec<PathBuf>> {
    let out = OutputDir::open(dir).with_context(|| format!("cannot use {}", dir.display()))?;
    out.write_documents(documents)
        .with_context(|| format!("writing exports to {}", dir.display()))
}

/// Stream document bytes as they are, one after another.
pub fn write_raw(out: &mut impl Write, documents: &[ExportDocument]) -> Result<()> {
    for document in documents {
        out.write_all(&document.content)
            .context("writing document to stdout")?;
    }
    out.flush().context("flushing stdout")
}

pub fn write_paths(out: &mut impl Write, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        writeln!(out, "{}", path.display())?;
    }
    Ok(())
}

/// Short account of the pages that were skipped.
pub fn write_warning_summary(out: &mut impl Write, warnings: &[PageWarning]) -> Result<()> {
    if warnings.is_empty() {
        return Ok(());
    }
    let noun = if warnings.len() == 1 { "page" } else { "pages" };
    writeln!(out, "warning: {} {noun} could not be read", warnings.len())?;
    for warning in warnings {
        writeln!(out, "  {warning}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use nini_core::{ExportDocument, ExportFormat, PageWarning};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::{write_documents, write_raw, write_warning_summary};

    fn document(format: ExportFormat, content: &str) -> ExportDocument {
        ExportDocument {
            format,
            content: content.as_bytes().to_vec(),
            suggested_filename: format!("thread--7.{format}"),
        }
    }

    #[test]
    fn documents_are_written_in_order_into_a_new_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("out");
        let documents = vec![
            document(ExportFormat::Markdown, "# t\n"),
            document(ExportFormat::Org, "#+TITLE: t\n"),
        ];

        let paths = write_documents(&dir, &documents).unwrap();
        assert_eq!(paths, vec![dir.join("thread--7.md"), dir.join("thread--7.org")]);
        assert_eq!(fs::read_to_string(&paths[1]).unwrap(), "#+TITLE: t\n");
    }

    #[test]
    fn output_dir_that_is_a_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("taken");
        fs::write(&file, "x").unwrap();

        let err = write_documents(&file, &[document(ExportFormat::Json, "{}")]).unwrap_err();
        assert!(err.to_string().starts_with("cannot use"));
    }

    #[test]
    fn raw_output_is_the_document_bytes() {
        let mut out = Vec::new();
        write_raw(&mut out, &[document(ExportFormat::Org, "* heading\n")]).unwrap();
        assert_eq!(out, b"* heading\n");
    }

    #[test]
    fn warning_summary_lists_each_skipped_page() {
        let warnings = vec![PageWarning {
            page: 2,
            url: "https://forum.example/t/7?page=2".to_string(),
            reason: "page body is empty".to_string(),
        }];
        let mut out = Vec::new();
        write_warning_summary(&mut out, &warnings).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "warning: 1 page could not be read\n  page 2 (https://forum.example/t/7?page=2) skipped: page body is empty\n"
        );

        let mut quiet = Vec::new();
        write_warning_summary(&mut quiet, &[]).unwrap();
        assert!(quiet.is_empty());
    }
}
