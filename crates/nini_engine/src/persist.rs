use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use nini_core::ExportDocument;
use nini_logging::scrape_info;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("{0:?} is not a plain file name")]
    InvalidFilename(String),
    #[error("two documents want the file name {0:?}")]
    DuplicateFilename(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// A directory that exports are written into.
///
/// Opening checks the directory once; each file then goes through a temp
/// file in the same directory and a rename, so a reader sees either the old
/// export or the new one.
#[derive(Debug, Clone)]
pub struct OutputDir {
    dir: PathBuf,
}

impl OutputDir {
    /// Create `dir` if missing and check that it takes new files.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        match fs::metadata(&dir) {
            Ok(meta) if !meta.is_dir() => {
                return Err(PersistError::OutputDir(format!(
                    "{} is not a directory",
                    dir.display()
                )));
            }
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
            }
            Err(err) => return Err(PersistError::OutputDir(err.to_string())),
        }
        NamedTempFile::new_in(&dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Replace `{dir}/{filename}` with `content`.
    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        if !is_plain_filename(filename) {
            return Err(PersistError::InvalidFilename(filename.to_string()));
        }
        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }

    /// Write every document under its suggested filename, in order.
    ///
    /// Names are checked up front, so a clash or a path-like name writes
    /// nothing.
    pub fn write_documents(&self, documents: &[ExportDocument]) -> Result<Vec<PathBuf>, PersistError> {
        let mut names = HashSet::with_capacity(documents.len());
        for document in documents {
            let name = document.suggested_filename.as_str();
            if !is_plain_filename(name) {
                return Err(PersistError::InvalidFilename(name.to_string()));
            }
            if !names.insert(name) {
                return Err(PersistError::DuplicateFilename(name.to_string()));
            }
        }

        documents
            .iter()
            .map(|document| {
                let path = self.write(&document.suggested_filename, &document.content)?;
                scrape_info!("wrote {} ({} bytes)", path.display(), document.content.len());
                Ok(path)
            })
            .collect()
    }
}

/// Exactly one normal path component: no separators, no `.` or `..`.
fn is_plain_filename(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
