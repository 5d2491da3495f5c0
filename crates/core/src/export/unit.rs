//! Output units

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::error::{ExportError, ExportResult};

/// One generated file
///
/// Opened in append mode and written strictly in order: header, items,
/// footer. Closing flushes the buffer and releases the handle; a closed unit
/// is never reopened.
pub struct OutputUnit {
    path: PathBuf,
    writer: BufWriter<File>,
    separator: String,
    items: usize,
}

impl OutputUnit {
    /// Open `path` for appending, creating parent directories
    pub fn open(path: impl Into<PathBuf>, separator: &str) -> ExportResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ExportError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            separator: separator.to_string(),
            items: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Items written so far
    pub fn items(&self) -> usize {
        self.items
    }

    /// Write text verbatim
    pub fn write_raw(&mut self, text: &str) -> ExportResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.writer
            .write_all(text.as_bytes())
            .map_err(|source| ExportError::Write {
                path: self.path.clone(),
                source,
            })
    }

    /// Write one item, preceded by the separator unless it is the first
    pub fn write_item(&mut self, item: &str) -> ExportResult<()> {
        if self.items > 0 {
            let separator = std::mem::take(&mut self.separator);
            let result = self.write_raw(&separator);
            self.separator = separator;
            result?;
        }
        self.write_raw(item)?;
        self.items += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> ExportResult<()> {
        self.writer.flush().map_err(|source| ExportError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Flush and close, returning the number of items written
    pub fn close(mut self) -> ExportResult<usize> {
        self.flush()?;
        Ok(self.items)
    }
}

/// Create a directory and its parents
pub fn create_dir(path: &Path) -> ExportResult<()> {
    fs::create_dir_all(path).map_err(|source| ExportError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a whole file, creating parent directories
pub fn write_file(path: &Path, contents: &[u8]) -> ExportResult<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    fs::write(path, contents).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}
