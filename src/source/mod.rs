//! # Document Source
//!
//! Turns workbook files on disk into [`Document`]s for the tally engine.
//! Office Open XML (`.xlsx`, `.xlsm`) and OpenDocument (`.ods`) workbooks are
//! read directly from their ZIP containers; every cell becomes a scalar
//! [`CellValue`](crate::grid::CellValue) and formatting is ignored.
pub(crate) mod archive;
pub(crate) mod ods;
pub(crate) mod xlsx;
pub(crate) mod xml;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::error::PartTallyError;
use crate::error::ResultMessage;
use crate::grid::Document;
use glob::MatchOptions;
use glob::Pattern;
use ods::OdsWorkbook;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use xlsx::XlsxWorkbook;

/// File name patterns of the workbooks picked up from a directory, one per
/// extension [`open_document`] reads.
pub const WORKBOOK_PATTERNS: [&str; 3] = ["*.xlsx", "*.xlsm", "*.ods"];

/// Extensions are matched regardless of case, as in [`open_document`].
const WORKBOOK_MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

#[derive(Error, Debug)]
pub enum SourceError {
    /// Extension not handled by any reader
    #[error("Unsupported document format '{0}'")]
    UnsupportedFormat(String),

    /// Required archive entry is absent
    #[error("Missing part '{0}' in workbook")]
    MissingPart(String),

    #[error("Workbook '{0}' has no sheets")]
    EmptyWorkbook(String),

    #[error("Workbook '{0}' is password protected")]
    PasswordProtected(String),

    #[error("Invalid ODS MIME type in '{0}'")]
    MimeType(String),

    #[error("Directory '{0}' does not exist")]
    DirectoryNotFound(String),
}

/// Anything that can supply one document to the aggregator.
///
/// Implementations must be safe to call from a worker thread; each call to
/// [`load`](DocumentSource::load) yields a complete, independent document.
pub trait DocumentSource {
    /// Name used to report the document.
    fn name(&self) -> String;

    /// Loads the full document.
    fn load(&self) -> Result<Document, PartTallyError>;
}

impl DocumentSource for Document {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn load(&self) -> Result<Document, PartTallyError> {
        Ok(self.clone())
    }
}

/// A workbook file on disk.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkbookFile(pub PathBuf);

impl WorkbookFile {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl DocumentSource for WorkbookFile {
    fn name(&self) -> String {
        self.0
            .file_name()
            .unwrap_or(self.0.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    fn load(&self) -> Result<Document, PartTallyError> {
        let mut document = open_document(&self.0)?;
        document.name = self.name();
        Ok(document)
    }
}

/// Lists the workbooks directly inside `dir`, sorted by path.
///
/// Hidden files (leading `.`, which includes editor lock files) are skipped,
/// as is everything not matching [`WORKBOOK_PATTERNS`].
///
/// # Arguments
/// * `dir` - Directory to scan, not recursively
///
/// # Returns
/// The workbook files, or an error if the directory is missing or unreadable
pub fn list_workbooks(dir: &Path) -> Result<Vec<WorkbookFile>, PartTallyError> {
    if !dir.is_dir() {
        Err(SourceError::DirectoryNotFound(dir.to_string_lossy().into_owned()))?
    }
    let patterns = WORKBOOK_PATTERNS
        .iter()
        .map(|pattern| Pattern::new(pattern))
        .collect::<Result<Vec<_>, _>>()?;

    let mut files = Vec::new();
    let entries = fs::read_dir(dir)
        .map_err(PartTallyError::from)
        .with_prefix(&format!("Cannot read directory '{}'", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(OsStr::to_str) else {
            continue;
        };
        if name.starts_with('.') || !path.is_file() {
            continue;
        }
        if patterns.iter().any(|pattern| pattern.matches_with(name, WORKBOOK_MATCH_OPTIONS)) {
            files.push(WorkbookFile(path));
        } else {
            debug!(file = name, "not a workbook, skipped");
        }
    }
    files.sort();
    info!(dir = %dir.display(), workbooks = files.len(), "workbooks listed");
    Ok(files)
}

/// Opens a workbook by extension and reads all of its sheets.
///
/// # Arguments
/// * `path` - Workbook path; `.xlsx`, `.xlsm` and `.ods` are read, in any case
///
/// # Returns
/// The parsed document, or [`SourceError::UnsupportedFormat`] for other extensions
pub fn open_document(path: &Path) -> Result<Document, PartTallyError> {
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("xlsx") | Some("xlsm") => XlsxWorkbook::open(path)?.read_document(),
        Some("ods") => OdsWorkbook::open(path)?.read_document(),
        _ => Err(SourceError::UnsupportedFormat(path.to_string_lossy().into_owned()))?,
    }
}
