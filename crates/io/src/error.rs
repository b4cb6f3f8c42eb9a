use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub enum IoError {
    /// File could not be opened, read or written.
    Io { path: String, message: String },
    /// File was read but its contents could not be parsed as a table.
    Parse { path: String, message: String },
    /// Extension is not one of the supported table formats.
    UnsupportedFormat(String),
    /// Workbook has no sheet, or its first sheet has no header row.
    EmptySheet(String),
    /// Report could not be serialized.
    Write(String),
}

impl IoError {
    pub(crate) fn io(path: &Path, e: impl fmt::Display) -> Self {
        Self::Io { path: path.display().to_string(), message: e.to_string() }
    }

    pub(crate) fn parse(path: &Path, e: impl fmt::Display) -> Self {
        Self::Parse { path: path.display().to_string(), message: e.to_string() }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "{path}: {message}"),
            Self::Parse { path, message } => write!(f, "{path}: cannot parse table: {message}"),
            Self::UnsupportedFormat(path) => write!(
                f,
                "{path}: unsupported file type (expected .csv, .tsv, .txt, .xlsx, .xlsm, .xls, .xlsb or .ods)"
            ),
            Self::EmptySheet(path) => write!(f, "{path}: no header row found"),
            Self::Write(msg) => write!(f, "cannot write report: {msg}"),
        }
    }
}

impl std::error::Error for IoError {}
