// File I/O for reconciliation inputs and reports

pub mod csv;
pub mod error;
pub mod json;
pub mod xlsx;

use std::path::Path;

use qwtt_recon::model::Table;

pub use error::IoError;
pub use json::report_to_json;

/// Load a headered table, choosing the reader by file extension.
pub fn load_table(path: &Path) -> Result<Table, IoError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let table = match ext.as_str() {
        "csv" | "tsv" | "txt" => csv::import(path)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => xlsx::import(path)?,
        _ => return Err(IoError::UnsupportedFormat(path.display().to_string())),
    };

    log::info!(
        "loaded {}: {} column(s), {} row(s)",
        path.display(),
        table.headers.len(),
        table.len()
    );
    Ok(table)
}
