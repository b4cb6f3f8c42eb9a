//! CLI Exit Code Registry
//!
//! Single source of truth for `qwtt` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | Success (warnings do not change the exit code)     |
//! | 2    | Usage error (bad arguments, unsupported file type) |
//! | 3    | IO error (cannot read input or write a report)     |
//! | 4    | Parse error (malformed CSV or workbook)            |
//! | 60   | Required orders/inventory column missing           |
//! | 61   | Invalid config (TOML parse or validation)          |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above

use qwtt_io::IoError;
use qwtt_recon::ReconError;

pub const EXIT_SUCCESS: u8 = 0;

/// Bad arguments, missing required options, unsupported input extension.
pub const EXIT_USAGE: u8 = 2;

/// Input file unreadable or report file unwritable.
pub const EXIT_IO: u8 = 3;

/// Input file read but not parseable as a table.
pub const EXIT_PARSE: u8 = 4;

/// Orders or inventory table lacks a required column. The run is aborted.
pub const EXIT_MISSING_COLUMN: u8 = 60;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 61;

pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::MissingColumn { .. } => EXIT_MISSING_COLUMN,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::Csv(_) => EXIT_PARSE,
    }
}

pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Io { .. } | IoError::Write(_) => EXIT_IO,
        IoError::Parse { .. } | IoError::EmptySheet(_) => EXIT_PARSE,
        IoError::UnsupportedFormat(_) => EXIT_USAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qwtt_recon::SourceTable;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_USAGE,
            EXIT_IO,
            EXIT_PARSE,
            EXIT_MISSING_COLUMN,
            EXIT_INVALID_CONFIG,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn missing_column_maps_to_60() {
        let err = ReconError::MissingColumn {
            table: SourceTable::Inventory,
            column: "sku".into(),
        };
        assert_eq!(recon_exit_code(&err), EXIT_MISSING_COLUMN);
        assert_eq!(
            io_exit_code(&IoError::UnsupportedFormat("x.json".into())),
            EXIT_USAGE
        );
    }
}
