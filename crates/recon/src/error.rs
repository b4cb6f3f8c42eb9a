use std::fmt;

/// Which input table an error or warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTable {
    Orders,
    Inventory,
    Master,
}

impl fmt::Display for SourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Orders => write!(f, "orders"),
            Self::Inventory => write!(f, "inventory"),
            Self::Master => write!(f, "master"),
        }
    }
}

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty literal, bad role override, etc.).
    ConfigValidation(String),
    /// Missing required column in input data. Fatal: the run is aborted.
    MissingColumn { table: SourceTable, column: String },
    /// Malformed CSV stream.
    Csv(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { table, column } => {
                write!(f, "{table} table: missing required column '{column}'")
            }
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<csv::Error> for ReconError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_message_names_table_and_column() {
        let err = ReconError::MissingColumn {
            table: SourceTable::Inventory,
            column: "old_quantity".into(),
        };
        assert_eq!(
            err.to_string(),
            "inventory table: missing required column 'old_quantity'"
        );
    }
}
