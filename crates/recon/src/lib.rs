//! `qwtt-recon`: per-SKU stock reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded tables (orders, inventory, product
//! master), returns the reconciled report and its diagnostics.
//! No CLI or file IO dependencies.

pub mod aggregate;
pub mod clean;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod numeric;
pub mod resolve;
pub mod slot;

pub use clean::clean;
pub use config::ReconConfig;
pub use engine::run;
pub use error::{ReconError, SourceTable};
pub use model::{
    Cell, CleanedReport, ColumnRoleMap, ReconInput, ReconOutcome, ReconWarning, Report,
    ReportColumn, ReportRow, Role, Table,
};
pub use slot::ReportSlot;
