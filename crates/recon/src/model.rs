use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::{ReconError, SourceTable};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A headered table of text cells, as supplied by the shell for one run.
///
/// Rows may be ragged; a missing trailing cell reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Locate a column by name: exact match first, then trimmed case-insensitive.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        if let Some(i) = self.headers.iter().position(|h| h == name) {
            return Some(i);
        }
        let wanted = name.trim().to_lowercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_lowercase() == wanted)
    }

    pub fn require_column(&self, table: SourceTable, name: &str) -> Result<usize, ReconError> {
        self.column_index(name).ok_or_else(|| ReconError::MissingColumn {
            table,
            column: name.to_string(),
        })
    }

    /// Parse a headered CSV stream. Row widths may vary.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut table = Table::new(headers);

        for record in reader.records() {
            let record = record?;
            table.push_row(record.iter().map(|v| v.to_string()).collect());
        }

        Ok(table)
    }
}

/// Cell text at `idx`, empty when the row is shorter than the header.
pub fn field(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.as_str()).unwrap_or("")
}

/// The three raw tables for one reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub orders: Table,
    pub inventory: Table,
    pub master: Table,
}

// ---------------------------------------------------------------------------
// Keys + Aggregation
// ---------------------------------------------------------------------------

/// A canonicalized join key. Blank raw keys map to `Empty` and are never
/// merged with real SKUs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NormalizedKey {
    Sku(String),
    Empty,
}

/// A numeric value produced by a total parse. `defaulted` is set when the
/// source cell was blank or unparseable and `value` is the zero fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coerced<T> {
    pub value: T,
    pub defaulted: bool,
}

impl<T> Coerced<T> {
    pub fn exact(value: T) -> Self {
        Self { value, defaulted: false }
    }

    pub fn fallback(value: T) -> Self {
        Self { value, defaulted: true }
    }
}

/// One row per distinct normalized key with its summed measure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedRow {
    pub key: String,
    /// Smallest raw spelling in the group, trimmed and stray-stripped, case preserved.
    pub display_key: String,
    pub measure: i64,
    pub record_count: usize,
    /// Every contributing measure cell was blank or unparseable.
    pub defaulted: bool,
}

/// Records whose key was blank: kept out of the per-SKU rows, but counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlankKeyBucket {
    pub records: usize,
    pub measure: i64,
}

/// Blank/unparseable cell counts for one numeric column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoercionTally {
    pub blank: usize,
    pub unparseable: usize,
}

impl CoercionTally {
    pub fn total(&self) -> usize {
        self.blank + self.unparseable
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregateOutput {
    pub rows: Vec<AggregatedRow>,
    pub blank_keys: BlankKeyBucket,
    pub coercions: CoercionTally,
    pub records_in_scope: usize,
}

impl AggregateOutput {
    pub fn measure_sum(&self) -> i64 {
        self.rows.iter().map(|r| r.measure).fold(0, i64::saturating_add)
    }
}

// ---------------------------------------------------------------------------
// Column roles
// ---------------------------------------------------------------------------

/// Semantic role of a product-master column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Sku,
    Manager,
    Brand,
    ProductName,
    VendorSku,
    Cp,
    Fns,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Sku,
        Role::Manager,
        Role::Brand,
        Role::ProductName,
        Role::VendorSku,
        Role::Cp,
        Role::Fns,
    ];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sku => write!(f, "sku"),
            Self::Manager => write!(f, "manager"),
            Self::Brand => write!(f, "brand"),
            Self::ProductName => write!(f, "product_name"),
            Self::VendorSku => write!(f, "vendor_sku"),
            Self::Cp => write!(f, "cp"),
            Self::Fns => write!(f, "fns"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    pub name: String,
    pub index: usize,
}

/// Role → master column for one run. Built once by the resolver, then read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnRoleMap {
    columns: BTreeMap<Role, ResolvedColumn>,
}

impl ColumnRoleMap {
    pub(crate) fn from_resolved(columns: BTreeMap<Role, ResolvedColumn>) -> Self {
        Self { columns }
    }

    pub fn get(&self, role: Role) -> Option<&ResolvedColumn> {
        self.columns.get(&role)
    }

    pub fn is_resolved(&self, role: Role) -> bool {
        self.columns.contains_key(&role)
    }

    pub fn absent_roles(&self) -> Vec<Role> {
        Role::ALL
            .iter()
            .copied()
            .filter(|r| !self.columns.contains_key(r))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &ResolvedColumn)> {
        self.columns.iter().map(|(r, c)| (*r, c))
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportColumn {
    Sku,
    Manager,
    Brand,
    ProductName,
    Fns,
    VendorSku,
    InventoryQty,
    SalesQty,
    Cp,
    CpAsPerQty,
}

impl ReportColumn {
    /// Fixed export order.
    pub const ALL: [ReportColumn; 10] = [
        ReportColumn::Sku,
        ReportColumn::Manager,
        ReportColumn::Brand,
        ReportColumn::ProductName,
        ReportColumn::Fns,
        ReportColumn::VendorSku,
        ReportColumn::InventoryQty,
        ReportColumn::SalesQty,
        ReportColumn::Cp,
        ReportColumn::CpAsPerQty,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Self::Sku => "sku",
            Self::Manager => "Manager",
            Self::Brand => "Brand",
            Self::ProductName => "Product Name",
            Self::Fns => "FNS",
            Self::VendorSku => "Vendor SKU",
            Self::InventoryQty => "Inventory QTY",
            Self::SalesQty => "Sales QTY",
            Self::Cp => "CP",
            Self::CpAsPerQty => "CP As Per Qty",
        }
    }

    /// The master role that must resolve for this column to appear.
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Self::Manager => Some(Role::Manager),
            Self::Brand => Some(Role::Brand),
            Self::ProductName => Some(Role::ProductName),
            Self::Fns => Some(Role::Fns),
            Self::VendorSku => Some(Role::VendorSku),
            Self::Cp | Self::CpAsPerQty => Some(Role::Cp),
            Self::Sku | Self::InventoryQty | Self::SalesQty => None,
        }
    }
}

/// Display value of one report cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Missing,
}

pub const GRAND_TOTAL_LABEL: &str = "Grand Total";

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub sku: String,
    pub manager: Option<String>,
    pub brand: Option<String>,
    pub product_name: Option<String>,
    pub fns: Option<String>,
    pub vendor_sku: Option<String>,
    pub inventory_qty: Coerced<i64>,
    pub sales_qty: Coerced<i64>,
    pub cp: Option<Coerced<f64>>,
    pub cp_as_per_qty: Option<Coerced<f64>>,
}

impl ReportRow {
    pub fn cell(&self, column: ReportColumn) -> Cell {
        let text = |v: &Option<String>| match v {
            Some(s) => Cell::Text(s.clone()),
            None => Cell::Missing,
        };
        match column {
            ReportColumn::Sku => Cell::Text(self.sku.clone()),
            ReportColumn::Manager => text(&self.manager),
            ReportColumn::Brand => text(&self.brand),
            ReportColumn::ProductName => text(&self.product_name),
            ReportColumn::Fns => text(&self.fns),
            ReportColumn::VendorSku => text(&self.vendor_sku),
            ReportColumn::InventoryQty => Cell::Int(self.inventory_qty.value),
            ReportColumn::SalesQty => Cell::Int(self.sales_qty.value),
            ReportColumn::Cp => self.cp.map_or(Cell::Missing, |c| Cell::Float(c.value)),
            ReportColumn::CpAsPerQty => self
                .cp_as_per_qty
                .map_or(Cell::Missing, |c| Cell::Float(c.value)),
        }
    }

    /// Empty, whitespace-only, missing, or zero-filled from a bad source cell.
    pub fn is_incomplete(&self, column: ReportColumn) -> bool {
        match column {
            ReportColumn::InventoryQty => self.inventory_qty.defaulted,
            ReportColumn::SalesQty => self.sales_qty.defaulted,
            ReportColumn::Cp => self.cp.map_or(true, |c| c.defaulted),
            ReportColumn::CpAsPerQty => self.cp_as_per_qty.map_or(true, |c| c.defaulted),
            _ => match self.cell(column) {
                Cell::Text(s) => s.trim().is_empty(),
                _ => true,
            },
        }
    }
}

/// The finalized report: detail rows plus exactly one trailing total row.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub columns: Vec<ReportColumn>,
    pub rows: Vec<ReportRow>,
    pub total: ReportRow,
}

impl Report {
    /// Build a report whose total row is the column-wise sum of `rows`.
    pub fn from_rows(columns: Vec<ReportColumn>, rows: Vec<ReportRow>) -> Self {
        let total = total_row(&columns, &rows);
        Self { columns, rows, total }
    }

    /// Detail rows followed by the total row.
    pub fn iter_all(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().chain(std::iter::once(&self.total))
    }

    /// Number of detail rows (the total row is not counted).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header()).collect()
    }
}

fn total_row(columns: &[ReportColumn], rows: &[ReportRow]) -> ReportRow {
    let label = |col: ReportColumn| {
        if columns.contains(&col) {
            Some(String::new())
        } else {
            None
        }
    };
    let sum_f = |f: fn(&ReportRow) -> Option<Coerced<f64>>, col: ReportColumn| {
        if columns.contains(&col) {
            Some(Coerced::exact(
                rows.iter().filter_map(f).map(|c| c.value).sum::<f64>(),
            ))
        } else {
            None
        }
    };

    ReportRow {
        sku: GRAND_TOTAL_LABEL.to_string(),
        manager: label(ReportColumn::Manager),
        brand: label(ReportColumn::Brand),
        product_name: label(ReportColumn::ProductName),
        fns: label(ReportColumn::Fns),
        vendor_sku: label(ReportColumn::VendorSku),
        inventory_qty: Coerced::exact(
            rows.iter().map(|r| r.inventory_qty.value).fold(0, i64::saturating_add),
        ),
        sales_qty: Coerced::exact(
            rows.iter().map(|r| r.sales_qty.value).fold(0, i64::saturating_add),
        ),
        cp: sum_f(|r| r.cp, ReportColumn::Cp),
        cp_as_per_qty: sum_f(|r| r.cp_as_per_qty, ReportColumn::CpAsPerQty),
    }
}

/// Cleaned view of a report plus before/after detail-row counts.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedReport {
    pub report: Report,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl CleanedReport {
    pub fn removed(&self) -> usize {
        self.rows_before - self.rows_after
    }
}

// ---------------------------------------------------------------------------
// Diagnostics + Outcome
// ---------------------------------------------------------------------------

/// Non-fatal anomalies surfaced to the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconWarning {
    /// No master column matched the SKU role: enrichment skipped entirely.
    UnresolvedSkuColumn,
    /// An enrichment role had no matching column; its output column is omitted.
    UnresolvedRole { role: Role },
    CoercedValues {
        table: SourceTable,
        column: String,
        blank: usize,
        unparseable: usize,
    },
    BlankKeys {
        table: SourceTable,
        records: usize,
        quantity: i64,
    },
    SalesWithoutInventory { skus: usize, quantity: i64 },
    DuplicateMasterKeys { count: usize },
}

impl fmt::Display for ReconWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedSkuColumn => {
                write!(f, "master table has no SKU column; report is not enriched")
            }
            Self::UnresolvedRole { role } => {
                write!(f, "master table has no '{role}' column; column omitted")
            }
            Self::CoercedValues { table, column, blank, unparseable } => write!(
                f,
                "{table} '{column}': {blank} blank and {unparseable} unparseable value(s) read as 0"
            ),
            Self::BlankKeys { table, records, quantity } => write!(
                f,
                "{table}: {records} record(s) with a blank SKU (quantity {quantity}) left out of the report"
            ),
            Self::SalesWithoutInventory { skus, quantity } => write!(
                f,
                "{skus} sold SKU(s) (quantity {quantity}) are not in inventory and are not reported"
            ),
            Self::DuplicateMasterKeys { count } => write!(
                f,
                "{count} duplicate master row(s) ignored; first occurrence per SKU kept"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SalesOnly {
    pub skus: usize,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconDiagnostics {
    pub warnings: Vec<ReconWarning>,
    pub orders_total: usize,
    pub orders_in_scope: usize,
    pub sales_only: SalesOnly,
    pub duplicate_master_keys: usize,
    pub unmatched_master_keys: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub marketplace: String,
    pub engine_version: String,
    pub run_at: String,
}

/// Everything one successful run produces.
#[derive(Debug, Clone)]
pub struct ReconOutcome {
    pub meta: ReconMeta,
    pub report: Report,
    pub roles: ColumnRoleMap,
    pub diagnostics: ReconDiagnostics,
}
