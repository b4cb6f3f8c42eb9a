use std::collections::{HashMap, HashSet};

use crate::aggregate::aggregate_table;
use crate::config::ReconConfig;
use crate::error::{ReconError, SourceTable};
use crate::model::{
    field, AggregateOutput, AggregatedRow, Coerced, CoercionTally, ColumnRoleMap, NormalizedKey,
    ReconDiagnostics, ReconInput, ReconMeta, ReconOutcome, ReconWarning, Report, ReportColumn,
    ReportRow, Role, SalesOnly, Table,
};
use crate::normalize::KeyNormalizer;
use crate::numeric::coerce_amount;
use crate::resolve::resolve_roles;

/// Run one reconciliation per config. Fails only when a required orders or
/// inventory column is missing; every other anomaly degrades to a warning.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconOutcome, ReconError> {
    let normalizer = KeyNormalizer::new(&config.keys);
    let mut diagnostics = ReconDiagnostics::default();

    // Required columns: fatal before any work is done
    let orders = &input.orders;
    let order_market = orders.require_column(SourceTable::Orders, &config.orders.marketplace)?;
    let order_sku = orders.require_column(SourceTable::Orders, &config.orders.sku)?;
    let order_qty = orders.require_column(SourceTable::Orders, &config.orders.quantity)?;

    let inventory = &input.inventory;
    let inv_sku = inventory.require_column(SourceTable::Inventory, &config.inventory.sku)?;
    let inv_qty = inventory.require_column(SourceTable::Inventory, &config.inventory.quantity)?;

    // 1. Aggregate both sources
    let marketplace = config.marketplace.trim();
    let sales = aggregate_table(orders, order_sku, order_qty, &normalizer, |row| {
        field(row, order_market).trim() == marketplace
    });
    let stock = aggregate_table(inventory, inv_sku, inv_qty, &normalizer, |_| true);

    diagnostics.orders_total = orders.len();
    diagnostics.orders_in_scope = sales.records_in_scope;
    note_aggregate(&mut diagnostics, SourceTable::Orders, &config.orders.quantity, &sales);
    note_aggregate(&mut diagnostics, SourceTable::Inventory, &config.inventory.quantity, &stock);

    // 2. Inventory-anchored left join of sales
    let sales_by_key: HashMap<&str, &AggregatedRow> =
        sales.rows.iter().map(|r| (r.key.as_str(), r)).collect();
    let sales_only = sales_without_inventory(&sales, &stock);
    if sales_only.skus > 0 {
        push_warning(
            &mut diagnostics,
            ReconWarning::SalesWithoutInventory {
                skus: sales_only.skus,
                quantity: sales_only.quantity,
            },
        );
    }
    diagnostics.sales_only = sales_only;

    // 3. Master enrichment
    let roles = resolve_roles(&input.master.headers, &config.role_rules());
    let enrichment = Enrichment::build(&input.master, &roles, &normalizer, &mut diagnostics);
    let columns = report_columns(&roles);

    let mut cp_tally = CoercionTally::default();
    let mut rows: Vec<ReportRow> = Vec::with_capacity(stock.rows.len());

    for item in &stock.rows {
        let sales_qty = match sales_by_key.get(item.key.as_str()) {
            Some(s) => Coerced { value: s.measure, defaulted: s.defaulted },
            None => Coerced::exact(0),
        };
        let master_row = enrichment.as_ref().and_then(|e| e.lookup(&item.key));
        if enrichment.is_some() && master_row.is_none() {
            diagnostics.unmatched_master_keys += 1;
        }

        let text = |role: Role| -> Option<String> {
            let column = roles.get(role)?;
            master_row.map(|r| field(r, column.index).to_string())
        };

        // 4. Derived columns
        let cp = if columns.contains(&ReportColumn::Cp) {
            let column = roles.get(Role::Cp);
            Some(match (master_row, column) {
                (Some(r), Some(c)) => coerce_amount(field(r, c.index), &mut cp_tally),
                _ => Coerced::fallback(0.0),
            })
        } else {
            None
        };
        let cp_as_per_qty = cp.map(|c| Coerced {
            value: c.value * sales_qty.value as f64,
            defaulted: c.defaulted,
        });

        rows.push(ReportRow {
            sku: item.display_key.clone(),
            manager: text(Role::Manager),
            brand: text(Role::Brand),
            product_name: text(Role::ProductName),
            fns: text(Role::Fns),
            vendor_sku: text(Role::VendorSku),
            inventory_qty: Coerced { value: item.measure, defaulted: item.defaulted },
            sales_qty,
            cp,
            cp_as_per_qty,
        });
    }

    if cp_tally.total() > 0 {
        if let Some(column) = roles.get(Role::Cp) {
            push_warning(
                &mut diagnostics,
                ReconWarning::CoercedValues {
                    table: SourceTable::Master,
                    column: column.name.clone(),
                    blank: cp_tally.blank,
                    unparseable: cp_tally.unparseable,
                },
            );
        }
    }

    // 5. Ascending by sales; stable, so ties keep anchor order
    rows.sort_by_key(|r| r.sales_qty.value);

    // 6 + 7. Total row and projection are fixed by construction
    let report = Report::from_rows(columns, rows);

    log::info!(
        "reconciled {} SKU(s): inventory {} / sales {} ({} of {} orders in '{}')",
        report.len(),
        report.total.inventory_qty.value,
        report.total.sales_qty.value,
        diagnostics.orders_in_scope,
        diagnostics.orders_total,
        marketplace,
    );

    Ok(ReconOutcome {
        meta: ReconMeta {
            config_name: config.name.clone(),
            marketplace: marketplace.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        report,
        roles,
        diagnostics,
    })
}

/// Output columns in fixed order, dropping any whose master role did not
/// resolve. Without a SKU column nothing can be joined, so every enrichment
/// column is dropped.
pub fn report_columns(roles: &ColumnRoleMap) -> Vec<ReportColumn> {
    let can_enrich = roles.is_resolved(Role::Sku);
    ReportColumn::ALL
        .iter()
        .copied()
        .filter(|c| match c.required_role() {
            None => true,
            Some(role) => can_enrich && roles.is_resolved(role),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Master index
// ---------------------------------------------------------------------------

/// Master rows keyed by normalized SKU, first occurrence wins.
struct Enrichment<'a> {
    by_key: HashMap<String, &'a [String]>,
}

impl<'a> Enrichment<'a> {
    fn build(
        master: &'a Table,
        roles: &ColumnRoleMap,
        normalizer: &KeyNormalizer,
        diagnostics: &mut ReconDiagnostics,
    ) -> Option<Self> {
        let Some(sku) = roles.get(Role::Sku) else {
            push_warning(diagnostics, ReconWarning::UnresolvedSkuColumn);
            return None;
        };

        for role in roles.absent_roles() {
            push_warning(diagnostics, ReconWarning::UnresolvedRole { role });
        }

        let mut by_key: HashMap<String, &'a [String]> = HashMap::new();
        let mut duplicates = 0;
        for row in &master.rows {
            let NormalizedKey::Sku(key) = normalizer.normalize(field(row, sku.index)) else {
                continue;
            };
            if by_key.contains_key(&key) {
                duplicates += 1;
                continue;
            }
            by_key.insert(key, row.as_slice());
        }

        diagnostics.duplicate_master_keys = duplicates;
        if duplicates > 0 {
            push_warning(diagnostics, ReconWarning::DuplicateMasterKeys { count: duplicates });
        }

        Some(Self { by_key })
    }

    fn lookup(&self, key: &str) -> Option<&'a [String]> {
        self.by_key.get(key).copied()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sales_without_inventory(sales: &AggregateOutput, stock: &AggregateOutput) -> SalesOnly {
    let stocked: HashSet<&str> = stock.rows.iter().map(|r| r.key.as_str()).collect();
    let mut out = SalesOnly::default();
    for row in sales.rows.iter().filter(|r| !stocked.contains(r.key.as_str())) {
        out.skus += 1;
        out.quantity = out.quantity.saturating_add(row.measure);
    }
    out
}

fn note_aggregate(
    diagnostics: &mut ReconDiagnostics,
    table: SourceTable,
    column: &str,
    agg: &AggregateOutput,
) {
    if agg.coercions.total() > 0 {
        push_warning(
            diagnostics,
            ReconWarning::CoercedValues {
                table,
                column: column.to_string(),
                blank: agg.coercions.blank,
                unparseable: agg.coercions.unparseable,
            },
        );
    }
    if agg.blank_keys.records > 0 {
        push_warning(
            diagnostics,
            ReconWarning::BlankKeys {
                table,
                records: agg.blank_keys.records,
                quantity: agg.blank_keys.measure,
            },
        );
    }
}

fn push_warning(diagnostics: &mut ReconDiagnostics, warning: ReconWarning) {
    log::warn!("{warning}");
    diagnostics.warnings.push(warning);
}
