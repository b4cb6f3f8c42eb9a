// JSON export of a reconciliation outcome

use serde_json::{json, Map, Value};

use qwtt_recon::model::{Cell, CleanedReport, ReconOutcome, Report, ReportRow};

/// Build the machine-readable document for one run: meta, summary, resolved
/// roles, warnings and both reports. Row objects keep the report's column order.
pub fn report_to_json(outcome: &ReconOutcome, cleaned: &CleanedReport) -> Value {
    let report = &outcome.report;
    let diagnostics = &outcome.diagnostics;

    let roles: Map<String, Value> = outcome
        .roles
        .iter()
        .map(|(role, column)| (role.to_string(), Value::String(column.name.clone())))
        .collect();

    let warnings: Vec<Value> = diagnostics
        .warnings
        .iter()
        .map(|w| {
            let mut value = serde_json::to_value(w).unwrap_or(Value::Null);
            if let Value::Object(map) = &mut value {
                map.insert("message".into(), Value::String(w.to_string()));
            }
            value
        })
        .collect();

    json!({
        "meta": outcome.meta,
        "summary": {
            "rows": report.len(),
            "inventory_qty": report.total.inventory_qty.value,
            "sales_qty": report.total.sales_qty.value,
            "cleaned_rows": cleaned.rows_after,
            "removed_rows": cleaned.removed(),
            "orders_total": diagnostics.orders_total,
            "orders_in_scope": diagnostics.orders_in_scope,
            "sales_only": diagnostics.sales_only,
            "duplicate_master_keys": diagnostics.duplicate_master_keys,
            "unmatched_master_keys": diagnostics.unmatched_master_keys,
        },
        "roles": roles,
        "warnings": warnings,
        "report": report_value(report),
        "cleaned": report_value(&cleaned.report),
    })
}

fn report_value(report: &Report) -> Value {
    let rows: Vec<Value> = report.rows.iter().map(|r| row_value(report, r)).collect();
    json!({
        "columns": report.headers(),
        "rows": rows,
        "total": row_value(report, &report.total),
    })
}

fn row_value(report: &Report, row: &ReportRow) -> Value {
    let mut obj = Map::new();
    for column in &report.columns {
        let value = match row.cell(*column) {
            Cell::Text(s) => Value::String(s),
            Cell::Int(n) => json!(n),
            Cell::Float(n) => json!(n),
            Cell::Missing => Value::Null,
        };
        obj.insert(column.header().to_string(), value);
    }
    Value::Object(obj)
}
