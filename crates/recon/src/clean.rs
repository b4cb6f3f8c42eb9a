use crate::model::{CleanedReport, Report};

/// Drop every detail row with an empty, whitespace-only, missing or
/// zero-filled field in any report column. The total row is carried over
/// untouched. Idempotent.
pub fn clean(report: &Report) -> CleanedReport {
    let rows: Vec<_> = report
        .rows
        .iter()
        .filter(|row| !report.columns.iter().any(|c| row.is_incomplete(*c)))
        .cloned()
        .collect();

    let cleaned = CleanedReport {
        rows_before: report.len(),
        rows_after: rows.len(),
        report: Report {
            columns: report.columns.clone(),
            rows,
            total: report.total.clone(),
        },
    };

    log::debug!(
        "cleaned report: {} -> {} row(s)",
        cleaned.rows_before,
        cleaned.rows_after
    );
    cleaned
}
