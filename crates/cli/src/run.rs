//! `qwtt run` and `qwtt roles`.

use std::path::{Path, PathBuf};

use qwtt_io::{load_table, report_to_json, IoError};
use qwtt_recon::model::{ReconInput, ReconOutcome, Role, Table};
use qwtt_recon::resolve::resolve_roles;
use qwtt_recon::{clean, run, CleanedReport, Report, ReportSlot};

use crate::exit_codes::EXIT_IO;
use crate::{load_config, CliError, ReportFormat};

pub const DETAILED_REPORT: &str = "inventory_detailed_report";
pub const CLEANED_REPORT: &str = "inventory_cleaned_report";

pub struct RunArgs {
    pub orders: PathBuf,
    pub inventory: PathBuf,
    pub master: PathBuf,
    pub config: Option<PathBuf>,
    pub out: PathBuf,
    pub format: ReportFormat,
    pub json: bool,
    pub quiet: bool,
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;

    let input = ReconInput {
        orders: load_input(&args.orders)?,
        inventory: load_input(&args.inventory)?,
        master: load_input(&args.master)?,
    };

    let mut slot = ReportSlot::new();
    let outcome = slot.replace(run(&config, &input)?);
    let cleaned = clean(&outcome.report);

    std::fs::create_dir_all(&args.out).map_err(|e| {
        CliError::io(format!("{}: {}", args.out.display(), e))
    })?;

    let detailed_path = args
        .out
        .join(format!("{}.{}", DETAILED_REPORT, args.format.extension()));
    let cleaned_path = args
        .out
        .join(format!("{}.{}", CLEANED_REPORT, args.format.extension()));

    write_report(&outcome.report, args.format, "Detailed Report", &detailed_path, true)?;
    write_report(&cleaned.report, args.format, "Cleaned Report", &cleaned_path, false)?;

    if args.json {
        let doc = report_to_json(&outcome, &cleaned);
        let text = serde_json::to_string_pretty(&doc)
            .map_err(|e| CliError { code: EXIT_IO, message: e.to_string(), hint: None })?;
        println!("{}", text);
    } else if !args.quiet {
        print_summary(&outcome, &cleaned, &[&detailed_path, &cleaned_path]);
    }

    Ok(())
}

fn load_input(path: &Path) -> Result<Table, CliError> {
    load_table(path).map_err(|e| {
        let unsupported = matches!(e, IoError::UnsupportedFormat(_));
        let err = CliError::from(e);
        if unsupported {
            err.with_hint("export the sheet as .csv or .xlsx")
        } else {
            err
        }
    })
}

fn write_report(
    report: &Report,
    format: ReportFormat,
    sheet_name: &str,
    path: &Path,
    highlight_max_sales: bool,
) -> Result<(), CliError> {
    match format {
        ReportFormat::Xlsx => {
            qwtt_io::xlsx::export(report, sheet_name, path, highlight_max_sales)?
        }
        ReportFormat::Csv => qwtt_io::csv::write_report(report, path)?,
    }
    log::info!("wrote {} ({} row(s))", path.display(), report.len());
    Ok(())
}

fn print_summary(outcome: &ReconOutcome, cleaned: &CleanedReport, written: &[&Path]) {
    let report = &outcome.report;
    let diagnostics = &outcome.diagnostics;

    eprintln!("{} ({})", outcome.meta.config_name, outcome.meta.marketplace);
    eprintln!(
        "  SKUs:       {} ({} after cleaning, {} removed)",
        report.len(),
        cleaned.rows_after,
        cleaned.removed()
    );
    eprintln!("  Inventory:  {}", report.total.inventory_qty.value);
    eprintln!("  Sales:      {}", report.total.sales_qty.value);
    if let Some(cp) = report.total.cp_as_per_qty {
        eprintln!("  CP x Qty:   {:.2}", cp.value);
    }
    eprintln!(
        "  Orders:     {} of {} in scope",
        diagnostics.orders_in_scope, diagnostics.orders_total
    );

    if !diagnostics.warnings.is_empty() {
        eprintln!();
        for warning in &diagnostics.warnings {
            eprintln!("  warning: {}", warning);
        }
    }

    eprintln!();
    for path in written {
        eprintln!("  wrote {}", path.display());
    }
}

pub fn cmd_roles(master: PathBuf, config: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let table = load_input(&master)?;
    let roles = resolve_roles(&table.headers, &config.role_rules());

    if json {
        let map: serde_json::Map<String, serde_json::Value> = Role::ALL
            .iter()
            .map(|role| {
                let value = roles
                    .get(*role)
                    .map_or(serde_json::Value::Null, |c| c.name.clone().into());
                (role.to_string(), value)
            })
            .collect();
        println!("{}", serde_json::Value::Object(map));
        return Ok(());
    }

    for role in Role::ALL {
        match roles.get(role) {
            Some(column) => println!("{:<14} {}", role.to_string(), column.name),
            None => println!("{:<14} (unresolved)", role.to_string()),
        }
    }
    if !roles.is_resolved(Role::Sku) {
        eprintln!("note: no SKU column; reports would not be enriched");
    }
    Ok(())
}
