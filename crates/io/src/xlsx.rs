// Excel table import (xlsx, xls, xlsb, ods) and report export (xlsx only)
//
// Import reads the first worksheet only. Export is a presentation snapshot:
// typed numbers, bold header, optional highlight of the best-selling rows.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};

use qwtt_recon::model::{Cell, Report, ReportRow, Table};

use crate::error::IoError;

/// Fill for rows carrying the maximum Sales QTY.
const HIGHLIGHT_FILL: u32 = 0x90EE90;

/// Import the first worksheet as a table. The first row with any non-empty
/// cell is the header; rows below it become data rows.
pub fn import(path: &Path) -> Result<Table, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::parse(path, e))?;

    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Err(IoError::EmptySheet(path.display().to_string()));
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IoError::parse(path, format!("sheet '{sheet_name}': {e}")))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<String>>())
        .skip_while(|row| row.iter().all(|v| v.is_empty()));

    let Some(headers) = rows.next() else {
        return Err(IoError::EmptySheet(path.display().to_string()));
    };

    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row);
    }

    log::debug!(
        "{}: read {} row(s) from sheet '{}'",
        path.display(),
        table.len(),
        sheet_name
    );
    Ok(table)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Write the report to a single worksheet: header, detail rows, total row.
///
/// With `highlight_max_sales`, every detail row whose Sales QTY equals the
/// maximum is filled light green. The total row is never highlighted.
pub fn export(
    report: &Report,
    sheet_name: &str,
    path: &Path,
    highlight_max_sales: bool,
) -> Result<(), IoError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(sheet_name)
        .map_err(xlsx_err)?;

    write_sheet(report, worksheet, highlight_max_sales).map_err(xlsx_err)?;

    workbook.save(path).map_err(|e| IoError::io(path, e))?;
    Ok(())
}

fn xlsx_err(e: XlsxError) -> IoError {
    IoError::Write(e.to_string())
}

fn write_sheet(
    report: &Report,
    worksheet: &mut Worksheet,
    highlight_max_sales: bool,
) -> Result<(), XlsxError> {
    let header_format = Format::new().set_bold();
    let plain = Format::new();
    let highlight = Format::new().set_background_color(Color::RGB(HIGHLIGHT_FILL));

    for (col, header) in report.headers().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    let max_sales = report.rows.iter().map(|r| r.sales_qty.value).max();

    for (idx, row) in report.iter_all().enumerate() {
        let is_total = idx == report.rows.len();
        let format = if highlight_max_sales && !is_total && Some(row.sales_qty.value) == max_sales {
            &highlight
        } else {
            &plain
        };
        write_row(report, row, worksheet, (idx + 1) as u32, format)?;
    }

    for col in 0..report.columns.len() {
        worksheet.set_column_width(col as u16, 16)?;
    }
    Ok(())
}

fn write_row(
    report: &Report,
    row: &ReportRow,
    worksheet: &mut Worksheet,
    row_idx: u32,
    format: &Format,
) -> Result<(), XlsxError> {
    for (col, column) in report.columns.iter().enumerate() {
        let col = col as u16;
        match row.cell(*column) {
            Cell::Text(s) => {
                worksheet.write_string_with_format(row_idx, col, &s, format)?;
            }
            Cell::Int(n) => {
                worksheet.write_number_with_format(row_idx, col, n as f64, format)?;
            }
            Cell::Float(n) => {
                worksheet.write_number_with_format(row_idx, col, n, format)?;
            }
            Cell::Missing => {
                worksheet.write_blank(row_idx, col, format)?;
            }
        }
    }
    Ok(())
}
