// Excel import (CR policy summary) and XLSX report export

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook as XlsxWorkbook, Worksheet};

use claimgrid_pipeline::schema::{BENEFIT, SC, SUMMARY};
use claimgrid_pipeline::{Cell, Table};

use crate::csv::unique_headers;

/// Excel number format applied to date-time cells.
pub const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Longest string, in characters, an Excel cell holds.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Day zero of the 1900 date system as Excel counts it (the 1900 leap-year
/// bug folded in, valid for serials from 1900-03-01 on).
fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Convert an Excel serial date (1900 system) to a date-time, to the nearest millisecond.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    excel_epoch().checked_add_signed(Duration::milliseconds(millis))
}

pub fn datetime_to_excel_serial(dt: NaiveDateTime) -> f64 {
    let delta = dt - excel_epoch();
    delta.num_milliseconds() as f64 / 86_400_000.0
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Import one sheet of an Excel file (xlsx, xls, xlsb, ods) as a table whose
/// first row is the header. `sheet` defaults to the first sheet.
pub fn import(path: &Path, sheet: Option<&str>) -> Result<Table, String> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file {}: {}", path.display(), e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| format!("Sheet '{}' not found (available: {})", name, sheet_names.join(", ")))?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| "Excel file contains no sheets".to_string())?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(h) => h,
        None => return Ok(Table::default()),
    };
    let header_text: Vec<String> = header.iter().map(|c| c.to_string()).collect();
    let columns = unique_headers(header_text.iter().map(|s| s.as_str()));

    let mut table = Table::new(columns);
    for row in rows {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        table.push_row(row.iter().map(data_to_cell).collect());
    }

    log::debug!("{}: read {} row(s) from sheet '{}'", path.display(), table.len(), sheet_name);
    Ok(table)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        // Store as TRUE/FALSE text
        Data::Bool(b) => Cell::text(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(Cell::DateTime)
            .unwrap_or(Cell::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// A finished report, ready to hand to whoever stores or sends it.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ReportArtifact {
    /// Write the artifact into `dir` under its file name.
    pub fn save_in(&self, dir: &Path) -> Result<PathBuf, String> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        log::info!("wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// `name` with an `.xlsx` extension, added only when missing.
pub fn report_file_name(name: &str) -> String {
    let name = name.trim();
    if name.to_ascii_lowercase().ends_with(".xlsx") {
        name.to_string()
    } else {
        format!("{name}.xlsx")
    }
}

/// Write the three report tables to the "Summary", "SC" and "Benefit" sheets
/// of one workbook, in that order. Empty tables still get their header row.
pub fn export_report(
    summary: &Table,
    sc: &Table,
    benefit: &Table,
    name: &str,
) -> Result<ReportArtifact, String> {
    let mut xlsx_workbook = XlsxWorkbook::new();

    for (sheet_name, table) in [(SUMMARY, summary), (SC, sc), (BENEFIT, benefit)] {
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(sheet_name)
            .map_err(|e| format!("Failed to create sheet '{}': {}", sheet_name, e))?;
        write_table(worksheet, table)
            .map_err(|e| format!("Failed to write sheet '{}': {}", sheet_name, e))?;
    }

    let bytes = xlsx_workbook
        .save_to_buffer()
        .map_err(|e| format!("Failed to build XLSX file: {}", e))?;

    Ok(ReportArtifact { file_name: report_file_name(name), bytes })
}

/// Header row in bold with a thin border, then one row per table row.
fn write_table(worksheet: &mut Worksheet, table: &Table) -> Result<(), rust_xlsxwriter::XlsxError> {
    let header_format = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::Top);
    let datetime_format = Format::new().set_num_format(DATETIME_NUM_FORMAT);

    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let row32 = (row_idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col16 = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) if s.is_empty() => {}
                Cell::Text(s) => match s.char_indices().nth(MAX_CELL_CHARS) {
                    Some((cut, _)) => {
                        log::warn!(
                            "{}: text in row {}, column '{}' truncated to {} characters",
                            worksheet.name(),
                            row32,
                            table.columns()[col],
                            MAX_CELL_CHARS
                        );
                        worksheet.write_string(row32, col16, &s[..cut])?;
                    }
                    None => {
                        worksheet.write_string(row32, col16, s)?;
                    }
                },
                Cell::Number(n) if n.is_finite() => {
                    worksheet.write_number(row32, col16, *n)?;
                }
                // NaN / inf have no cell representation
                Cell::Number(_) => {}
                Cell::DateTime(dt) => {
                    worksheet.write_number_with_format(
                        row32,
                        col16,
                        datetime_to_excel_serial(*dt),
                        &datetime_format,
                    )?;
                }
            }
        }
    }

    worksheet.autofit();
    Ok(())
}
