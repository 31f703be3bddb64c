//! Reshape cleaned exports into the reporting template.

use chrono::Datelike;

use crate::config::PipelineConfig;
use crate::dedup::keep_last_duplicate;
use crate::diagnostics::Diagnostic;
use crate::error::PipelineError;
use crate::filter::filter_status;
use crate::normalize::{normalize_fields, FieldSpec};
use crate::schema::{self, BENEFIT, CLAIM_ID_COLUMN, SC, SETTLED_DATE_COLUMN, STATUS_COLUMN};
use crate::table::{Cell, Table};

// ---------------------------------------------------------------------------
// Claim template layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// 1-based row number.
    Sequence,
    Column(&'static str),
    Year(&'static str),
    Month(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct TemplateColumn {
    pub header: &'static str,
    pub source: Source,
}

impl TemplateColumn {
    const fn new(header: &'static str, source: Source) -> Self {
        Self { header, source }
    }

    /// The raw column this output column reads, if any.
    pub fn source_column(&self) -> Option<&'static str> {
        match self.source {
            Source::Sequence => None,
            Source::Column(c) | Source::Year(c) | Source::Month(c) => Some(c),
        }
    }
}

use Source::{Column, Month, Sequence, Year};

/// Output columns of the SC sheet, in order.
pub const CLAIM_TEMPLATE: &[TemplateColumn] = &[
    TemplateColumn::new("No", Sequence),
    TemplateColumn::new("Policy No", Column("PolicyNo")),
    TemplateColumn::new("Client Name", Column("ClientName")),
    TemplateColumn::new("Note No", Column("NoteNo")),
    TemplateColumn::new("Claim No", Column("ClaimNo")),
    TemplateColumn::new("Member No", Column("MemberNo")),
    TemplateColumn::new("Emp ID", Column("EmpID")),
    TemplateColumn::new("Emp Name", Column("EmpName")),
    TemplateColumn::new("Patient Name", Column("PatientName")),
    TemplateColumn::new("Membership", Column("Membership")),
    TemplateColumn::new("Product Type", Column("ProductType")),
    TemplateColumn::new("Claim Type", Column("ClaimType")),
    TemplateColumn::new("Room Option", Column("RoomOption")),
    TemplateColumn::new("Area", Column("Area")),
    TemplateColumn::new("Plan", Column("PPlan")),
    TemplateColumn::new("Diagnosis", Column("PrimaryDiagnosis")),
    TemplateColumn::new("Treatment Place", Column("TreatmentPlace")),
    TemplateColumn::new("Treatment Start", Column("TreatmentStart")),
    TemplateColumn::new("Treatment Finish", Column("TreatmentFinish")),
    TemplateColumn::new("Settled Date", Column(SETTLED_DATE_COLUMN)),
    TemplateColumn::new("Year", Year(SETTLED_DATE_COLUMN)),
    TemplateColumn::new("Month", Month(SETTLED_DATE_COLUMN)),
    TemplateColumn::new("Length of Stay", Column("LOS")),
    TemplateColumn::new("Sum of Billed", Column("Billed")),
    TemplateColumn::new("Sum of Accepted", Column("Accepted")),
    TemplateColumn::new("Sum of Excess Coy", Column("ExcessCoy")),
    TemplateColumn::new("Sum of Excess Emp", Column("ExcessEmp")),
    TemplateColumn::new("Sum of Excess Total", Column("ExcessTotal")),
    TemplateColumn::new("Sum of Unpaid", Column("Unpaid")),
];

pub const POLICY_NO: &str = "Policy No";
pub const SUM_BILLED: &str = "Sum of Billed";
pub const SUM_ACCEPTED: &str = "Sum of Accepted";
pub const SUM_EXCESS_COY: &str = "Sum of Excess Coy";
pub const SUM_EXCESS_EMP: &str = "Sum of Excess Emp";
pub const SUM_EXCESS_TOTAL: &str = "Sum of Excess Total";
pub const SUM_UNPAID: &str = "Sum of Unpaid";

pub fn claim_headers() -> Vec<String> {
    CLAIM_TEMPLATE.iter().map(|c| c.header.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TemplateOutput {
    pub table: Table,
    pub diagnostics: Vec<Diagnostic>,
}

// ---------------------------------------------------------------------------
// Claim variant
// ---------------------------------------------------------------------------

/// Filter, deduplicate, normalize and project a raw SC export onto
/// [`CLAIM_TEMPLATE`].
pub fn map_claims(raw: Table, config: &PipelineConfig) -> Result<TemplateOutput, PipelineError> {
    schema::check_sc(&raw, config)?;

    let filtered = filter_status(raw, SC, STATUS_COLUMN, &config.accepted_status)?;
    let (deduped, duplicate) = keep_last_duplicate(filtered, SC, CLAIM_ID_COLUMN)?;

    let spec = FieldSpec {
        date_columns: &config.sc.date_columns,
        text_columns: &config.sc.text_columns,
    };
    let (clean, date_diags) = normalize_fields(deduped, SC, spec)?;

    let mut diagnostics: Vec<Diagnostic> = duplicate.into_iter().collect();
    diagnostics.extend(date_diags);

    let table = project_claims(&clean)?;
    log::debug!("{SC}: {} row(s) mapped to template", table.len());
    Ok(TemplateOutput { table, diagnostics })
}

fn project_claims(clean: &Table) -> Result<Table, PipelineError> {
    let indices: Vec<Option<usize>> = CLAIM_TEMPLATE
        .iter()
        .map(|c| c.source_column().map(|s| clean.require_column(SC, s)).transpose())
        .collect::<Result<_, _>>()?;

    let mut out = Table::new(claim_headers());
    for (n, row) in clean.rows().iter().enumerate() {
        let cells = CLAIM_TEMPLATE
            .iter()
            .zip(&indices)
            .map(|(col, idx)| {
                let src = idx.map(|i| &row[i]);
                match (col.source, src) {
                    (Source::Sequence, _) => Cell::Number((n + 1) as f64),
                    (Source::Column(_), Some(cell)) => cell.clone(),
                    (Source::Year(_), Some(cell)) => date_part(cell, |d| d.year() as f64),
                    (Source::Month(_), Some(cell)) => date_part(cell, |d| d.month() as f64),
                    (_, None) => Cell::Empty,
                }
            })
            .collect();
        out.push_row(cells);
    }
    Ok(out)
}

fn date_part(cell: &Cell, part: impl Fn(chrono::NaiveDateTime) -> f64) -> Cell {
    cell.as_datetime().map(|d| Cell::Number(part(d))).unwrap_or(Cell::Empty)
}

// ---------------------------------------------------------------------------
// Benefit variant
// ---------------------------------------------------------------------------

/// Rename the raw status column, filter, normalize and drop raw-only columns.
/// All other columns pass through in source order; no deduplication.
pub fn map_benefits(raw: Table, config: &PipelineConfig) -> Result<TemplateOutput, PipelineError> {
    schema::check_benefit(&raw, config)?;

    let mut renamed = raw;
    let status = &config.benefit.status_column;
    if status != STATUS_COLUMN {
        // A stray canonical column would shadow the renamed one
        if renamed.column_index(STATUS_COLUMN).is_some() {
            renamed.drop_columns(BENEFIT, &[STATUS_COLUMN.to_string()])?;
        }
        renamed.rename_column(status, STATUS_COLUMN);
    }

    let filtered = filter_status(renamed, BENEFIT, STATUS_COLUMN, &config.accepted_status)?;

    let spec = FieldSpec {
        date_columns: &config.benefit.date_columns,
        text_columns: &config.benefit.text_columns,
    };
    let (mut clean, diagnostics) = normalize_fields(filtered, BENEFIT, spec)?;

    clean.drop_columns(BENEFIT, &config.benefit.drop_columns)?;
    log::debug!("{BENEFIT}: {} row(s) mapped to template", clean.len());
    Ok(TemplateOutput { table: clean, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw_sc_headers() -> Vec<String> {
        let mut cols: Vec<String> = CLAIM_TEMPLATE
            .iter()
            .filter_map(|c| c.source_column())
            .map(String::from)
            .collect();
        cols.dedup();
        cols.push("ClaimStatus".into());
        cols
    }

    fn raw_sc_row(headers: &[String], claim: &str, status: &str, date: &str) -> Vec<Cell> {
        headers
            .iter()
            .map(|h| match h.as_str() {
                "ClaimNo" => Cell::from(claim),
                "ClaimStatus" => Cell::from(status),
                "PolicyNo" => Cell::from("P1"),
                "Date" | "TreatmentStart" | "TreatmentFinish" => Cell::from(date),
                "RoomOption" => Cell::from("on plan"),
                "Billed" | "Accepted" | "ExcessCoy" | "ExcessEmp" | "ExcessTotal" | "Unpaid" => {
                    Cell::Number(10.0)
                }
                other => Cell::text(format!("{other}-{claim}")),
            })
            .collect()
    }

    #[test]
    fn template_has_29_columns_in_order() {
        let headers = claim_headers();
        assert_eq!(headers.len(), 29);
        assert_eq!(headers[0], "No");
        assert_eq!(headers[19], "Settled Date");
        assert_eq!(headers[20], "Year");
        assert_eq!(headers[21], "Month");
        assert_eq!(headers[28], "Sum of Unpaid");
    }

    #[test]
    fn claims_sequence_follows_filtered_order() {
        let headers = raw_sc_headers();
        let raw = Table::with_rows(
            headers.clone(),
            vec![
                raw_sc_row(&headers, "C1", "R", "2024-01-10"),
                raw_sc_row(&headers, "C2", "P", "2024-01-11"),
                raw_sc_row(&headers, "C3", "R", "2024-02-12"),
                raw_sc_row(&headers, "C1", "R", "2024-03-13"),
            ],
        );
        let out = map_claims(raw, &PipelineConfig::default()).unwrap();
        let t = &out.table;

        assert_eq!(t.len(), 2);
        let no = t.column_index("No").unwrap();
        let claim = t.column_index("Claim No").unwrap();
        let month = t.column_index("Month").unwrap();
        assert_eq!(t.cell(0, no), &Cell::Number(1.0));
        assert_eq!(t.cell(1, no), &Cell::Number(2.0));
        assert_eq!(t.cell(0, claim), &Cell::from("C3"));
        assert_eq!(t.cell(1, claim), &Cell::from("C1"));
        assert_eq!(t.cell(1, month), &Cell::Number(3.0));

        let room = t.column_index("Room Option").unwrap();
        assert_eq!(t.cell(0, room), &Cell::from("ONPLAN"));

        assert!(matches!(out.diagnostics[0], Diagnostic::DuplicateClaims { .. }));
    }

    #[test]
    fn year_month_empty_for_bad_date() {
        let headers = raw_sc_headers();
        let raw = Table::with_rows(headers.clone(), vec![raw_sc_row(&headers, "C1", "R", "soon")]);
        let out = map_claims(raw, &PipelineConfig::default()).unwrap();
        let t = &out.table;
        for col in ["Settled Date", "Year", "Month"] {
            assert!(t.cell(0, t.column_index(col).unwrap()).is_empty(), "{col}");
        }
        assert_eq!(out.diagnostics.len(), 3);
    }

    #[test]
    fn settled_date_carries_through() {
        let headers = raw_sc_headers();
        let raw = Table::with_rows(headers.clone(), vec![raw_sc_row(&headers, "C1", "R", "2023-12-31")]);
        let t = map_claims(raw, &PipelineConfig::default()).unwrap().table;
        let expected = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(t.cell(0, t.column_index("Settled Date").unwrap()), &Cell::DateTime(expected));
        assert_eq!(t.cell(0, t.column_index("Year").unwrap()), &Cell::Number(2023.0));
    }

    #[test]
    fn missing_source_column_is_fatal() {
        let mut headers = raw_sc_headers();
        headers.retain(|h| h != "PPlan");
        let raw = Table::new(headers);
        let err = map_claims(raw, &PipelineConfig::default()).unwrap_err();
        assert_eq!(err, PipelineError::MissingColumn { table: "SC".into(), column: "PPlan".into() });
    }

    fn raw_benefit() -> Table {
        Table::with_rows(
            vec![
                "ClaimNo".into(),
                "Status_Claim".into(),
                "StatusClaim".into(),
                "TreatmentStart".into(),
                "TreatmentFinish".into(),
                "PaymentDate".into(),
                "RoomOption".into(),
                "TreatmentPlace".into(),
                "Diagnosis".into(),
                "BAmount".into(),
                "Benefit".into(),
            ],
            vec![
                vec![
                    "B1".into(), "R".into(), "Settled".into(), "2024-01-01".into(),
                    "2024-01-03".into(), "2024-01-20".into(), "none".into(),
                    "rs a".into(), "flu".into(), Cell::Number(5.0), "ROOM".into(),
                ],
                vec![
                    "B2".into(), "X".into(), "Rejected".into(), "2024-01-01".into(),
                    "2024-01-03".into(), "2024-01-20".into(), "on plan".into(),
                    "rs b".into(), "cold".into(), Cell::Number(6.0), "ROOM".into(),
                ],
                vec![
                    "B1".into(), "R".into(), "Settled".into(), "2024-02-01".into(),
                    "2024-02-03".into(), "".into(), " on plan ".into(),
                    "rs c".into(), "typhoid".into(), Cell::Number(7.0), "SURGERY".into(),
                ],
            ],
        )
    }

    #[test]
    fn benefits_rename_filter_and_drop() {
        let out = map_benefits(raw_benefit(), &PipelineConfig::default()).unwrap();
        let t = &out.table;

        assert_eq!(
            t.columns(),
            &[
                "ClaimNo", "ClaimStatus", "TreatmentStart", "TreatmentFinish", "PaymentDate",
                "RoomOption", "TreatmentPlace", "Diagnosis", "Benefit",
            ]
            .map(String::from)
        );
        // Both accepted rows kept: benefits are not deduplicated
        assert_eq!(t.len(), 2);
        assert_eq!(t.cell(0, 5), &Cell::from(""));
        assert_eq!(t.cell(1, 5), &Cell::from("ONPLAN"));
        assert_eq!(t.cell(1, 7), &Cell::from("TYPHOID"));

        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::InvalidDates {
                table: "Benefit".into(),
                column: "PaymentDate".into(),
                count: 1,
            }]
        );
    }

    #[test]
    fn benefits_missing_drop_column_is_fatal() {
        let mut raw = raw_benefit();
        raw.drop_columns("t", &["BAmount".to_string()]).unwrap();
        let err = map_benefits(raw, &PipelineConfig::default()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::MissingColumn { table: "Benefit".into(), column: "BAmount".into() }
        );
    }
}
