//! Column contracts for the three input datasets.
//!
//! Each input is checked once, before any transformation, so a wrong export
//! fails with a named missing column instead of partway through a stage.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::table::Table;
use crate::template::CLAIM_TEMPLATE;

// ---------------------------------------------------------------------------
// Table labels (also the report sheet names)
// ---------------------------------------------------------------------------

pub const SC: &str = "SC";
pub const BENEFIT: &str = "Benefit";
pub const CR: &str = "CR";
pub const SUMMARY: &str = "Summary";

// ---------------------------------------------------------------------------
// Canonical source columns
// ---------------------------------------------------------------------------

pub const STATUS_COLUMN: &str = "ClaimStatus";
pub const CLAIM_ID_COLUMN: &str = "ClaimNo";
pub const ROOM_OPTION_COLUMN: &str = "RoomOption";
pub const SETTLED_DATE_COLUMN: &str = "Date";

/// Policy identifier in the CR summary table.
pub const SUMMARY_POLICY_COLUMN: &str = "PolicyNo";
pub const SUMMARY_COMPANY_COLUMN: &str = "Company";
pub const SUMMARY_PREMIUM_COLUMN: &str = "Net Premi";

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// Columns the raw SC export must carry.
pub fn sc_required(config: &PipelineConfig) -> Vec<String> {
    let mut cols = vec![STATUS_COLUMN.to_string(), CLAIM_ID_COLUMN.to_string()];
    cols.extend(CLAIM_TEMPLATE.iter().filter_map(|c| c.source_column()).map(String::from));
    cols.extend(config.sc.date_columns.iter().cloned());
    cols.extend(config.sc.text_columns.iter().cloned());
    cols.push(ROOM_OPTION_COLUMN.to_string());
    dedup_preserving_order(cols)
}

/// Columns the raw Benefit export must carry (before the status rename).
pub fn benefit_required(config: &PipelineConfig) -> Vec<String> {
    let mut cols = vec![config.benefit.status_column.clone()];
    cols.extend(config.benefit.date_columns.iter().cloned());
    cols.extend(config.benefit.text_columns.iter().cloned());
    cols.push(ROOM_OPTION_COLUMN.to_string());
    cols.extend(config.benefit.drop_columns.iter().cloned());
    dedup_preserving_order(cols)
}

/// Columns the CR policy summary must carry.
pub fn summary_required() -> Vec<String> {
    [SUMMARY_POLICY_COLUMN, SUMMARY_COMPANY_COLUMN, SUMMARY_PREMIUM_COLUMN]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Fail on the first required column absent from `table`.
pub fn check_columns(table: &Table, label: &str, required: &[String]) -> Result<(), PipelineError> {
    for column in required {
        table.require_column(label, column)?;
    }
    Ok(())
}

pub fn check_sc(table: &Table, config: &PipelineConfig) -> Result<(), PipelineError> {
    check_columns(table, SC, &sc_required(config))
}

pub fn check_benefit(table: &Table, config: &PipelineConfig) -> Result<(), PipelineError> {
    check_columns(table, BENEFIT, &benefit_required(config))
}

pub fn check_summary(table: &Table) -> Result<(), PipelineError> {
    check_columns(table, CR, &summary_required())
}

fn dedup_preserving_order(cols: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(cols.len());
    for c in cols {
        if !out.contains(&c) {
            out.push(c);
        }
    }
    out
}
