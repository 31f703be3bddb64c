use crate::error::PipelineError;
use crate::table::Table;

/// Keep only rows whose `column` reads exactly `accepted`. Other rows are
/// dropped without a diagnostic.
pub fn filter_status(
    mut table: Table,
    label: &str,
    column: &str,
    accepted: &str,
) -> Result<Table, PipelineError> {
    let idx = table.require_column(label, column)?;
    let before = table.len();
    table.retain_rows(|row| row[idx].to_string() == accepted);
    log::debug!("{label}: status filter kept {} of {before} row(s)", table.len());
    Ok(table)
}
