use crate::aggregate::summarize_policies;
use crate::config::PipelineConfig;
use crate::diagnostics::Diagnostic;
use crate::error::PipelineError;
use crate::schema;
use crate::table::Table;
use crate::template::{map_benefits, map_claims};
use crate::totals::ClaimTotals;

/// Raw tables as loaded from the three export files.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub sc: Table,
    pub benefit: Table,
    /// CR policy summary.
    pub summary: Table,
}

/// Everything the report writer and the caller need from one run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Per-policy rollup (Summary sheet).
    pub summary: Table,
    /// Claim template (SC sheet).
    pub sc: Table,
    /// Benefit template (Benefit sheet).
    pub benefit: Table,
    pub totals: ClaimTotals,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the whole pipeline. All three inputs are checked against their column
/// contracts before any stage runs.
pub fn run(config: &PipelineConfig, input: PipelineInput) -> Result<PipelineOutput, PipelineError> {
    schema::check_sc(&input.sc, config)?;
    schema::check_benefit(&input.benefit, config)?;
    schema::check_summary(&input.summary)?;

    let sc = map_claims(input.sc, config)?;
    let benefit = map_benefits(input.benefit, config)?;
    let summary = summarize_policies(&sc.table, &input.summary)?;
    let totals = ClaimTotals::from_template(&sc.table)?;

    let mut diagnostics = sc.diagnostics;
    diagnostics.extend(benefit.diagnostics);

    log::debug!(
        "pipeline: {} SC row(s), {} Benefit row(s), {} Summary row(s), {} diagnostic(s)",
        sc.table.len(),
        benefit.table.len(),
        summary.len(),
        diagnostics.len()
    );

    Ok(PipelineOutput {
        summary,
        sc: sc.table,
        benefit: benefit.table,
        totals,
        diagnostics,
    })
}
