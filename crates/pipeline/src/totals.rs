use serde::Serialize;

use crate::aggregate::amount;
use crate::error::PipelineError;
use crate::schema::SC;
use crate::table::Table;
use crate::template::{SUM_ACCEPTED, SUM_BILLED, SUM_EXCESS_TOTAL, SUM_UNPAID};

/// Headline figures over the SC template.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ClaimTotals {
    pub total_claims: usize,
    pub total_billed: f64,
    pub total_accepted: f64,
    pub total_excess: f64,
    pub total_unpaid: f64,
}

impl ClaimTotals {
    pub fn from_template(claims: &Table) -> Result<Self, PipelineError> {
        Ok(Self {
            total_claims: claims.len(),
            total_billed: column_sum(claims, SUM_BILLED)?,
            total_accepted: column_sum(claims, SUM_ACCEPTED)?,
            total_excess: column_sum(claims, SUM_EXCESS_TOTAL)?,
            total_unpaid: column_sum(claims, SUM_UNPAID)?,
        })
    }
}

fn column_sum(table: &Table, column: &str) -> Result<f64, PipelineError> {
    let idx = table.require_column(SC, column)?;
    table
        .column(idx)
        .enumerate()
        .map(|(row, cell)| amount(cell, SC, column, row + 1))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use crate::template::claim_headers;

    #[test]
    fn sums_template_columns() {
        let headers = claim_headers();
        let billed = headers.iter().position(|h| h == SUM_BILLED).unwrap();
        let accepted = headers.iter().position(|h| h == SUM_ACCEPTED).unwrap();

        let mut t = Table::new(headers);
        let mut row = vec![Cell::Empty; t.width()];
        row[billed] = Cell::Number(150.0);
        row[accepted] = Cell::Number(120.0);
        t.push_row(row.clone());
        row[billed] = Cell::Number(50.0);
        row[accepted] = Cell::Empty;
        t.push_row(row);

        let totals = ClaimTotals::from_template(&t).unwrap();
        assert_eq!(totals.total_claims, 2);
        assert_eq!(totals.total_billed, 200.0);
        assert_eq!(totals.total_accepted, 120.0);
        assert_eq!(totals.total_unpaid, 0.0);
    }

    #[test]
    fn empty_template_is_zero() {
        let t = Table::new(claim_headers());
        assert_eq!(ClaimTotals::from_template(&t).unwrap(), ClaimTotals::default());
    }
}
