//! Per-policy rollup of the SC template, left-joined onto the CR summary.

use std::collections::{HashMap, HashSet};

use crate::error::PipelineError;
use crate::schema::{
    SC, CR, SUMMARY_COMPANY_COLUMN, SUMMARY_POLICY_COLUMN, SUMMARY_PREMIUM_COLUMN,
};
use crate::table::{Cell, Table};
use crate::template::{
    POLICY_NO, SUM_ACCEPTED, SUM_BILLED, SUM_EXCESS_COY, SUM_EXCESS_EMP, SUM_EXCESS_TOTAL,
    SUM_UNPAID,
};

/// Output columns of the Summary sheet, in order.
pub const SUMMARY_COLUMNS: [&str; 8] = [
    "Company",
    "Net Premi",
    "Billed",
    "Unpaid",
    "ExcessTotal",
    "ExcessCoy",
    "ExcessEmp",
    "Claim",
];

/// Template column summed into each aggregate, in `SUMMARY_COLUMNS[2..]` order.
const ROLLUPS: [&str; 6] = [
    SUM_BILLED,
    SUM_UNPAID,
    SUM_EXCESS_TOTAL,
    SUM_EXCESS_COY,
    SUM_EXCESS_EMP,
    SUM_ACCEPTED,
];

/// Summed monetary fields for one policy.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PolicyAggregate {
    pub billed: f64,
    pub unpaid: f64,
    pub excess_total: f64,
    pub excess_coy: f64,
    pub excess_emp: f64,
    /// Sum of Accepted.
    pub claim: f64,
}

impl PolicyAggregate {
    fn add(&mut self, values: [f64; 6]) {
        self.billed += values[0];
        self.unpaid += values[1];
        self.excess_total += values[2];
        self.excess_coy += values[3];
        self.excess_emp += values[4];
        self.claim += values[5];
    }

    fn cells(&self) -> [Cell; 6] {
        [
            Cell::Number(self.billed),
            Cell::Number(self.unpaid),
            Cell::Number(self.excess_total),
            Cell::Number(self.excess_coy),
            Cell::Number(self.excess_emp),
            Cell::Number(self.claim),
        ]
    }
}

/// Numeric value of a monetary cell. Empty counts as zero; text must parse.
pub(crate) fn amount(
    cell: &Cell,
    table: &str,
    column: &str,
    row: usize,
) -> Result<f64, PipelineError> {
    match cell {
        Cell::Empty => Ok(0.0),
        Cell::Number(n) => Ok(*n),
        Cell::Text(s) if s.trim().is_empty() => Ok(0.0),
        Cell::Text(s) => s.trim().parse::<f64>().map_err(|_| PipelineError::InvalidNumber {
            table: table.into(),
            column: column.into(),
            row,
            value: s.clone(),
        }),
        Cell::DateTime(_) => Err(PipelineError::InvalidNumber {
            table: table.into(),
            column: column.into(),
            row,
            value: cell.to_string(),
        }),
    }
}

/// Group SC template rows by normalized `Policy No` and sum the monetary
/// columns. Rows with an empty policy are not grouped.
pub fn aggregate_policies(claims: &Table) -> Result<HashMap<String, PolicyAggregate>, PipelineError> {
    let policy = claims.require_column(SC, POLICY_NO)?;
    let indices: Vec<usize> = ROLLUPS
        .iter()
        .map(|c| claims.require_column(SC, c))
        .collect::<Result<_, _>>()?;

    let mut groups: HashMap<String, PolicyAggregate> = HashMap::new();
    for (row_idx, row) in claims.rows().iter().enumerate() {
        let key = row[policy].key();
        if key.is_empty() {
            continue;
        }

        let mut values = [0.0; 6];
        for (slot, (&col, name)) in indices.iter().zip(ROLLUPS).enumerate() {
            values[slot] = amount(&row[col], SC, name, row_idx + 1)?;
        }
        groups.entry(key).or_default().add(values);
    }

    Ok(groups)
}

/// Distinct non-empty policy identifiers in the SC template, cast to text
/// and trimmed.
pub fn claim_policies(claims: &Table) -> Result<HashSet<String>, PipelineError> {
    let policy = claims.require_column(SC, POLICY_NO)?;
    Ok(claims.column(policy).map(Cell::key).filter(|k| !k.is_empty()).collect())
}

/// Restrict the CR summary to rows whose policy is in `policies`. All summary
/// columns are kept; this is a filter, not a join.
pub fn filter_summary(summary: &Table, policies: &HashSet<String>) -> Result<Table, PipelineError> {
    let idx = summary.require_column(CR, SUMMARY_POLICY_COLUMN)?;
    let mut filtered = summary.clone();
    filtered.retain_rows(|row| policies.contains(&row[idx].key()));
    Ok(filtered)
}

/// Left join: every `summary` row appears once, in order, projected to
/// [`SUMMARY_COLUMNS`]. Policies without an aggregate get empty amounts.
pub fn join_aggregates(
    summary: &Table,
    aggregates: &HashMap<String, PolicyAggregate>,
) -> Result<Table, PipelineError> {
    let policy = summary.require_column(CR, SUMMARY_POLICY_COLUMN)?;
    let company = summary.require_column(CR, SUMMARY_COMPANY_COLUMN)?;
    let premium = summary.require_column(CR, SUMMARY_PREMIUM_COLUMN)?;

    let mut out = Table::from_headers(&SUMMARY_COLUMNS);
    for row in summary.rows() {
        let mut cells = vec![row[company].clone(), row[premium].clone()];
        match aggregates.get(&row[policy].key()) {
            Some(agg) => cells.extend(agg.cells()),
            None => cells.extend(std::iter::repeat(Cell::Empty).take(ROLLUPS.len())),
        }
        out.push_row(cells);
    }
    Ok(out)
}

/// Build the Summary sheet: restrict the CR summary to the policies present
/// in `claims`, then left-join the per-policy aggregates onto it.
pub fn summarize_policies(claims: &Table, summary: &Table) -> Result<Table, PipelineError> {
    let policies = claim_policies(claims)?;
    let filtered = filter_summary(summary, &policies)?;
    let aggregates = aggregate_policies(claims)?;
    let out = join_aggregates(&filtered, &aggregates)?;

    log::debug!(
        "Summary: {} of {} policy row(s) matched {} claim policy(ies)",
        out.len(),
        summary.len(),
        policies.len()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::claim_headers;

    /// SC template with only policy + money columns populated.
    fn template(rows: &[(&str, f64, f64)]) -> Table {
        let headers = claim_headers();
        let mut t = Table::new(headers.clone());
        for (policy, accepted, unpaid) in rows {
            let row = headers
                .iter()
                .map(|h| match h.as_str() {
                    POLICY_NO => Cell::from(*policy),
                    SUM_ACCEPTED => Cell::Number(*accepted),
                    SUM_UNPAID => Cell::Number(*unpaid),
                    SUM_BILLED => Cell::Number(accepted + unpaid),
                    _ => Cell::Empty,
                })
                .collect();
            t.push_row(row);
        }
        t
    }

    fn cr(rows: &[(&str, &str, f64)]) -> Table {
        Table::with_rows(
            vec!["PolicyNo".into(), "Company".into(), "Net Premi".into()],
            rows.iter()
                .map(|(p, c, n)| vec![Cell::from(*p), Cell::from(*c), Cell::Number(*n)])
                .collect(),
        )
    }

    fn col(t: &Table, name: &str) -> usize {
        t.column_index(name).unwrap()
    }

    #[test]
    fn sums_accepted_into_claim() {
        let claims = template(&[("P1", 100.0, 10.0), ("P1", 200.0, 5.0)]);
        let out = summarize_policies(&claims, &cr(&[("P1", "Acme", 1000.0)])).unwrap();

        assert_eq!(out.columns(), &SUMMARY_COLUMNS.map(String::from));
        assert_eq!(out.len(), 1);
        assert_eq!(out.cell(0, col(&out, "Company")), &Cell::from("Acme"));
        assert_eq!(out.cell(0, col(&out, "Net Premi")), &Cell::Number(1000.0));
        assert_eq!(out.cell(0, col(&out, "Claim")), &Cell::Number(300.0));
        assert_eq!(out.cell(0, col(&out, "Unpaid")), &Cell::Number(15.0));
        assert_eq!(out.cell(0, col(&out, "Billed")), &Cell::Number(315.0));
        assert_eq!(out.cell(0, col(&out, "ExcessCoy")), &Cell::Number(0.0));
    }

    #[test]
    fn summary_filtered_to_claim_policies() {
        let claims = template(&[("P1", 1.0, 0.0)]);
        let out = summarize_policies(
            &claims,
            &cr(&[("P9", "Other", 1.0), ("P1", "Acme", 2.0), ("P8", "Else", 3.0)]),
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.cell(0, 0), &Cell::from("Acme"));
    }

    #[test]
    fn duplicate_summary_rows_each_joined() {
        let claims = template(&[("P1", 50.0, 0.0)]);
        let out = summarize_policies(&claims, &cr(&[("P1", "Acme", 1.0), ("P1", "Acme Re", 2.0)]))
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.cell(1, col(&out, "Claim")), &Cell::Number(50.0));
    }

    #[test]
    fn policy_keys_trimmed_and_cast() {
        let claims = template(&[(" 1001 ", 7.0, 0.0)]);
        let mut summary = Table::from_headers(&["PolicyNo", "Company", "Net Premi"]);
        summary.push_row(vec![Cell::Number(1001.0), Cell::from("Numeric Co"), Cell::Number(9.0)]);

        let out = summarize_policies(&claims, &summary).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.cell(0, col(&out, "Claim")), &Cell::Number(7.0));
    }

    #[test]
    fn left_join_keeps_policy_without_claims() {
        let claims = template(&[("P1", 100.0, 10.0), ("P1", 200.0, 5.0)]);
        let aggs = aggregate_policies(&claims).unwrap();
        let summary = cr(&[("P1", "Acme", 1000.0), ("P2", "Beta", 500.0)]);

        let out = join_aggregates(&summary, &aggs).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.cell(0, col(&out, "Claim")), &Cell::Number(300.0));
        assert_eq!(out.cell(1, col(&out, "Company")), &Cell::from("Beta"));
        assert_eq!(out.cell(1, col(&out, "Net Premi")), &Cell::Number(500.0));
        for name in &SUMMARY_COLUMNS[2..] {
            assert!(out.cell(1, col(&out, name)).is_empty(), "{name}");
        }
    }

    #[test]
    fn filter_keeps_all_summary_columns() {
        let claims = template(&[("P1", 1.0, 0.0)]);
        let policies = claim_policies(&claims).unwrap();
        let filtered = filter_summary(&cr(&[("P1", "Acme", 1.0), ("P3", "Gamma", 2.0)]), &policies)
            .unwrap();
        assert_eq!(filtered.width(), 3);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn text_amounts_parse_and_garbage_fails() {
        let mut claims = template(&[("P1", 0.0, 0.0)]);
        let accepted = col(&claims, SUM_ACCEPTED);
        let mut rows = claims.clone().into_rows();
        rows[0][accepted] = Cell::from(" 12.5 ");
        claims = Table::with_rows(claims.columns().to_vec(), rows.clone());
        assert_eq!(aggregate_policies(&claims).unwrap()["P1"].claim, 12.5);

        rows[0][accepted] = Cell::from("n/a");
        claims = Table::with_rows(claims.columns().to_vec(), rows);
        let err = aggregate_policies(&claims).unwrap_err();
        assert_eq!(
            err,
            PipelineError::InvalidNumber {
                table: "SC".into(),
                column: "Sum of Accepted".into(),
                row: 1,
                value: "n/a".into(),
            }
        );
    }

    #[test]
    fn empty_policy_rows_not_grouped() {
        let claims = template(&[("", 5.0, 0.0), ("P1", 1.0, 0.0)]);
        let aggs = aggregate_policies(&claims).unwrap();
        assert_eq!(aggs.len(), 1);
    }
}
