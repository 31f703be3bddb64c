use std::collections::HashMap;

use crate::diagnostics::Diagnostic;
use crate::error::PipelineError;
use crate::table::Table;

/// Keep the last row for each value of `column`.
///
/// Returns a `DuplicateClaims` diagnostic listing every value that occurred
/// more than once, in order of first appearance. Surviving rows keep their
/// relative input order.
pub fn keep_last_duplicate(
    mut table: Table,
    label: &str,
    column: &str,
) -> Result<(Table, Option<Diagnostic>), PipelineError> {
    let idx = table.require_column(label, column)?;
    let keys: Vec<String> = table.column(idx).map(|c| c.to_string()).collect();

    let mut last_seen: HashMap<&str, usize> = HashMap::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (row, key) in keys.iter().enumerate() {
        last_seen.insert(key.as_str(), row);
        *counts.entry(key.as_str()).or_insert(0) += 1;
    }

    let mut duplicated: Vec<String> = Vec::new();
    for key in &keys {
        if counts[key.as_str()] > 1 && !duplicated.contains(key) {
            duplicated.push(key.clone());
        }
    }

    let keep: Vec<bool> = keys
        .iter()
        .enumerate()
        .map(|(row, key)| last_seen[key.as_str()] == row)
        .collect();
    let mut row = 0;
    table.retain_rows(|_| {
        let k = keep[row];
        row += 1;
        k
    });

    let diagnostic = if duplicated.is_empty() {
        None
    } else {
        log::warn!("{label}: {} duplicated {column} value(s), keeping last", duplicated.len());
        Some(Diagnostic::DuplicateClaims {
            table: label.into(),
            column: column.into(),
            values: duplicated,
        })
    };

    Ok((table, diagnostic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn claims(rows: &[(&str, f64)]) -> Table {
        Table::with_rows(
            vec!["ClaimNo".into(), "Billed".into()],
            rows.iter().map(|(id, b)| vec![Cell::from(*id), Cell::Number(*b)]).collect(),
        )
    }

    #[test]
    fn no_duplicates_no_diagnostic() {
        let (out, diag) =
            keep_last_duplicate(claims(&[("C1", 1.0), ("C2", 2.0)]), "SC", "ClaimNo").unwrap();
        assert_eq!(out.len(), 2);
        assert!(diag.is_none());
    }

    #[test]
    fn keeps_last_occurrence() {
        let input = claims(&[("C1", 1.0), ("C2", 2.0), ("C1", 3.0), ("C3", 4.0), ("C2", 5.0)]);
        let (out, diag) = keep_last_duplicate(input, "SC", "ClaimNo").unwrap();

        let rows: Vec<(String, f64)> = out
            .rows()
            .iter()
            .map(|r| (r[0].to_string(), r[1].as_number().unwrap()))
            .collect();
        assert_eq!(
            rows,
            vec![("C1".to_string(), 3.0), ("C3".to_string(), 4.0), ("C2".to_string(), 5.0)]
        );

        assert_eq!(
            diag,
            Some(Diagnostic::DuplicateClaims {
                table: "SC".into(),
                column: "ClaimNo".into(),
                values: vec!["C1".into(), "C2".into()],
            })
        );
    }

    #[test]
    fn triple_duplicate_reported_once() {
        let input = claims(&[("C1", 1.0), ("C1", 2.0), ("C1", 3.0)]);
        let (out, diag) = keep_last_duplicate(input, "SC", "ClaimNo").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.cell(0, 1), &Cell::Number(3.0));
        match diag {
            Some(Diagnostic::DuplicateClaims { values, .. }) => assert_eq!(values, vec!["C1"]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
