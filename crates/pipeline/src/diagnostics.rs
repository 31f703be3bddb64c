//! Non-fatal findings reported alongside transformed tables.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Claim identifiers seen more than once; only the last row of each was kept.
    DuplicateClaims {
        table: String,
        column: String,
        values: Vec<String>,
    },
    /// Date column holds values that could not be parsed (or were missing);
    /// those cells are now empty.
    InvalidDates {
        table: String,
        column: String,
        count: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateClaims { table, column, values } => {
                write!(f, "{table}: duplicated {column} values: {}", values.join(", "))
            }
            Self::InvalidDates { table, column, count } => {
                write!(
                    f,
                    "{table}: invalid date values detected in column '{column}' ({count} row(s)), coerced to empty"
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_column() {
        let d = Diagnostic::InvalidDates { table: "SC".into(), column: "Date".into(), count: 2 };
        assert_eq!(
            d.to_string(),
            "SC: invalid date values detected in column 'Date' (2 row(s)), coerced to empty"
        );

        let d = Diagnostic::DuplicateClaims {
            table: "SC".into(),
            column: "ClaimNo".into(),
            values: vec!["C1".into(), "C7".into()],
        };
        assert_eq!(d.to_string(), "SC: duplicated ClaimNo values: C1, C7");
    }
}
