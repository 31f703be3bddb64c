//! Field normalization: date coercion, upper-casing, room-option cleanup.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::diagnostics::Diagnostic;
use crate::error::PipelineError;
use crate::schema::ROOM_OPTION_COLUMN;
use crate::table::{Cell, Table};

// Formats whose field order is fixed by the format itself.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%b %d, %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y", "%d %b %Y", "%b %d, %Y", "%b %d %Y"];

// Numeric day/month/year forms, one set per field order.
const MONTH_FIRST_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y",
    "%m-%d-%Y %H:%M:%S",
    "%m-%d-%Y %H:%M",
    "%m-%d-%Y",
    "%m.%d.%Y %H:%M:%S",
    "%m.%d.%Y %H:%M",
    "%m.%d.%Y",
];

const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d-%m-%Y",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d.%m.%Y",
];

/// Room-option spellings that all mean "no value".
const MISSING_SENTINELS: &[&str] = &["NAN", "NONE", "NaN", "nan", ""];

/// Which columns of a table get which treatment.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec<'a> {
    pub date_columns: &'a [String],
    pub text_columns: &'a [String],
}

/// How to read a numeric date such as `03/04/2024` whose first two fields
/// could each be the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOrder {
    #[default]
    MonthFirst,
    DayFirst,
}

impl DateOrder {
    fn formats(self) -> (&'static [&'static str], &'static [&'static str]) {
        match self {
            Self::MonthFirst => (MONTH_FIRST_FORMATS, DAY_FIRST_FORMATS),
            Self::DayFirst => (DAY_FIRST_FORMATS, MONTH_FIRST_FORMATS),
        }
    }
}

/// Leading `a?b?yyyy` fields of a numeric date, separator `/`, `-` or `.`.
fn numeric_date_fields(s: &str) -> Option<(u32, u32)> {
    let date = s.split([' ', 'T']).next()?;
    let sep = date.chars().find(|c| matches!(c, '/' | '-' | '.'))?;
    let parts: Vec<&str> = date.split(sep).collect();
    match parts.as_slice() {
        [a, b, y] if y.len() == 4 && y.bytes().all(|c| c.is_ascii_digit()) => {
            Some((a.parse().ok()?, b.parse().ok()?))
        }
        _ => None,
    }
}

/// Field order of a date column, decided by its first value that can only be
/// read one way. Month-first when no value settles it.
pub fn infer_date_order<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> DateOrder {
    cells
        .into_iter()
        .filter_map(Cell::as_text)
        .filter_map(|s| numeric_date_fields(s.trim()))
        .find_map(|(a, b)| match (a, b) {
            (a, b) if a > 12 && b <= 12 => Some(DateOrder::DayFirst),
            (a, b) if b > 12 && a <= 12 => Some(DateOrder::MonthFirst),
            _ => None,
        })
        .unwrap_or_default()
}

/// `yyyymmdd` with no separators.
fn parse_compact_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(s[..4].parse().ok()?, s[4..6].parse().ok()?, s[6..].parse().ok()?)
}

fn parse_with(s: &str, formats: &[&str]) -> Option<NaiveDateTime> {
    formats.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(s, fmt)
            .ok()
            .or_else(|| NaiveDate::parse_from_str(s, fmt).ok().and_then(|d| d.and_hms_opt(0, 0, 0)))
    })
}

/// Parse a date or date-time in any of the accepted export formats, reading
/// ambiguous numeric dates month-first.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    parse_datetime_ordered(raw, DateOrder::MonthFirst)
}

/// Parse a date or date-time, reading ambiguous numeric dates in `order`.
/// A numeric date only valid in the other order is still accepted.
pub fn parse_datetime_ordered(raw: &str, order: DateOrder) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    if let Some(dt) = parse_with(s, DATETIME_FORMATS).or_else(|| parse_with(s, DATE_FORMATS)) {
        return Some(dt);
    }

    if let Some(d) = parse_compact_date(s) {
        return d.and_hms_opt(0, 0, 0);
    }

    let (preferred, fallback) = order.formats();
    parse_with(s, preferred).or_else(|| parse_with(s, fallback))
}

/// Coerce a single cell to a date-time. Anything that does not parse is empty.
pub fn coerce_datetime(cell: &Cell, order: DateOrder) -> Cell {
    match cell {
        Cell::DateTime(dt) => Cell::DateTime(*dt),
        Cell::Text(s) => parse_datetime_ordered(s, order).map(Cell::DateTime).unwrap_or(Cell::Empty),
        Cell::Empty | Cell::Number(_) => Cell::Empty,
    }
}

/// Convert each named column to date-times. Emits one `InvalidDates`
/// diagnostic per column left holding any empty value.
pub fn coerce_dates(
    table: &mut Table,
    label: &str,
    columns: &[String],
) -> Result<Vec<Diagnostic>, PipelineError> {
    let mut diagnostics = Vec::new();

    for column in columns {
        let idx = table.require_column(label, column)?;
        let order = infer_date_order(table.column(idx));
        log::debug!("{label}: column '{column}' read as {order:?}");
        table.map_column(idx, |cell| coerce_datetime(cell, order));

        let count = table.column(idx).filter(|c| c.is_empty()).count();
        if count > 0 {
            log::warn!("{label}: {count} invalid date value(s) in column '{column}'");
            diagnostics.push(Diagnostic::InvalidDates {
                table: label.into(),
                column: column.clone(),
                count,
            });
        }
    }

    Ok(diagnostics)
}

/// Upper-case the text cells of each named column.
pub fn uppercase_columns(table: &mut Table, label: &str, columns: &[String]) -> Result<(), PipelineError> {
    for column in columns {
        let idx = table.require_column(label, column)?;
        table.map_column(idx, |cell| match cell {
            Cell::Text(s) => Cell::Text(s.to_uppercase()),
            other => other.clone(),
        });
    }
    Ok(())
}

/// Canonical room option: text, trimmed, upper-cased, `ON PLAN` joined,
/// every missing spelling collapsed to `""`.
pub fn normalize_room_option(cell: &Cell) -> Cell {
    let text = match cell {
        Cell::Empty => "nan".to_string(),
        other => other.to_string(),
    };

    let mut value = text.trim().to_uppercase();
    if value == "ON PLAN" {
        value = "ONPLAN".into();
    }
    if MISSING_SENTINELS.contains(&value.as_str()) {
        value.clear();
    }
    Cell::Text(value)
}

/// Apply date coercion, upper-casing and room-option cleanup. Idempotent.
pub fn normalize_fields(
    mut table: Table,
    label: &str,
    spec: FieldSpec<'_>,
) -> Result<(Table, Vec<Diagnostic>), PipelineError> {
    let diagnostics = coerce_dates(&mut table, label, spec.date_columns)?;
    uppercase_columns(&mut table, label, spec.text_columns)?;

    let room = table.require_column(label, ROOM_OPTION_COLUMN)?;
    table.map_column(room, normalize_room_option);

    Ok((table, diagnostics))
}
