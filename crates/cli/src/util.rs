use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use claimgrid_pipeline::Table;

/// Widest a preview column may grow before its cells are truncated.
const MAX_PREVIEW_WIDTH: usize = 24;

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s
            .chars()
            .next()
            .filter(|ch| ch.width().unwrap_or(0) <= width)
            .map(String::from)
            .unwrap_or_default();
    }

    // Leave room for ".."
    let budget = width - 2;
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = ch.width().unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out.push_str("..");
    out
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = display_width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// Insert `,` every three digits of a run of ASCII digits.
fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1234` → `1,234`
pub(crate) fn format_count(n: usize) -> String {
    group_digits(&n.to_string())
}

/// `12345.5` → `12,345.50`
pub(crate) fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{}.{frac}", group_digits(int_part))
}

// ---------------------------------------------------------------------------
// Preview grid
// ---------------------------------------------------------------------------

/// First `n` rows of `table` as an aligned text grid: header, rule, rows.
pub(crate) fn render_grid(table: &Table, n: usize) -> String {
    let head = table.head(n);
    let cells: Vec<Vec<String>> = head
        .rows()
        .iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect();

    let widths: Vec<usize> = head
        .columns()
        .iter()
        .enumerate()
        .map(|(col, name)| {
            cells
                .iter()
                .map(|row| display_width(&row[col]))
                .chain(std::iter::once(display_width(name)))
                .max()
                .unwrap_or(0)
                .min(MAX_PREVIEW_WIDTH)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&grid_line(head.columns(), &widths));
    out.push('\n');
    out.push_str(&widths.iter().map(|&w| "-".repeat(w)).collect::<Vec<_>>().join("-+-"));
    out.push('\n');
    for row in &cells {
        out.push_str(&grid_line(row, &widths));
        out.push('\n');
    }
    out
}

fn grid_line(values: &[String], widths: &[usize]) -> String {
    values
        .iter()
        .zip(widths)
        .map(|(v, &w)| pad_right(v, w))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}
