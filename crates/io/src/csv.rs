// CSV/TSV import

use std::io::Read;
use std::path::Path;

use claimgrid_pipeline::{Cell, Table};

/// Field values read as missing, matching what spreadsheet and dataframe
/// tools write for "no value".
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn import(path: &Path) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter)
        .map_err(|e| format!("{}: {e}", path.display()))
}

pub fn import_with_delimiter(path: &Path, delimiter: u8) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content, delimiter)
        .map_err(|e| format!("{}: {e}", path.display()))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| format!("cannot open {}: {e}", path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s)),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Parse delimited text whose first record is the header row.
///
/// Each column is typed as a whole: if every non-missing value parses as a
/// number the column is numeric, otherwise every value stays text.
pub fn import_from_string(content: &str, delimiter: u8) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(r) => r.map_err(|e| e.to_string())?,
        None => return Ok(Table::default()),
    };
    let columns = unique_headers(header.iter());
    let width = columns.len();

    let mut raw: Vec<Vec<Option<String>>> = Vec::new();
    for (idx, result) in records.enumerate() {
        let record = result.map_err(|e| e.to_string())?;
        // Blank lines are skipped by the reader; a lone empty field is the same thing
        if record.len() == 1 && record[0].is_empty() && width > 1 {
            continue;
        }
        if record.len() > width {
            return Err(format!(
                "line {}: expected {width} fields, saw {}",
                idx + 2,
                record.len()
            ));
        }
        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|f| if NA_VALUES.contains(&f.trim()) { None } else { Some(f.to_string()) })
            .collect();
        row.resize(width, None);
        raw.push(row);
    }

    let numeric: Vec<bool> = (0..width).map(|col| is_numeric_column(&raw, col)).collect();

    let rows = raw
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&numeric)
                .map(|(value, &is_num)| match value {
                    None => Cell::Empty,
                    Some(v) if is_num => v.trim().parse::<f64>().map(Cell::Number).unwrap_or(Cell::Text(v)),
                    Some(v) => Cell::Text(v),
                })
                .collect()
        })
        .collect();

    Ok(Table::with_rows(columns, rows))
}

fn is_numeric_column(rows: &[Vec<Option<String>>], col: usize) -> bool {
    let mut seen = false;
    for row in rows {
        if let Some(v) = &row[col] {
            if v.trim().parse::<f64>().is_err() {
                return false;
            }
            seen = true;
        }
    }
    seen
}

/// Header names made unique: blanks become `Unnamed: <i>`, repeats get a
/// `.1`, `.2`, ... suffix.
pub(crate) fn unique_headers<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (i, name) in names.enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            name.trim().to_string()
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while out.contains(&candidate) {
            candidate = format!("{base}.{n}");
            n += 1;
        }
        out.push(candidate);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Name;Age;City\nAlice;30;Paris\nBob;25;London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "Name,Age,City\nAlice,30,Paris\nBob,25,London\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "Name;Address;City\n\"Doe, Jane\";\"123 Main St, Apt 4\";Paris\nBob;\"456 Elm\";London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_column_type_inference() {
        let t = import_from_string(
            "ClaimNo,Billed,PolicyNo\nC1,100,P1\nC2,,P2\nC3,12.5,P3\n",
            b',',
        )
        .unwrap();
        assert_eq!(t.columns(), &["ClaimNo", "Billed", "PolicyNo"].map(String::from));
        assert_eq!(t.cell(0, 0), &Cell::from("C1"));
        assert_eq!(t.cell(0, 1), &Cell::Number(100.0));
        assert_eq!(t.cell(1, 1), &Cell::Empty);
        assert_eq!(t.cell(2, 1), &Cell::Number(12.5));
    }

    #[test]
    fn test_mixed_column_stays_text() {
        let t = import_from_string("NoteNo\n123\nN-7\n", b',').unwrap();
        assert_eq!(t.cell(0, 0), &Cell::from("123"));
        assert_eq!(t.cell(1, 0), &Cell::from("N-7"));
    }

    #[test]
    fn test_na_values_are_empty() {
        let t = import_from_string("RoomOption,Billed\nNaN,NA\nvip,5\n", b',').unwrap();
        assert!(t.cell(0, 0).is_empty());
        assert!(t.cell(0, 1).is_empty());
        assert_eq!(t.cell(1, 1), &Cell::Number(5.0));
    }

    #[test]
    fn test_short_rows_padded_long_rows_rejected() {
        let t = import_from_string("a,b,c\n1,2\n", b',').unwrap();
        assert_eq!(t.rows()[0].len(), 3);
        assert!(t.cell(0, 2).is_empty());

        let err = import_from_string("a,b\n1,2,3\n", b',').unwrap_err();
        assert!(err.contains("line 2"), "{err}");
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let t = import_from_string("A,A,,A\n1,2,3,4\n", b',').unwrap();
        assert_eq!(t.columns(), &["A", "A.1", "Unnamed: 2", "A.2"].map(String::from));
    }

    #[test]
    fn test_header_only() {
        let t = import_from_string("ClaimNo,ClaimStatus\n", b',').unwrap();
        assert_eq!(t.width(), 2);
        assert!(t.is_empty());
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "Café" in Windows-1252
        fs::write(&path, b"Name,Billed\nCaf\xe9,1\n").unwrap();
        let t = import(&path).unwrap();
        assert_eq!(t.cell(0, 0), &Cell::from("Café"));
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        fs::write(&path, "\u{feff}PolicyNo,Company\nP1,Acme\n").unwrap();
        let t = import(&path).unwrap();
        assert_eq!(t.columns()[0], "PolicyNo");
    }

    #[test]
    fn test_semicolon_file_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.csv");
        fs::write(&path, "ClaimNo;ClaimStatus\nC1;R\nC2;P\n").unwrap();
        let t = import(&path).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.cell(1, 1), &Cell::from("P"));
    }
}
