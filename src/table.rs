use std::fmt;

/// Literal the model is instructed to return when the requested data is not
/// on the page.
pub const NO_DATA_SENTINEL: &str = "NO_DATA_FOUND";

/// A pipe-delimited markdown table recovered from model output. Every row has
/// exactly `header.len()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Why a response containing `|` still failed to parse as a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoTableReason {
    /// No pipe character anywhere: plain prose, shown to the user as-is.
    NoDelimiter,
    /// Fewer than header + separator + one data row.
    InvalidFormat,
    /// Table-shaped lines were present but none matched the header width.
    NoValidRows,
}

impl fmt::Display for NoTableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            NoTableReason::NoDelimiter => "no table structure in response",
            NoTableReason::InvalidFormat => "invalid table format",
            NoTableReason::NoValidRows => "no valid data rows",
        };
        f.write_str(msg)
    }
}

/// Result of interpreting raw model output. The raw text always travels with
/// the non-table outcomes so the caller can show it for manual inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum TableOutcome {
    /// Blank response or the explicit no-data sentinel.
    Empty,
    /// Output could not be read as a table; `raw` is delivered verbatim.
    NoTable { raw: String, reason: NoTableReason },
    Table(ParsedTable),
}

/// Best-effort parse of model output into a table.
///
/// The producer is untrusted: it interleaves commentary, drifts on column
/// counts, and mangles delimiters. Line filtering is therefore permissive
/// (any non-empty line with a `|` counts), while row acceptance is strict
/// (cell count must equal the header width). Ragged rows are dropped
/// silently instead of failing the whole table.
pub fn extract_table(raw: &str) -> TableOutcome {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == NO_DATA_SENTINEL {
        return TableOutcome::Empty;
    }

    if !trimmed.contains('|') {
        return TableOutcome::NoTable {
            raw: raw.to_string(),
            reason: NoTableReason::NoDelimiter,
        };
    }

    // Keep only table-shaped lines; narrative text around the table is a
    // routine artifact of imperfect model output.
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && l.contains('|'))
        .collect();

    // Header + separator + at least one data row
    if lines.len() < 3 {
        return TableOutcome::NoTable {
            raw: raw.to_string(),
            reason: NoTableReason::InvalidFormat,
        };
    }

    let header = split_cells(lines[0]);

    // lines[1] is the separator row; skipped without validating its dashes.
    let rows: Vec<Vec<String>> = lines[2..]
        .iter()
        .map(|l| split_cells(l))
        .filter(|cells| cells.len() == header.len())
        .collect();

    if rows.is_empty() {
        return TableOutcome::NoTable {
            raw: raw.to_string(),
            reason: NoTableReason::NoValidRows,
        };
    }

    TableOutcome::Table(ParsedTable { header, rows })
}

/// Split a table line on `|`, dropping the first and last segments (artifacts
/// of the leading/trailing delimiters) and trimming the rest.
fn split_cells(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < 2 {
        return Vec::new();
    }
    parts[1..parts.len() - 1]
        .iter()
        .map(|c| c.trim().to_string())
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_table() {
        let raw = "| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |";
        match extract_table(raw) {
            TableOutcome::Table(t) => {
                assert_eq!(t.header, ["A", "B"]);
                assert_eq!(t.rows, [["1", "2"], ["3", "4"]]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn sentinel_short_circuits() {
        assert_eq!(extract_table("NO_DATA_FOUND"), TableOutcome::Empty);
        assert_eq!(extract_table("  NO_DATA_FOUND \n"), TableOutcome::Empty);
    }

    #[test]
    fn blank_is_empty() {
        assert_eq!(extract_table(""), TableOutcome::Empty);
        assert_eq!(extract_table("   \n  "), TableOutcome::Empty);
    }

    #[test]
    fn prose_passes_through_verbatim() {
        let raw = "Just a sentence.";
        match extract_table(raw) {
            TableOutcome::NoTable { raw: r, reason } => {
                assert_eq!(r, raw);
                assert_eq!(reason, NoTableReason::NoDelimiter);
            }
            other => panic!("expected passthrough, got {:?}", other),
        }
    }

    #[test]
    fn header_and_separator_alone_is_invalid() {
        let raw = "| A | B |\n|---|---|";
        match extract_table(raw) {
            TableOutcome::NoTable { reason, .. } => {
                assert_eq!(reason, NoTableReason::InvalidFormat);
            }
            other => panic!("expected invalid format, got {:?}", other),
        }
    }

    #[test]
    fn ragged_rows_are_dropped() {
        let raw = "| A | B |\n|---|---|\n| 1 | 2 | 3 |\n| 4 | 5 |";
        match extract_table(raw) {
            TableOutcome::Table(t) => {
                assert_eq!(t.rows, [["4", "5"]]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn all_rows_ragged_means_no_valid_rows() {
        let raw = "| A | B |\n|---|---|\n| 1 | 2 | 3 |\n| x |";
        match extract_table(raw) {
            TableOutcome::NoTable { reason, .. } => {
                assert_eq!(reason, NoTableReason::NoValidRows);
            }
            other => panic!("expected no valid rows, got {:?}", other),
        }
    }

    #[test]
    fn narrative_around_table_is_discarded() {
        let raw = "Here is the data you asked for:\n\n\
                   | Name | Price |\n|------|-------|\n| Laptop | $999 |\n\n\
                   Let me know if you need anything else.";
        match extract_table(raw) {
            TableOutcome::Table(t) => {
                assert_eq!(t.header, ["Name", "Price"]);
                assert_eq!(t.rows, [["Laptop", "$999"]]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn separator_content_is_not_validated() {
        // Second surviving line is skipped whatever it contains
        let raw = "| A | B |\n| not | dashes |\n| 1 | 2 |";
        match extract_table(raw) {
            TableOutcome::Table(t) => {
                assert_eq!(t.rows, [["1", "2"]]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn cells_are_trimmed() {
        let raw = "|  A  |  B |\n|---|---|\n|  1  |2   |";
        match extract_table(raw) {
            TableOutcome::Table(t) => {
                assert_eq!(t.header, ["A", "B"]);
                assert_eq!(t.rows, [["1", "2"]]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn model_output_fixture() {
        let raw = std::fs::read_to_string("tests/fixtures/model_output.txt").unwrap();
        match extract_table(&raw) {
            TableOutcome::Table(t) => {
                assert_eq!(t.header, ["Product", "Price", "Stock"]);
                assert_eq!(t.rows.len(), 3);
                assert!(t.rows.iter().all(|r| r.len() == t.header.len()));
            }
            other => panic!("expected table, got {:?}", other),
        }
    }
}
