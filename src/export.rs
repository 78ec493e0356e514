use std::path::Path;

use anyhow::{Context, Result};

use crate::table::ParsedTable;

/// Serialize a parsed table to CSV: header row first, then data rows.
/// Fields containing the separator, quotes, or line breaks are quoted with
/// doubled-quote escaping.
pub fn to_csv(table: &ParsedTable) -> String {
    let mut out = String::new();
    write_row(&mut out, &table.header);
    for row in &table.rows {
        write_row(&mut out, row);
    }
    out
}

/// Write a parsed table to `path` as CSV.
pub fn write_csv(table: &ParsedTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, to_csv(table))
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn write_row(out: &mut String, row: &[String]) {
    let mut first = true;
    for cell in row {
        if !first {
            out.push(',');
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}
