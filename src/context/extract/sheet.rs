use anyhow::{Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

/// Cell values per sheet as `a | b | c` rows under a `Sheet: <name>` marker.
/// Empty cells and empty rows are skipped.
pub fn read_spreadsheet(bytes: &[u8]) -> Result<String> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).context("Failed to open workbook")?;

    let mut lines = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("Failed to read sheet '{name}'"))?;

        lines.push(format!("Sheet: {name}"));
        for row in range.rows() {
            let cells: Vec<String> = row
                .iter()
                .filter(|cell| !matches!(cell, Data::Empty))
                .map(|cell| cell.to_string())
                .collect();
            if !cells.is_empty() {
                lines.push(cells.join(" | "));
            }
        }
    }

    Ok(lines.join("\n"))
}
