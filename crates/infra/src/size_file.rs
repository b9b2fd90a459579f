//! Bangle size table file.
//!
//! One `<size> - <circumference mm>` pair per line. Lines that do not start
//! with a digit (titles, blank lines, footers) are ignored.

use std::path::Path;

use tracing::info;

use bangler_catalog::SizeTable;
use bangler_core::{DomainError, DomainResult};

pub fn parse_size_table(text: &str) -> DomainResult<SizeTable> {
    let mut entries = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if !line.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        entries.push(parse_line(line).ok_or_else(|| {
            DomainError::configuration(format!(
                "size table line {}: expected \"<size> - <mm>\", got {line:?}",
                idx + 1
            ))
        })?);
    }
    SizeTable::from_entries(entries)
}

pub fn load_size_table(path: &Path) -> DomainResult<SizeTable> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        DomainError::configuration(format!("cannot read size table {}: {e}", path.display()))
    })?;
    let table = parse_size_table(&text)?;
    info!(path = %path.display(), sizes = table.len(), "size table loaded");
    Ok(table)
}

fn parse_line(line: &str) -> Option<(u32, f64)> {
    let (size, mm) = line.split_once('-')?;
    let mm = mm.trim();
    let mm = mm
        .strip_suffix("mm")
        .or_else(|| mm.strip_suffix("MM"))
        .or_else(|| mm.strip_suffix("Mm"))
        .unwrap_or(mm);
    Some((size.trim().parse().ok()?, mm.trim().parse().ok()?))
}
