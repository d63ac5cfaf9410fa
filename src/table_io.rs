//! CSV input course lists and output tables.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

use crate::record::CourseTable;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A course list exported from a spreadsheet: a header row and its data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseList {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CourseList {
    /// Position of the column named `name`.
    pub fn column(&self, name: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| {
                format!(
                    "Course list has no {name:?} column (columns: {})",
                    self.header.join(", ")
                )
            })
    }
}

/// Read a course list, fitting every row to the header width.
///
/// The reader drops a leading UTF-8 byte order mark, so spreadsheet exports
/// keep their first column name intact.
pub fn read_course_list(path: &Path) -> Result<CourseList> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open course list {}", path.display()))?;

    let header: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Failed to read row {} of {}", line + 2, path.display()))?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.len() > header.len() {
            warn!(row = line + 2, "dropping cells beyond the header width");
        }
        row.resize(header.len(), String::new());
        rows.push(row);
    }

    info!(path = %path.display(), rows = rows.len(), "read course list");
    Ok(CourseList { header, rows })
}

/// Write `table` to `path`, replacing any existing file.
pub fn write_table(path: &Path, table: &CourseTable, bom: bool) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_table_to(BufWriter::new(file), table, bom)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), rows = table.len(), "wrote table");
    Ok(())
}

/// Serialize the header and every row of `table` as CSV.
pub fn write_table_to<W: Write>(mut out: W, table: &CourseTable, bom: bool) -> Result<()> {
    if bom {
        out.write_all(UTF8_BOM)?;
    }
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(table.header())?;
    for row in table.rows() {
        writer.write_record(row.cells())?;
    }
    writer.flush()?;
    Ok(())
}
