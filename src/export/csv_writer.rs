//! Tabular export of the aligned table.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::analyzer::AlignedTable;

/// Write one header row and one row per aligned index.
///
/// Values are the unsmoothed aligned samples, formatted so they parse back to
/// the same `f64`.
pub fn write_table<W: Write>(table: &AlignedTable, writer: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    let mode = table.mode();
    writer.write_record(table.columns().map(|(key, _)| key.column_label(mode)))?;
    for i in 0..table.len() {
        writer.write_record(table.row(i).iter().map(f64::to_string))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the table to `path`, replacing any existing file.
pub fn write_table_file(table: &AlignedTable, path: &Path) -> Result<(), csv::Error> {
    let file = File::create(path)?;
    write_table(table, file)
}
