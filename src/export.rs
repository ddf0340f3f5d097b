//! CSV export of a flattened table.

use std::path::Path;

use csv::Writer;
use serde_json::Value;

use crate::error::ExportError;
use crate::flatten::Table;

/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "analytics_results.csv";

/// Write the table to `path`, replacing any existing file.
pub fn write_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<(), ExportError> {
    let path = path.as_ref();
    let mut wtr = Writer::from_path(path)?;

    wtr.write_record(&table.header)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(render_cell))?;
    }
    wtr.flush()?;

    tracing::info!(path = %path.display(), rows = table.rows.len(), "Wrote CSV export");
    Ok(())
}

/// Render one cell. Strings are written verbatim, `null` as an empty cell, everything else as
/// its JSON text.
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
