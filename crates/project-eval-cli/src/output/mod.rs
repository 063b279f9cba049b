pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The named tables of a projection envelope, when `result` is a table set.
pub(crate) fn result_tables(value: &Value) -> Option<&Map<String, Value>> {
    let result = value.get("result")?.as_object()?;
    let is_table_set = !result.is_empty()
        && result
            .values()
            .all(|t| t.get("columns").is_some() && t.get("rows").is_some());
    is_table_set.then_some(result)
}

/// Column headings and `(label, cells)` rows of one serialized table.
pub(crate) fn table_rows(table: &Value) -> (Vec<String>, Vec<(String, Vec<String>)>) {
    let columns = table
        .get("columns")
        .and_then(Value::as_array)
        .map(|cols| cols.iter().map(cell_text).collect())
        .unwrap_or_default();
    let rows = table
        .get("rows")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    let label = row.get("label").map(cell_text).unwrap_or_default();
                    let cells = row
                        .get("cells")
                        .and_then(Value::as_array)
                        .map(|cells| cells.iter().map(cell_text).collect())
                        .unwrap_or_default();
                    (label, cells)
                })
                .collect()
        })
        .unwrap_or_default();
    (columns, rows)
}

pub(crate) fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
