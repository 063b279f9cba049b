use serde_json::Value;
use std::io;

use super::{cell_text, result_tables, table_rows};

/// Write output as CSV to stdout. A table set is written table after table,
/// each introduced by a record holding its name.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(stdout.lock());

    if let Some(tables) = result_tables(value) {
        for (name, table) in tables {
            let (columns, rows) = table_rows(table);
            let _ = wtr.write_record([name.as_str()]);
            let mut header = vec!["项目".to_string()];
            header.extend(columns);
            let _ = wtr.write_record(&header);
            for (label, cells) in rows {
                let mut record = vec![label];
                record.extend(cells);
                let _ = wtr.write_record(&record);
            }
        }
        let _ = wtr.flush();
        return;
    }

    match value {
        Value::Object(map) => {
            let fields = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in fields {
                let _ = wtr.write_record([key.as_str(), &cell_text(val)]);
            }
        }
        Value::Array(arr) => {
            for item in arr {
                let _ = wtr.write_record([&cell_text(item)]);
            }
        }
        _ => {
            let _ = wtr.write_record([&cell_text(value)]);
        }
    }

    let _ = wtr.flush();
}
