use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell_text, result_tables, table_rows};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    if let Some(tables) = result_tables(value) {
        for (name, table) in tables {
            print_named_table(name, table);
        }
        if let Value::Object(envelope) = value {
            print_notes(envelope);
        }
        return;
    }

    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_flat_object(result);
                print_notes(map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => {
            for item in arr {
                println!("{}", cell_text(item));
            }
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_named_table(name: &str, table: &Value) {
    let (columns, rows) = table_rows(table);
    let mut builder = Builder::default();
    let mut header = vec!["项目".to_string()];
    header.extend(columns);
    builder.push_record(header);
    for (label, cells) in rows {
        let mut record = vec![label];
        record.extend(cells);
        builder.push_record(record);
    }
    println!("{}", name);
    println!("{}\n", Table::from(builder));
}

fn print_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &cell_text(val)]);
        }
        println!("{}", Table::from(builder));
    } else {
        println!("{}", cell_text(value));
    }
}
