use serde_json::Value;

use project_eval_core::engine::FINANCIAL_SUMMARY;

use super::{cell_text, result_tables, table_rows};

/// Headline indicators shown for a projection run.
const HEADLINE_ROWS: [&str; 3] = ["财务净现值", "财务内部收益率", "投资回收期"];

/// Print just the key answer values from the output.
pub fn print_minimal(value: &Value) {
    if let Some(tables) = result_tables(value) {
        if let Some(summary) = tables.get(FINANCIAL_SUMMARY) {
            let (_, rows) = table_rows(summary);
            for (label, cells) in rows {
                if HEADLINE_ROWS.contains(&label.as_str()) {
                    println!("{}: {}", label, cells.first().cloned().unwrap_or_default());
                }
            }
        } else if let Some((name, _)) = tables.iter().next() {
            println!("{}", name);
        }
        return;
    }

    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = ["npv", "irr", "payback"];

    if let Value::Object(map) = result_obj {
        let mut printed = false;
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                println!("{}: {}", key, format_minimal(val));
                printed = true;
            }
        }
        if printed {
            return;
        }
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    if let Value::Array(items) = result_obj {
        for item in items {
            println!("{}", cell_text(item));
        }
        return;
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::Null => "N/A".to_string(),
        _ => cell_text(value),
    }
}
