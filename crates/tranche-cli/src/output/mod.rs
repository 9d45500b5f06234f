pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;
pub mod yaml;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
        OutputFormat::Yaml => yaml::print_yaml(value),
    }
}

/// Split a result object into scalar fields and the first array of row
/// objects (e.g. sweep `points`).
pub(crate) fn split_rows(
    result: &Map<String, Value>,
) -> (Vec<(&str, &Value)>, Option<&[Value]>) {
    let mut scalars = Vec::new();
    let mut rows = None;
    for (key, val) in result {
        match val {
            Value::Array(items) if rows.is_none() && is_row_set(items) => {
                rows = Some(items.as_slice());
            }
            _ => scalars.push((key.as_str(), val)),
        }
    }
    (scalars, rows)
}

fn is_row_set(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(Value::is_object)
}

/// Column order taken from the first row.
pub(crate) fn row_headers(rows: &[Value]) -> Vec<String> {
    match rows.first() {
        Some(Value::Object(first)) => first.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

/// Render a scalar cell; nested values fall back to compact JSON.
pub(crate) fn cell(value: &Value, null: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => null.to_string(),
        Value::Array(arr) => arr
            .iter()
            .map(|v| cell(v, null))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
