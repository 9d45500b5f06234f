use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, row_headers, split_rows};

/// Render the result envelope as tables using the tabled crate.
///
/// Scalar result fields go in a Field/Value table; a nested array of rows
/// (sweep points) gets its own table below it.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(envelope) => match envelope.get("result") {
            Some(Value::Object(result)) => {
                print_result(result);
                print_footer(envelope);
            }
            _ => print_fields(envelope.iter().map(|(k, v)| (k.as_str(), v)).collect()),
        },
        Value::Array(rows) => print_rows(rows),
        other => println!("{}", cell(other, "null")),
    }
}

fn print_result(result: &Map<String, Value>) {
    let (scalars, rows) = split_rows(result);
    let has_fields = !scalars.is_empty();
    if has_fields {
        print_fields(scalars);
    }
    if let Some(rows) = rows {
        if has_fields {
            println!();
        }
        print_rows(rows);
    }
}

fn print_fields(fields: Vec<(&str, &Value)>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in fields {
        builder.push_record([key.to_string(), cell(val, "-")]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    let headers = row_headers(rows);
    if headers.is_empty() {
        for item in rows {
            println!("{}", cell(item, "-"));
        }
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(headers.iter().cloned());
    for item in rows {
        builder.push_record(
            headers
                .iter()
                .map(|h| item.get(h).map(|v| cell(v, "-")).unwrap_or_default()),
        );
    }
    println!("{}", Table::from(builder));
}

fn print_footer(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
