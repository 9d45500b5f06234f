use serde_json::Value;
use std::io;

use super::{cell, row_headers, split_rows};

type StdoutCsv<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write the result as CSV to stdout.
///
/// A result carrying rows (sweep points) is written one row per point;
/// anything else becomes a two-column `field,value` listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let outcome = match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => match split_rows(result) {
                (_, Some(rows)) => write_rows(&mut wtr, rows),
                (scalars, None) => write_fields(&mut wtr, scalars),
            },
            _ => write_fields(&mut wtr, map.iter().map(|(k, v)| (k.as_str(), v)).collect()),
        },
        Value::Array(rows) => write_rows(&mut wtr, rows),
        other => wtr.write_record([cell(other, "")]),
    };

    if let Err(e) = outcome.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV write error: {}", e);
    }
}

fn write_fields(wtr: &mut StdoutCsv<'_>, fields: Vec<(&str, &Value)>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in fields {
        wtr.write_record([key, cell(val, "").as_str()])?;
    }
    Ok(())
}

fn write_rows(wtr: &mut StdoutCsv<'_>, rows: &[Value]) -> csv::Result<()> {
    let headers = row_headers(rows);
    if headers.is_empty() {
        for item in rows {
            wtr.write_record([cell(item, "")])?;
        }
        return Ok(());
    }

    wtr.write_record(&headers)?;
    for item in rows {
        let row: Vec<String> = headers
            .iter()
            .map(|h| item.get(h).map(|v| cell(v, "")).unwrap_or_default())
            .collect();
        wtr.write_record(&row)?;
    }
    Ok(())
}
