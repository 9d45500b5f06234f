use serde_json::Value;

use super::cell;

/// Print only the post-redemption quantities, one line, whitespace separated.
///
/// Fee-bearing results append the fee quantity. Sweeps print one line per
/// point prefixed by the new fair value.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result else {
        println!("{}", cell(result, "null"));
        return;
    };

    if let Some(Value::Array(points)) = map.get("points") {
        for point in points {
            let line = ["new_reserve_fair_value", "senior", "junior"]
                .iter()
                .filter_map(|k| point.get(*k))
                .map(|v| cell(v, "null"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{}", line);
        }
        return;
    }

    let line = ["senior", "junior", "fee_quantity"]
        .iter()
        .filter_map(|k| map.get(*k))
        .filter(|v| !v.is_null())
        .map(|v| cell(v, "null"))
        .collect::<Vec<_>>();

    if line.is_empty() {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, cell(val, "null"));
        }
    } else {
        println!("{}", line.join(" "));
    }
}
