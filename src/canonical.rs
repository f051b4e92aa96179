//! Canonical text form for JSON values.
//!
//! The canonical form is what content hashes are computed over: object keys
//! are sorted, no whitespace is emitted, and every `contentHash` key is
//! dropped wherever it appears so a stamped document hashes the same as its
//! unstamped self. Array order is significant and never changed.
use serde_json::{Map, Number, Value};

/// Object key excluded from canonical output at every nesting level.
pub const CONTENT_HASH_KEY: &str = "contentHash";

/// Render a JSON value in canonical form.
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        Value::Number(number) => write_number(out, number),
        Value::String(text) => write_string(out, text),
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(out, map),
    }
}

fn write_object(out: &mut String, map: &Map<String, Value>) {
    let mut keys: Vec<&String> = map
        .keys()
        .filter(|key| key.as_str() != CONTENT_HASH_KEY)
        .collect();
    keys.sort();
    out.push('{');
    for (idx, key) in keys.into_iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_value(out, &map[key.as_str()]);
    }
    out.push('}');
}

fn write_string(out: &mut String, text: &str) {
    // Serializing a str cannot fail; fall back to an empty quoted string
    // rather than panic if that ever changes.
    match serde_json::to_string(text) {
        Ok(quoted) => out.push_str(&quoted),
        Err(_) => out.push_str("\"\""),
    }
}

// JSON numbers carry no integer/float distinction, so floats are written the
// way ECMAScript `Number::toString` writes them: integral values up to 1e21 in
// plain digits, exponent form only outside [1e-6, 1e21).
fn write_number(out: &mut String, number: &Number) {
    if number.is_i64() || number.is_u64() {
        out.push_str(&number.to_string());
        return;
    }
    match number.as_f64() {
        Some(float) if float == 0.0 => out.push('0'),
        Some(float) if float.is_finite() => write_float(out, float),
        _ => out.push_str(&number.to_string()),
    }
}

fn write_float(out: &mut String, float: f64) {
    if float < 0.0 {
        out.push('-');
    }
    // `{:e}` yields the shortest round-trip digits as `d[.ddd]e<exp>`.
    let scientific = format!("{:e}", float.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|ch| *ch != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let len = digits.len() as i32;
    // Position of the decimal point relative to the first digit.
    let point = exponent + 1;

    if len <= point && point <= 21 {
        out.push_str(&digits);
        out.push_str(&"0".repeat((point - len) as usize));
    } else if 0 < point && point <= 21 {
        let (whole, frac) = digits.split_at(point as usize);
        out.push_str(whole);
        out.push('.');
        out.push_str(frac);
    } else if -6 < point && point <= 0 {
        out.push_str("0.");
        out.push_str(&"0".repeat((-point) as usize));
        out.push_str(&digits);
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        let shown = point - 1;
        out.push('e');
        out.push(if shown < 0 { '-' } else { '+' });
        out.push_str(&shown.abs().to_string());
    }
}
