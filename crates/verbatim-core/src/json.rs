//! Extraction of JSON objects from raw model output.
//!
//! Models are prompted to return compact JSON, but small local models wrap
//! it in prose, code fences, or trailing commentary. The rule everywhere is
//! the same: take the first well-formed JSON object found in the text, and
//! let the call site fall back to its safe default when there is none.

use serde_json::Value;

/// Return the first well-formed JSON object embedded in `raw`, if any.
///
/// Scans for brace-balanced spans (string-aware, so braces inside quoted
/// values don't confuse the walk) and tries to parse each span in order.
pub fn first_json_object(raw: &str) -> Option<Value> {
    let bytes = raw.as_bytes();
    let mut start = 0;
    while let Some(open) = raw[start..].find('{').map(|i| start + i) {
        if let Some(end) = matching_brace(bytes, open) {
            if let Ok(value) = serde_json::from_str::<Value>(&raw[open..=end]) {
                if value.is_object() {
                    return Some(value);
                }
            }
        }
        start = open + 1;
    }
    None
}

/// Index of the brace closing the object opened at `open`, if balanced.
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// String field accessor with empty-string default, trimmed.
pub fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}
