//! Coercion of loosely-typed JSON values into finite numbers and string lists.
//!
//! Both the caller's request body and the model's reply can carry numbers as
//! strings, `null`, or spellings of NaN/infinity. Everything that is persisted
//! goes through [`finite_f64`] first.

use serde_json::Value;

/// Coerce a JSON value into a finite `f64`, or return `default`.
///
/// Numbers and numeric strings are accepted. Booleans count as 1/0.
/// `null`, objects, arrays, unparsable strings and non-finite results
/// (`"NaN"`, `"inf"`, `"-Infinity"`) all yield `default`.
pub fn finite_f64(value: Option<&Value>, default: f64) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() => f,
        _ => default,
    }
}

/// Look up `key` on a JSON object and coerce it with [`finite_f64`].
pub fn field_f64(object: &Value, key: &str, default: f64) -> f64 {
    finite_f64(object.get(key), default)
}

/// Look up a nested path (`["baseline_model", "validated_emissions"]`).
pub fn path_f64(object: &Value, path: &[&str], default: f64) -> f64 {
    let mut current = object;
    for key in path {
        match current.get(key) {
            Some(next) => current = next,
            None => return default,
        }
    }
    finite_f64(Some(current), default)
}

/// Python-style truthiness, used where the HTTP contract treats "falsy" as
/// "missing".
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Render a scalar JSON value as plain text (strings without quotes).
pub fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce an `energy_sources`-style field into a list of labels.
///
/// Lists keep their items (non-strings rendered as text). Any other truthy
/// value becomes a single-element list; falsy values become an empty list.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(display_text).collect(),
        other if is_truthy(other) => other.map(display_text).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Truncate to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_finite_and_non_numeric_inputs_fall_back_to_default() {
        for v in [
            json!(null),
            json!("NaN"),
            json!("nan"),
            json!("inf"),
            json!("-Infinity"),
            json!("abc"),
            json!(""),
            json!([1, 2]),
            json!({"a": 1}),
        ] {
            let out = finite_f64(Some(&v), 7.5);
            assert_eq!(out, 7.5, "input {v}");
            assert!(out.is_finite());
        }
        assert_eq!(finite_f64(None, 0.0), 0.0);
    }

    #[test]
    fn numbers_and_numeric_strings_are_accepted() {
        assert_eq!(finite_f64(Some(&json!(12)), 0.0), 12.0);
        assert_eq!(finite_f64(Some(&json!(-3.25)), 0.0), -3.25);
        assert_eq!(finite_f64(Some(&json!(" 42.5 ")), 0.0), 42.5);
        assert_eq!(finite_f64(Some(&json!(true)), 0.0), 1.0);
    }

    #[test]
    fn huge_exponent_string_is_rejected() {
        // parses to +inf
        assert_eq!(finite_f64(Some(&json!("1e999")), 3.0), 3.0);
    }

    #[test]
    fn path_lookup_handles_missing_levels() {
        let doc = json!({"baseline_model": {"validated_emissions": "1200"}});
        assert_eq!(path_f64(&doc, &["baseline_model", "validated_emissions"], 0.0), 1200.0);
        assert_eq!(path_f64(&doc, &["baseline_model", "missing"], 4.0), 4.0);
        assert_eq!(path_f64(&json!({}), &["baseline_model", "validated_emissions"], 0.0), 0.0);
    }

    #[test]
    fn energy_sources_are_coerced_to_list() {
        assert_eq!(string_list(Some(&json!(["solar", "grid"]))), vec!["solar", "grid"]);
        assert_eq!(string_list(Some(&json!("coal"))), vec!["coal"]);
        assert_eq!(string_list(Some(&json!(5))), vec!["5"]);
        assert!(string_list(Some(&json!(""))).is_empty());
        assert!(string_list(Some(&json!(null))).is_empty());
        assert!(string_list(None).is_empty());
    }

    #[test]
    fn truthiness_matches_http_contract() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(is_truthy(Some(&json!(0.5))));
        assert!(is_truthy(Some(&json!("x"))));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
