//! Lenient conversions from loosely typed JSON values.
//!
//! Authored payloads mix strings, numbers and booleans freely. These helpers
//! never fail; they return `None` or an empty collection instead.

use serde_json::{Map, Value};

/// First of `keys` present on `obj` with a non-null value.
pub fn field<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let map = obj.as_object()?;
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null())
}

/// The object behind `value`, or an empty map.
pub fn object(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

/// The string under `key`, only if it really is a string.
pub fn string_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// A finite number, or a string that parses as one.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// [`to_number`] over an optional value.
pub fn number_of(value: Option<&Value>) -> Option<f64> {
    value.and_then(to_number)
}

/// A JSON number with no fractional part.
pub fn integer(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    n.as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15)
        .map(|f| f as i64)
}

/// Booleans, `"true"`/`"false"` strings and `1`/`0`.
pub fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(true),
            Some(f) if f == 0.0 => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// [`to_bool`] over an optional value.
pub fn bool_of(value: Option<&Value>) -> Option<bool> {
    value.and_then(to_bool)
}

/// Untrimmed text of a scalar value.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) => to_number(value).map(format_number),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Trimmed, non-empty text of a scalar value.
pub fn text(value: &Value) -> Option<String> {
    scalar_text(value)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// [`text`] over an optional value.
pub fn text_of(value: Option<&Value>) -> Option<String> {
    value.and_then(text)
}

/// Trimmed, non-empty strings from an array or a single scalar.
pub fn to_string_array(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(text).collect(),
        Some(other) => text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Drop repeats, keeping the first occurrence of each string.
pub fn unique_strings(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

/// Render a number without a trailing `.0` for whole values.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_skips_null_aliases() {
        let obj = json!({"options": null, "choices": ["a"]});
        assert_eq!(field(&obj, &["options", "choices"]), Some(&json!(["a"])));
        assert_eq!(field(&obj, &["missing"]), None);
        assert_eq!(field(&json!(3), &["options"]), None);
    }

    #[test]
    fn numbers_from_strings() {
        assert_eq!(to_number(&json!(" 2.5 ")), Some(2.5));
        assert_eq!(to_number(&json!("")), None);
        assert_eq!(to_number(&json!("abc")), None);
        assert_eq!(to_number(&json!(true)), None);
        assert_eq!(integer(&json!(3.0)), Some(3));
        assert_eq!(integer(&json!(3.5)), None);
        assert_eq!(integer(&json!("3")), None);
    }

    #[test]
    fn booleans() {
        assert_eq!(to_bool(&json!("TRUE")), Some(true));
        assert_eq!(to_bool(&json!(0)), Some(false));
        assert_eq!(to_bool(&json!(2)), None);
        assert_eq!(to_bool(&json!("yes")), None);
    }

    #[test]
    fn string_arrays_trim_and_drop_empties() {
        let value = json!([" a ", "", 3, null, "b"]);
        assert_eq!(to_string_array(Some(&value)), vec!["a", "3", "b"]);
        assert_eq!(to_string_array(Some(&json!("solo"))), vec!["solo"]);
        assert!(to_string_array(Some(&json!({"a": 1}))).is_empty());
    }

    #[test]
    fn unique_keeps_first_seen_order() {
        let values = vec!["b".into(), "a".into(), "b".into(), "c".into(), "a".into()];
        assert_eq!(unique_strings(values), vec!["b", "a", "c"]);
    }

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(format_number(1969.0), "1969");
        assert_eq!(format_number(2.25), "2.25");
    }
}
