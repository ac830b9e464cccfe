//! Index-base inference and reference resolution for matching pairs.
//!
//! Correct-pair mappings may point at items by ID, by text, or by numeric
//! index, and stored indices carry no tag saying whether they are 0- or
//! 1-based. For a list of `[left, right]` tuples, a column is read as 1-based
//! when every numeric reference in it lies in `[1, N]` and none is `0`. Each
//! column is inferred on its own because the two columns differ in size.

use serde_json::Value;

use crate::coerce;

/// Round half up, matching how the stored indices were produced.
fn round_index(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Whether column `position` of the tuple entries in `raw_pairs` is 1-based.
pub(crate) fn detect_one_based(raw_pairs: &[Value], position: usize, len: usize) -> bool {
    if len == 0 {
        return false;
    }
    let indices: Vec<i64> = raw_pairs
        .iter()
        .filter_map(|entry| entry.as_array()?.get(position))
        .filter_map(coerce::to_number)
        .map(round_index)
        .collect();

    if indices.is_empty() {
        return false;
    }
    let upper = len as i64;
    !indices.contains(&0) && indices.iter().all(|&i| (1..=upper).contains(&i))
}

/// Map a numeric reference onto `0..len`.
///
/// The inferred base wins when the value is in range for it; otherwise the
/// other base is tried before giving up.
pub(crate) fn resolve_index(value: &Value, len: usize, one_based: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let rounded = round_index(coerce::to_number(value)?);
    let upper = len as i64;
    let shifted = (1..=upper).contains(&rounded).then(|| (rounded - 1) as usize);
    let direct = (0..upper).contains(&rounded).then_some(rounded as usize);
    if one_based {
        shifted.or(direct)
    } else {
        direct.or(shifted)
    }
}

/// How far a string reference may be read as a numeric index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StringRefs {
    /// Numeric strings may be indices once exact text lookup fails.
    MayBeIndex,
    /// Strings are always text.
    TextOnly,
}

/// Resolve a reference against a list of texts.
///
/// Numbers are indices first. Strings match exact text first, then (when
/// allowed) act as indices, and finally stand for themselves.
pub(crate) fn resolve_in_list(
    value: &Value,
    list: &[String],
    one_based: bool,
    strings: StringRefs,
) -> Option<String> {
    let by_index = || resolve_index(value, list.len(), one_based).map(|i| list[i].clone());
    match value {
        Value::Number(_) => by_index().or_else(|| coerce::text(value)),
        Value::String(_) => {
            let text = coerce::text(value)?;
            if list.contains(&text) {
                return Some(text);
            }
            if strings == StringRefs::MayBeIndex {
                if let Some(found) = by_index() {
                    return Some(found);
                }
            }
            Some(text)
        }
        other => coerce::text(other),
    }
}
