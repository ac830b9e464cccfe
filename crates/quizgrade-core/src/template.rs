//! Fill-in-the-blank template parsing.
//!
//! Templates mark blanks with `{{id}}`. Authors may also write the generic
//! `{{blank}}`, which takes the next declared blank ID in order, or
//! `blank_<n>` once the declared IDs run out.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("invalid placeholder regex pattern"));

static GENERIC_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\{\{\s*blank\s*\}\}").expect("invalid generic placeholder regex pattern")
});

/// One segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TemplatePart {
    /// Literal text, rendered as-is.
    Text { content: String },
    /// A blank slot.
    Blank {
        #[serde(rename = "blankId")]
        blank_id: String,
    },
}

fn generic_id(index: usize) -> String {
    format!("blank_{index}")
}

/// Split `template` into literal text and blank references.
///
/// `known_blanks` are the declared blank IDs, used to resolve generic
/// placeholders positionally. A marker with an empty token stays literal.
pub fn parse_template(template: &str, known_blanks: &[String]) -> Vec<TemplatePart> {
    let mut parts = Vec::new();
    let mut cursor = 0;
    let mut generic_index = 0;

    for captures in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        if whole.start() > cursor {
            parts.push(TemplatePart::Text {
                content: template[cursor..whole.start()].to_string(),
            });
        }

        let token = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        if token.eq_ignore_ascii_case("blank") {
            let blank_id = known_blanks
                .get(generic_index)
                .filter(|id| !id.is_empty())
                .cloned()
                .unwrap_or_else(|| generic_id(generic_index));
            parts.push(TemplatePart::Blank { blank_id });
            generic_index += 1;
        } else if token.is_empty() {
            parts.push(TemplatePart::Text {
                content: whole.as_str().to_string(),
            });
        } else {
            parts.push(TemplatePart::Blank {
                blank_id: token.to_string(),
            });
        }

        cursor = whole.end();
    }

    if cursor < template.len() {
        parts.push(TemplatePart::Text {
            content: template[cursor..].to_string(),
        });
    }

    if parts.is_empty() {
        parts.push(TemplatePart::Text {
            content: template.to_string(),
        });
    }
    parts
}

/// Blank IDs referenced by `template`, deduplicated in first-occurrence order.
///
/// Falls back to `known_blanks` when the template has no markers at all.
pub fn extract_blank_ids(template: &str, known_blanks: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let ids: Vec<String> = parse_template(template, known_blanks)
        .into_iter()
        .filter_map(|part| match part {
            TemplatePart::Blank { blank_id } => Some(blank_id),
            TemplatePart::Text { .. } => None,
        })
        .filter(|id| seen.insert(id.clone()))
        .collect();

    if ids.is_empty() {
        let mut seen = HashSet::new();
        return known_blanks
            .iter()
            .filter(|id| !id.is_empty() && seen.insert(id.as_str()))
            .cloned()
            .collect();
    }
    ids
}

/// Rewrite every generic `{{blank}}` into `{{id}}`, taking `ids` in order.
pub fn replace_generic_blank_placeholders(template: &str, ids: &[String]) -> String {
    let mut index = 0;
    GENERIC_PLACEHOLDER
        .replace_all(template, |_: &regex::Captures<'_>| {
            let id = ids
                .get(index)
                .filter(|id| !id.is_empty())
                .cloned()
                .unwrap_or_else(|| generic_id(index));
            index += 1;
            format!("{{{{{id}}}}}")
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn blank(id: &str) -> TemplatePart {
        TemplatePart::Blank {
            blank_id: id.into(),
        }
    }

    fn text(content: &str) -> TemplatePart {
        TemplatePart::Text {
            content: content.into(),
        }
    }

    #[test]
    fn parses_explicit_markers() {
        let parts = parse_template("The {{b1}} is red.", &[]);
        assert_eq!(parts, vec![text("The "), blank("b1"), text(" is red.")]);
    }

    #[test]
    fn generic_markers_take_declared_ids_in_order() {
        let parts = parse_template("{{blank}} and {{ BLANK }} and {{blank}}", &ids(&["x", "y"]));
        assert_eq!(
            parts,
            vec![
                blank("x"),
                text(" and "),
                blank("y"),
                text(" and "),
                blank("blank_2"),
            ]
        );
    }

    #[test]
    fn empty_token_stays_literal() {
        let parts = parse_template("a {{ }} b", &[]);
        assert_eq!(parts, vec![text("a "), text("{{ }}"), text(" b")]);
    }

    #[test]
    fn plain_text_is_one_part() {
        assert_eq!(parse_template("", &[]), vec![text("")]);
        assert_eq!(parse_template("no blanks", &[]), vec![text("no blanks")]);
    }

    #[test]
    fn extract_dedupes_in_first_occurrence_order() {
        let found = extract_blank_ids("{{b2}} {{b1}} {{b2}} {{b3}}", &ids(&["b1", "b2", "b3"]));
        assert_eq!(found, ids(&["b2", "b1", "b3"]));
    }

    #[test]
    fn extract_falls_back_to_declared_blanks() {
        let found = extract_blank_ids("no markers here", &ids(&["a", "b", "a"]));
        assert_eq!(found, ids(&["a", "b"]));
    }

    #[test]
    fn replace_generic_uses_ids_then_synthetic() {
        let out = replace_generic_blank_placeholders("{{blank}}-{{Blank}}-{{b9}}", &ids(&["first"]));
        assert_eq!(out, "{{first}}-{{blank_1}}-{{b9}}");
    }

    #[test]
    fn replace_and_parse_agree() {
        let declared = ids(&["p", "q"]);
        let template = "{{q}} then {{blank}} then {{blank}}";
        let rewritten = replace_generic_blank_placeholders(template, &declared);
        assert_eq!(rewritten, "{{q}} then {{p}} then {{q}}");
        assert_eq!(
            extract_blank_ids(template, &declared),
            extract_blank_ids(&rewritten, &declared)
        );
    }
}
