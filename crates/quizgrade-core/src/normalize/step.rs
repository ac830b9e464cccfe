//! Canonicalization of interactive lesson step payloads.
//!
//! Only `drag_match`, `fill_blanks` and `type_answer` steps are rewritten;
//! every other step kind passes through untouched.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::blanks::{derive_blanks, BlankIdStyle};
use super::pairs::{detect_one_based, resolve_index, resolve_in_list, StringRefs};
use crate::coerce::{self, field, text_of, to_string_array, unique_strings};
use crate::model::BlankDefinition;

const DEFAULT_INSTRUCTION: &str = "Match each item with its definition";

/// A lesson step as stored: loosely typed content and answer data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    #[serde(alias = "step_type", alias = "type")]
    pub step_type: String,
    #[serde(default)]
    pub content: Value,
    #[serde(default, alias = "answer_data")]
    pub answer_data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPair {
    pub id: String,
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragMatchContent {
    pub instruction: String,
    pub pairs: Vec<MatchPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragMatchAnswer {
    /// Pair ID to correct right-hand text, in pair order.
    pub correct_pairs: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillBlanksContent {
    pub template: String,
    pub blanks: Vec<BlankDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillBlanksAnswer {
    pub correct_blanks: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAnswerContent {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAnswerAnswer {
    pub accepted_answers: Vec<String>,
}

/// A normalized lesson step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepPayload {
    DragMatch {
        content: DragMatchContent,
        answer: DragMatchAnswer,
    },
    FillBlanks {
        content: FillBlanksContent,
        answer: FillBlanksAnswer,
    },
    TypeAnswer {
        content: TypeAnswerContent,
        answer: TypeAnswerAnswer,
    },
    /// A step kind with no canonical shape, kept verbatim.
    Passthrough {
        step_type: String,
        content: Value,
        answer_data: Value,
    },
}

impl StepPayload {
    pub fn step_type(&self) -> &str {
        match self {
            StepPayload::DragMatch { .. } => "drag_match",
            StepPayload::FillBlanks { .. } => "fill_blanks",
            StepPayload::TypeAnswer { .. } => "type_answer",
            StepPayload::Passthrough { step_type, .. } => step_type,
        }
    }

    /// Content as JSON, with the step kind under `type` first.
    pub fn content_value(&self) -> Value {
        match self {
            StepPayload::DragMatch { content, .. } => tagged(self.step_type(), content),
            StepPayload::FillBlanks { content, .. } => tagged(self.step_type(), content),
            StepPayload::TypeAnswer { content, .. } => tagged(self.step_type(), content),
            StepPayload::Passthrough { content, .. } => content.clone(),
        }
    }

    pub fn answer_value(&self) -> Value {
        let value = match self {
            StepPayload::DragMatch { answer, .. } => serde_json::to_value(answer),
            StepPayload::FillBlanks { answer, .. } => serde_json::to_value(answer),
            StepPayload::TypeAnswer { answer, .. } => serde_json::to_value(answer),
            StepPayload::Passthrough { answer_data, .. } => return answer_data.clone(),
        };
        value.unwrap_or(Value::Null)
    }

    pub fn to_record(&self) -> StepRecord {
        StepRecord {
            step_type: self.step_type().to_string(),
            content: self.content_value(),
            answer_data: self.answer_value(),
        }
    }
}

fn tagged<T: Serialize>(step_type: &str, content: &T) -> Value {
    let mut map = Map::new();
    map.insert("type".to_string(), Value::String(step_type.to_string()));
    if let Ok(Value::Object(fields)) = serde_json::to_value(content) {
        map.extend(fields);
    }
    Value::Object(map)
}

/// Canonicalize one lesson step. Never fails.
pub fn normalize_step(step_type: &str, content: &Value, answer_data: &Value) -> StepPayload {
    match step_type {
        "drag_match" => drag_match(content, answer_data),
        "fill_blanks" => fill_blanks(content, answer_data),
        "type_answer" => type_answer(content, answer_data),
        other => StepPayload::Passthrough {
            step_type: other.to_string(),
            content: content.clone(),
            answer_data: answer_data.clone(),
        },
    }
}

/// Normalize a stored step record into its canonical record form.
pub fn normalize_step_record(record: &StepRecord) -> StepRecord {
    normalize_step(&record.step_type, &record.content, &record.answer_data).to_record()
}

fn pair_text(raw: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| !value.is_null())
        .and_then(coerce::scalar_text)
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// Which pair a left-hand reference points at: pair ID, then left text, then
/// numeric index. An unresolved reference is returned as its own text.
fn resolve_pair_key(
    value: &Value,
    pairs: &[MatchPair],
    one_based: bool,
    strings: StringRefs,
) -> Option<String> {
    let by_index = || resolve_index(value, pairs.len(), one_based).map(|i| pairs[i].id.clone());
    if value.is_number() {
        if let Some(id) = by_index() {
            return Some(id);
        }
    }
    let text = coerce::text(value)?;
    if pairs.iter().any(|pair| pair.id == text) {
        return Some(text);
    }
    if let Some(pair) = pairs.iter().find(|pair| pair.left == text) {
        return Some(pair.id.clone());
    }
    if value.is_string() && strings == StringRefs::MayBeIndex {
        if let Some(id) = by_index() {
            return Some(id);
        }
    }
    Some(text)
}

fn drag_match(content: &Value, answer: &Value) -> StepPayload {
    let raw_pairs = ["pairs", "items"]
        .iter()
        .find_map(|key| content.get(*key).and_then(Value::as_array));

    let mut pairs: Vec<MatchPair> = raw_pairs
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, raw)| MatchPair {
            id: text_of(raw.get("id")).unwrap_or_else(|| (index + 1).to_string()),
            left: pair_text(raw, &["left", "term", "concept", "title"]),
            right: pair_text(
                raw,
                &["right", "definition", "match", "value", "explanation"],
            ),
        })
        .filter(|pair| !pair.left.is_empty() || !pair.right.is_empty())
        .collect();

    let right_items = to_string_array(field(content, &["rightItems", "rightColumn"]));
    if pairs.is_empty() {
        let left_items = to_string_array(field(content, &["leftItems", "leftColumn"]));
        pairs = left_items
            .into_iter()
            .enumerate()
            .map(|(index, left)| MatchPair {
                id: (index + 1).to_string(),
                left,
                right: right_items.get(index).cloned().unwrap_or_default(),
            })
            .collect();
    }

    let right_pool: Vec<String> = pairs
        .iter()
        .map(|pair| pair.right.clone())
        .filter(|right| !right.is_empty())
        .chain(right_items.iter().cloned())
        .collect();

    let mut resolved: IndexMap<String, String> = IndexMap::new();
    match field(answer, &["correctPairs", "pairs", "matches"]) {
        Some(Value::Array(entries)) => {
            let left_one_based = detect_one_based(entries, 0, pairs.len());
            let right_one_based = detect_one_based(entries, 1, right_pool.len());
            for entry in entries {
                let (key, right) = match entry.as_array() {
                    Some(tuple) if tuple.len() >= 2 => (
                        resolve_pair_key(&tuple[0], &pairs, left_one_based, StringRefs::MayBeIndex),
                        resolve_in_list(&tuple[1], &right_pool, right_one_based, StringRefs::MayBeIndex),
                    ),
                    _ => (
                        text_of(field(entry, &["left", "leftId", "from"])),
                        text_of(field(entry, &["right", "rightText", "to"])),
                    ),
                };
                if let (Some(key), Some(right)) = (key, right) {
                    resolved.insert(key, right);
                }
            }
        }
        Some(Value::Object(map)) => {
            for (raw_left, raw_right) in map {
                let key = resolve_pair_key(
                    &Value::String(raw_left.clone()),
                    &pairs,
                    false,
                    StringRefs::MayBeIndex,
                );
                let right = resolve_in_list(raw_right, &right_pool, false, StringRefs::TextOnly);
                if let (Some(key), Some(right)) = (key, right) {
                    resolved.insert(key, right);
                }
            }
        }
        _ => {}
    }

    let mut reconciled: IndexMap<String, String> = IndexMap::new();
    for (key, right) in resolved {
        let id = pairs
            .iter()
            .find(|pair| pair.id == key)
            .or_else(|| pairs.iter().find(|pair| pair.left == key))
            .map(|pair| pair.id.clone());
        match id {
            Some(id) => {
                reconciled.insert(id, right);
            }
            None => {
                pairs.push(MatchPair {
                    id: key.clone(),
                    left: key.clone(),
                    right: right.clone(),
                });
                reconciled.insert(key, right);
            }
        }
    }

    let pairs: Vec<MatchPair> = pairs
        .into_iter()
        .map(|mut pair| {
            if pair.right.is_empty() {
                pair.right = reconciled.get(&pair.id).cloned().unwrap_or_default();
            }
            pair
        })
        .filter(|pair| !pair.left.is_empty() && !pair.right.is_empty())
        .collect();

    let correct_pairs = pairs
        .iter()
        .map(|pair| {
            let right = reconciled
                .get(&pair.id)
                .cloned()
                .unwrap_or_else(|| pair.right.clone());
            (pair.id.clone(), right)
        })
        .collect();

    StepPayload::DragMatch {
        content: DragMatchContent {
            instruction: content
                .get("instruction")
                .and_then(coerce::scalar_text)
                .unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string()),
            pairs,
        },
        answer: DragMatchAnswer { correct_pairs },
    }
}

fn fill_blanks(content: &Value, answer: &Value) -> StepPayload {
    let raw_template = field(content, &["template", "text"])
        .and_then(coerce::scalar_text)
        .unwrap_or_default();
    let derived = derive_blanks(
        &raw_template,
        content.get("blanks"),
        field(answer, &["correctBlanks", "blanks"]),
        BlankIdStyle::Step,
    );
    let correct_blanks = derived.answer_map();

    StepPayload::FillBlanks {
        content: FillBlanksContent {
            template: derived.template,
            blanks: derived.blanks,
        },
        answer: FillBlanksAnswer { correct_blanks },
    }
}

fn type_answer(content: &Value, answer: &Value) -> StepPayload {
    let accepted_answers = unique_strings(to_string_array(field(
        answer,
        &["acceptedAnswers", "answers", "correctAnswers"],
    )));

    StepPayload::TypeAnswer {
        content: TypeAnswerContent {
            question: content
                .get("question")
                .and_then(coerce::scalar_text)
                .unwrap_or_default(),
            placeholder: coerce::string_field(content, "placeholder"),
            case_sensitive: content
                .get("caseSensitive")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        },
        answer: TypeAnswerAnswer { accepted_answers },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs_of(payload: &StepPayload) -> (&[MatchPair], &IndexMap<String, String>) {
        match payload {
            StepPayload::DragMatch { content, answer } => (&content.pairs, &answer.correct_pairs),
            other => panic!("expected drag_match, got {}", other.step_type()),
        }
    }

    #[test]
    fn one_based_tuples_resolve_to_pair_ids() {
        let payload = normalize_step(
            "drag_match",
            &json!({"pairs": [
                {"left": "H2O", "right": "Water"},
                {"left": "NaCl", "right": "Salt"}
            ]}),
            &json!({"correctPairs": [[1, 1], [2, 2]]}),
        );
        let (pairs, correct) = pairs_of(&payload);
        assert_eq!(pairs[0].id, "1");
        assert_eq!(correct.get("1").map(String::as_str), Some("Water"));
        assert_eq!(correct.get("2").map(String::as_str), Some("Salt"));
    }

    #[test]
    fn aliases_and_parallel_lists() {
        let payload = normalize_step(
            "drag_match",
            &json!({"leftItems": ["cat", "dog"], "rightItems": ["meow", "woof"]}),
            &Value::Null,
        );
        let (pairs, correct) = pairs_of(&payload);
        assert_eq!(
            pairs[1],
            MatchPair {
                id: "2".into(),
                left: "dog".into(),
                right: "woof".into()
            }
        );
        assert_eq!(correct.keys().collect::<Vec<_>>(), vec!["1", "2"]);

        let payload = normalize_step(
            "drag_match",
            &json!({"items": [{"id": "x", "term": "Rust", "definition": "A language"}]}),
            &json!({}),
        );
        let (pairs, _) = pairs_of(&payload);
        assert_eq!(pairs[0].left, "Rust");
        assert_eq!(pairs[0].right, "A language");
    }

    #[test]
    fn unresolved_left_creates_synthetic_pair() {
        let payload = normalize_step(
            "drag_match",
            &json!({"pairs": [{"id": "a", "left": "One", "right": "1"}]}),
            &json!({"correctPairs": {"One": "1", "Two": "2"}}),
        );
        let (pairs, correct) = pairs_of(&payload);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].id, "Two");
        assert_eq!(pairs[1].left, "Two");
        assert_eq!(correct.get("a").map(String::as_str), Some("1"));
        assert_eq!(correct.get("Two").map(String::as_str), Some("2"));
    }

    #[test]
    fn pairs_without_both_sides_are_dropped() {
        let payload = normalize_step(
            "drag_match",
            &json!({"pairs": [{"left": "orphan"}, {"left": "A", "right": "a"}]}),
            &json!({}),
        );
        let (pairs, correct) = pairs_of(&payload);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].id, "2");
        assert_eq!(correct.len(), 1);
        assert!(pairs.iter().all(|p| !p.left.is_empty() && !p.right.is_empty()));
    }

    #[test]
    fn fill_blanks_synthetic_step_blank() {
        let payload = normalize_step("fill_blanks", &json!({}), &json!({}));
        let StepPayload::FillBlanks { content, answer } = payload else {
            panic!("expected fill_blanks");
        };
        assert_eq!(content.template, "{{b1}}");
        assert_eq!(answer.correct_blanks.keys().collect::<Vec<_>>(), vec!["b1"]);
    }

    #[test]
    fn type_answer_is_strict_about_flags() {
        let payload = normalize_step(
            "type_answer",
            &json!({"question": "Capital of France?", "caseSensitive": "yes", "placeholder": 3}),
            &json!({"answers": ["Paris", " paris ", "Paris"]}),
        );
        let StepPayload::TypeAnswer { content, answer } = payload else {
            panic!("expected type_answer");
        };
        assert!(!content.case_sensitive);
        assert_eq!(content.placeholder, None);
        assert_eq!(answer.accepted_answers, vec!["Paris", "paris"]);
    }

    #[test]
    fn unknown_kinds_pass_through() {
        let content = json!({"markdown": "# Hi"});
        let payload = normalize_step("read", &content, &Value::Null);
        assert_eq!(payload.content_value(), content);
        assert_eq!(payload.answer_value(), Value::Null);
        assert_eq!(payload.step_type(), "read");
    }

    #[test]
    fn content_is_tagged_with_type_first() {
        let payload = normalize_step("type_answer", &json!({"question": "Q"}), &json!({}));
        let content = payload.content_value();
        let first_key = content.as_object().and_then(|m| m.keys().next().cloned());
        assert_eq!(first_key.as_deref(), Some("type"));
    }

    #[test]
    fn steps_are_idempotent() {
        let cases = [
            (
                "drag_match",
                json!({"pairs": [{"term": "A", "match": "x"}, {"concept": "B", "value": "y"}], "rightItems": ["z"]}),
                json!({"pairs": [[0, 2], ["B", "y"], {"from": "C", "to": "w"}]}),
            ),
            (
                "fill_blanks",
                json!({"text": "{{blank}} is {{ blank }}", "blanks": [{"id": "x", "answer": "sky"}]}),
                json!({"blanks": {"blank_1": "blue"}}),
            ),
            ("type_answer", json!({"question": 42}), json!({"correctAnswers": "42"})),
        ];
        for (kind, content, answer) in cases {
            let first = normalize_step(kind, &content, &answer);
            let record = first.to_record();
            let second = normalize_step(&record.step_type, &record.content, &record.answer_data);
            assert_eq!(first, second, "{kind} not idempotent");
        }
    }
}
