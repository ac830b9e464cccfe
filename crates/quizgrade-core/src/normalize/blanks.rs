//! Blank ID derivation shared by fill-blank questions and lesson steps.

use indexmap::IndexMap;
use serde_json::Value;

use crate::coerce;
use crate::model::BlankDefinition;
use crate::template::{extract_blank_ids, replace_generic_blank_placeholders};

/// ID conventions for blanks declared without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlankIdStyle {
    /// `blank_0`, `blank_1`, ...
    Question,
    /// `b1`, `b2`, ...
    Step,
}

impl BlankIdStyle {
    fn default_id(self, index: usize) -> String {
        match self {
            BlankIdStyle::Question => format!("blank_{index}"),
            BlankIdStyle::Step => format!("b{}", index + 1),
        }
    }

    fn synthetic_id(self) -> String {
        self.default_id(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DerivedBlanks {
    pub template: String,
    pub blanks: Vec<BlankDefinition>,
}

impl DerivedBlanks {
    pub fn answer_map(&self) -> IndexMap<String, Vec<String>> {
        self.blanks
            .iter()
            .map(|blank| (blank.id.clone(), blank.accepted_answers.clone()))
            .collect()
    }
}

/// Reconcile a template, declared blank definitions and a separate
/// blank-to-answers map into one ordered blank list.
///
/// IDs come from the template markers, then the declared definitions, then
/// the answer map keys, then a single synthetic blank. An empty template is
/// synthesized from the IDs.
pub(crate) fn derive_blanks(
    raw_template: &str,
    raw_blanks: Option<&Value>,
    answer_map: Option<&Value>,
    style: BlankIdStyle,
) -> DerivedBlanks {
    let template = raw_template.trim();

    let mut accepted: IndexMap<String, Vec<String>> = IndexMap::new();
    let declared: Vec<BlankDefinition> = raw_blanks
        .and_then(Value::as_array)
        .map(|items| items.as_slice())
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let id = coerce::text_of(raw.get("id")).unwrap_or_else(|| style.default_id(index));
            let accepted_answers = coerce::unique_strings(coerce::to_string_array(coerce::field(
                raw,
                &["acceptedAnswers", "answers", "answer"],
            )));
            accepted.insert(id.clone(), accepted_answers.clone());
            BlankDefinition {
                id,
                accepted_answers,
            }
        })
        .collect();

    for (id, answers) in coerce::object(answer_map) {
        let id = id.trim().to_string();
        if id.is_empty() {
            continue;
        }
        accepted.insert(id, coerce::unique_strings(coerce::to_string_array(Some(&answers))));
    }

    let known: Vec<String> = declared.iter().map(|blank| blank.id.clone()).collect();
    let mut ids = extract_blank_ids(template, &known);
    if ids.is_empty() {
        ids = accepted.keys().cloned().collect();
    }
    if ids.is_empty() {
        ids = vec![style.synthetic_id()];
    }

    let template = if template.is_empty() {
        ids.iter()
            .map(|id| format!("{{{{{id}}}}}"))
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        replace_generic_blank_placeholders(template, &known)
    };

    let blanks = ids
        .iter()
        .enumerate()
        .map(|(index, id)| BlankDefinition {
            id: id.clone(),
            accepted_answers: accepted
                .get(id)
                .or_else(|| declared.get(index).map(|blank| &blank.accepted_answers))
                .cloned()
                .unwrap_or_default(),
        })
        .collect();

    DerivedBlanks { template, blanks }
}
