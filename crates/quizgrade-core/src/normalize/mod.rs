//! Payload normalization.
//!
//! Authored and AI-generated payloads use many aliases and shapes for the
//! same data. Everything here rewrites them into one canonical typed shape,
//! is pure, and never fails on malformed input. Normalizing an already
//! canonical payload returns it unchanged.

mod blanks;
mod pairs;
mod question;
mod step;

use serde_json::Value;

use crate::error::GradingError;
use crate::model::{Question, QuestionBody, QuestionRecord, QuestionTypeSlug};

pub use question::normalize_question;
pub use step::{
    normalize_step, normalize_step_record, DragMatchAnswer, DragMatchContent, FillBlanksAnswer,
    FillBlanksContent, MatchPair, StepPayload, StepRecord, TypeAnswerAnswer, TypeAnswerContent,
};

use question::{normalize_with_legacy, LegacyFields};

/// What a payload is: a quiz question type slug or a lesson step kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind<'a> {
    Question(&'a str),
    Step(&'a str),
}

/// The canonical form of a question or lesson step payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedPayload {
    Question(QuestionBody),
    Step(StepPayload),
}

impl NormalizedPayload {
    /// The canonical type slug or step kind.
    pub fn kind(&self) -> String {
        match self {
            NormalizedPayload::Question(body) => body.slug().to_string(),
            NormalizedPayload::Step(step) => step.step_type().to_string(),
        }
    }

    pub fn content_value(&self) -> Value {
        match self {
            NormalizedPayload::Question(body) => body.config_value(),
            NormalizedPayload::Step(step) => step.content_value(),
        }
    }

    pub fn answer_value(&self) -> Value {
        match self {
            NormalizedPayload::Question(body) => body.answer_value(),
            NormalizedPayload::Step(step) => step.answer_value(),
        }
    }
}

/// Normalize any payload.
///
/// Fails only when a question slug is not a known type; lesson step kinds
/// without a canonical shape pass through unchanged.
pub fn normalize(
    kind: PayloadKind<'_>,
    content: &Value,
    answer_data: &Value,
) -> Result<NormalizedPayload, GradingError> {
    match kind {
        PayloadKind::Question(slug) => {
            let slug: QuestionTypeSlug = slug.parse()?;
            Ok(NormalizedPayload::Question(normalize_question(
                slug,
                content,
                answer_data,
            )))
        }
        PayloadKind::Step(step_type) => Ok(NormalizedPayload::Step(normalize_step(
            step_type,
            content,
            answer_data,
        ))),
    }
}

/// Resolve a stored record into a typed, gradable question.
///
/// Legacy records (no answer data, but `options` and `correctAnswer`) are
/// always multiple choice. Negative or non-finite points become 0.
pub fn normalize_record(record: &QuestionRecord) -> Result<Question, GradingError> {
    let legacy = record.is_legacy();
    let slug = if legacy {
        QuestionTypeSlug::MultipleChoice
    } else {
        record
            .question_type
            .parse::<QuestionTypeSlug>()
            .map_err(|e| e.for_question(record.id.clone()))?
    };

    let answer = record.correct_answer_data.as_ref().unwrap_or(&Value::Null);
    let legacy_fields = LegacyFields {
        options: record.options.as_ref(),
        correct_answer: record.correct_answer.as_ref(),
    };
    let body = normalize_with_legacy(slug, &record.question_config, answer, legacy_fields);

    let points = if record.points.is_finite() {
        record.points.max(0.0)
    } else {
        0.0
    };

    Ok(Question {
        id: record.id.clone(),
        prompt: record.question.clone(),
        points,
        body,
        legacy,
    })
}

/// Resolve every record, failing on the first unknown question type.
pub fn resolve_records(records: &[QuestionRecord]) -> Result<Vec<Question>, GradingError> {
    records.iter().map(normalize_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MultipleChoiceAnswer, MultipleChoiceConfig};
    use serde_json::json;

    fn record(value: Value) -> QuestionRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn legacy_record_resolves_to_multiple_choice() {
        let question = normalize_record(&record(json!({
            "id": "q1",
            "questionType": "true_false",
            "options": ["A", "B", "C"],
            "correctAnswer": 2,
            "points": 2
        })))
        .unwrap();
        assert!(question.legacy);
        assert_eq!(question.points, 2.0);
        assert_eq!(
            question.body,
            QuestionBody::MultipleChoice {
                config: MultipleChoiceConfig {
                    options: vec!["A".into(), "B".into(), "C".into()],
                    shuffle_options: false,
                },
                answer: MultipleChoiceAnswer { correct_index: 2 },
            }
        );
    }

    #[test]
    fn unknown_type_names_the_question() {
        let err = normalize_record(&record(json!({
            "id": "q9",
            "type": "essay",
            "answer": {}
        })))
        .unwrap_err();
        assert_eq!(err.question_id(), Some("q9"));
        assert_eq!(err.unknown_type(), Some("essay"));
    }

    #[test]
    fn resolve_fails_before_grading_anything() {
        let records = vec![
            record(json!({"id": "ok", "type": "mcq", "config": {"options": ["a"]}})),
            record(json!({"id": "bad", "type": "drawing"})),
        ];
        assert!(resolve_records(&records).is_err());
    }

    #[test]
    fn points_are_never_negative() {
        let question = normalize_record(&record(json!({
            "id": "q", "type": "true_false", "points": -3
        })))
        .unwrap();
        assert_eq!(question.points, 0.0);

        let question = normalize_record(&record(json!({
            "id": "q", "type": "true_false", "points": 0
        })))
        .unwrap();
        assert_eq!(question.points, 0.0);
    }

    #[test]
    fn uniform_entry_point_dispatches_by_kind() {
        let question = normalize(
            PayloadKind::Question("boolean"),
            &json!({}),
            &json!({"correctValue": false}),
        )
        .unwrap();
        assert_eq!(question.kind(), "true_false");
        assert_eq!(question.answer_value(), json!({"correctValue": false}));

        let step = normalize(PayloadKind::Step("video"), &json!({"url": "x"}), &Value::Null).unwrap();
        assert_eq!(step.kind(), "video");
        assert_eq!(step.content_value(), json!({"url": "x"}));

        assert_eq!(
            normalize(PayloadKind::Question("essay"), &Value::Null, &Value::Null),
            Err(GradingError::UnknownQuestionType("essay".into()))
        );
    }

    #[test]
    fn canonical_record_round_trips_through_resolution() {
        let question = normalize_record(&record(json!({
            "id": "fb",
            "question": "Fill it",
            "type": "fill_in_blank",
            "config": {"template": "{{blank}} + {{blank}}"},
            "answer": {"blanks": {"blank_0": "1", "blank_1": ["2"]}}
        })))
        .unwrap();
        let again = normalize_record(&question.to_record()).unwrap();
        assert_eq!(question, again);
    }
}
