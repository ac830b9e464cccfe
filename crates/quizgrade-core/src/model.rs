//! Core data model types for quizgrade.
//!
//! Questions arrive as loose [`QuestionRecord`]s (JSON-like config and answer
//! data, possibly in a legacy shape) and are resolved into typed [`Question`]s
//! whose [`QuestionBody`] has exactly one variant per [`QuestionTypeSlug`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce;
use crate::error::GradingError;
use crate::results::GradingOptions;

/// The closed set of gradable question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionTypeSlug {
    MultipleChoice,
    TrueFalse,
    TextInput,
    YearRange,
    NumericRange,
    Matching,
    FillBlank,
    MultiSelect,
}

impl QuestionTypeSlug {
    /// Every supported slug, in canonical order.
    pub const ALL: [QuestionTypeSlug; 8] = [
        QuestionTypeSlug::MultipleChoice,
        QuestionTypeSlug::TrueFalse,
        QuestionTypeSlug::TextInput,
        QuestionTypeSlug::YearRange,
        QuestionTypeSlug::NumericRange,
        QuestionTypeSlug::Matching,
        QuestionTypeSlug::FillBlank,
        QuestionTypeSlug::MultiSelect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionTypeSlug::MultipleChoice => "multiple_choice",
            QuestionTypeSlug::TrueFalse => "true_false",
            QuestionTypeSlug::TextInput => "text_input",
            QuestionTypeSlug::YearRange => "year_range",
            QuestionTypeSlug::NumericRange => "numeric_range",
            QuestionTypeSlug::Matching => "matching",
            QuestionTypeSlug::FillBlank => "fill_blank",
            QuestionTypeSlug::MultiSelect => "multi_select",
        }
    }
}

impl fmt::Display for QuestionTypeSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionTypeSlug {
    type Err = GradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "multiple_choice" | "multiple choice" | "multiple-choice" | "multi_choice" | "mcq" => {
                Ok(QuestionTypeSlug::MultipleChoice)
            }
            "true_false" | "truefalse" | "true-false" | "boolean" => Ok(QuestionTypeSlug::TrueFalse),
            "text_input" | "text" | "free_text" | "short_answer" | "shortanswer" => {
                Ok(QuestionTypeSlug::TextInput)
            }
            "year_range" | "year" => Ok(QuestionTypeSlug::YearRange),
            "numeric_range" | "number" | "numeric" | "number_range" => {
                Ok(QuestionTypeSlug::NumericRange)
            }
            "matching" | "match" | "matching_pairs" => Ok(QuestionTypeSlug::Matching),
            "fill_blank" | "fill_blanks" | "fill_in_blank" | "fill-in-the-blank" => {
                Ok(QuestionTypeSlug::FillBlank)
            }
            "multi_select" | "multi-select" | "multi select" | "multiple_select" => {
                Ok(QuestionTypeSlug::MultiSelect)
            }
            other => Err(GradingError::UnknownQuestionType(other.to_string())),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_true_label() -> String {
    "True".to_string()
}

fn default_false_label() -> String {
    "False".to_string()
}

fn is_true(value: &bool) -> bool {
    *value
}

// --- multiple choice ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceConfig {
    pub options: Vec<String>,
    #[serde(default)]
    pub shuffle_options: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceAnswer {
    /// Zero-based index into `options`.
    pub correct_index: usize,
}

// --- true / false ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrueFalseConfig {
    #[serde(default = "default_true_label")]
    pub true_label: String,
    #[serde(default = "default_false_label")]
    pub false_label: String,
}

impl Default for TrueFalseConfig {
    fn default() -> Self {
        Self {
            true_label: default_true_label(),
            false_label: default_false_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrueFalseAnswer {
    pub correct_value: bool,
}

// --- text input ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextInputConfig {
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default = "default_true")]
    pub trim_whitespace: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

impl Default for TextInputConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            trim_whitespace: true,
            placeholder: None,
            max_length: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextInputAnswer {
    pub accepted_answers: Vec<String>,
    /// Partial-credit keywords, matched as substrings of the answer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Minimum keyword hits before partial credit applies. Defaults to half
    /// the keywords, rounded up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_match_threshold: Option<u32>,
}

// --- year / numeric ranges ---

/// How a numeric tolerance is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToleranceType {
    #[default]
    Absolute,
    /// Percent of the absolute correct value.
    Percentage,
}

/// A fixed credit tier: answers within `tolerance` of the correct value earn
/// `credit_percent`. Tiers are kept sorted by ascending tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialCreditRange {
    pub tolerance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance_type: Option<ToleranceType>,
    pub credit_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRangeConfig {
    /// Years either side of the correct year that still earn decaying credit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_year: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_year: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRangeAnswer {
    pub correct_year: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partial_credit_ranges: Vec<PartialCreditRange>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericRangeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance_type: Option<ToleranceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericRangeAnswer {
    pub correct_value: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partial_credit_ranges: Vec<PartialCreditRange>,
}

// --- matching ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingConfig {
    pub left_column: Vec<String>,
    pub right_column: Vec<String>,
    #[serde(default = "default_true")]
    pub shuffle_right: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_column_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_column_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingAnswer {
    /// Left item text to the right item text it pairs with.
    pub correct_pairs: IndexMap<String, String>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub partial_credit_per_pair: bool,
}

// --- fill in the blank ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlankDefinition {
    pub id: String,
    #[serde(default)]
    pub accepted_answers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillBlankConfig {
    /// Text with `{{id}}` markers.
    pub template: String,
    pub blanks: Vec<BlankDefinition>,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillBlankAnswer {
    /// Blank ID to its accepted answers, in template order.
    pub blanks: IndexMap<String, Vec<String>>,
}

// --- multi select ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSelectConfig {
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle_options: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_selections: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSelectAnswer {
    pub correct_indices: Vec<usize>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub partial_credit: bool,
}

/// Typed config and answer key for one question, one variant per slug.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionBody {
    MultipleChoice {
        config: MultipleChoiceConfig,
        answer: MultipleChoiceAnswer,
    },
    TrueFalse {
        config: TrueFalseConfig,
        answer: TrueFalseAnswer,
    },
    TextInput {
        config: TextInputConfig,
        answer: TextInputAnswer,
    },
    YearRange {
        config: YearRangeConfig,
        answer: YearRangeAnswer,
    },
    NumericRange {
        config: NumericRangeConfig,
        answer: NumericRangeAnswer,
    },
    Matching {
        config: MatchingConfig,
        answer: MatchingAnswer,
    },
    FillBlank {
        config: FillBlankConfig,
        answer: FillBlankAnswer,
    },
    MultiSelect {
        config: MultiSelectConfig,
        answer: MultiSelectAnswer,
    },
}

impl QuestionBody {
    pub fn slug(&self) -> QuestionTypeSlug {
        match self {
            QuestionBody::MultipleChoice { .. } => QuestionTypeSlug::MultipleChoice,
            QuestionBody::TrueFalse { .. } => QuestionTypeSlug::TrueFalse,
            QuestionBody::TextInput { .. } => QuestionTypeSlug::TextInput,
            QuestionBody::YearRange { .. } => QuestionTypeSlug::YearRange,
            QuestionBody::NumericRange { .. } => QuestionTypeSlug::NumericRange,
            QuestionBody::Matching { .. } => QuestionTypeSlug::Matching,
            QuestionBody::FillBlank { .. } => QuestionTypeSlug::FillBlank,
            QuestionBody::MultiSelect { .. } => QuestionTypeSlug::MultiSelect,
        }
    }

    /// The canonical config as a JSON value.
    pub fn config_value(&self) -> Value {
        let value = match self {
            QuestionBody::MultipleChoice { config, .. } => serde_json::to_value(config),
            QuestionBody::TrueFalse { config, .. } => serde_json::to_value(config),
            QuestionBody::TextInput { config, .. } => serde_json::to_value(config),
            QuestionBody::YearRange { config, .. } => serde_json::to_value(config),
            QuestionBody::NumericRange { config, .. } => serde_json::to_value(config),
            QuestionBody::Matching { config, .. } => serde_json::to_value(config),
            QuestionBody::FillBlank { config, .. } => serde_json::to_value(config),
            QuestionBody::MultiSelect { config, .. } => serde_json::to_value(config),
        };
        value.unwrap_or(Value::Null)
    }

    /// The canonical answer key as a JSON value.
    pub fn answer_value(&self) -> Value {
        let value = match self {
            QuestionBody::MultipleChoice { answer, .. } => serde_json::to_value(answer),
            QuestionBody::TrueFalse { answer, .. } => serde_json::to_value(answer),
            QuestionBody::TextInput { answer, .. } => serde_json::to_value(answer),
            QuestionBody::YearRange { answer, .. } => serde_json::to_value(answer),
            QuestionBody::NumericRange { answer, .. } => serde_json::to_value(answer),
            QuestionBody::Matching { answer, .. } => serde_json::to_value(answer),
            QuestionBody::FillBlank { answer, .. } => serde_json::to_value(answer),
            QuestionBody::MultiSelect { answer, .. } => serde_json::to_value(answer),
        };
        value.unwrap_or(Value::Null)
    }
}

/// A resolved, gradable question.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: String,
    /// Prompt text shown to the taker.
    pub prompt: String,
    /// Points available, never negative.
    pub points: f64,
    pub body: QuestionBody,
    /// Resolved from a pre-multi-type record (`options` + `correctAnswer`).
    pub legacy: bool,
}

impl Question {
    pub fn slug(&self) -> QuestionTypeSlug {
        self.body.slug()
    }

    /// Render back into the canonical record shape.
    pub fn to_record(&self) -> QuestionRecord {
        QuestionRecord {
            id: self.id.clone(),
            question: self.prompt.clone(),
            question_type: self.slug().to_string(),
            question_config: self.body.config_value(),
            correct_answer_data: Some(self.body.answer_value()),
            points: self.points,
            options: None,
            correct_answer: None,
        }
    }
}

fn default_question_type() -> String {
    QuestionTypeSlug::MultipleChoice.to_string()
}

fn default_points() -> f64 {
    1.0
}

/// A question as stored or authored: loosely typed, possibly legacy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: String,
    /// Prompt text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub question: String,
    #[serde(default = "default_question_type", alias = "type", alias = "question_type")]
    pub question_type: String,
    #[serde(default, alias = "config", alias = "question_config")]
    pub question_config: Value,
    #[serde(
        default,
        alias = "answer",
        alias = "answerData",
        alias = "correct_answer_data"
    )]
    pub correct_answer_data: Option<Value>,
    #[serde(default = "default_points")]
    pub points: f64,
    /// Legacy option list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
    /// Legacy zero-based correct option index.
    #[serde(
        default,
        alias = "correct_answer",
        skip_serializing_if = "Option::is_none"
    )]
    pub correct_answer: Option<Value>,
}

impl QuestionRecord {
    /// Whether this record predates typed answer data: no answer key, but a
    /// legacy option list and correct index.
    pub fn is_legacy(&self) -> bool {
        let has_answer_data = self
            .correct_answer_data
            .as_ref()
            .is_some_and(|v| !v.is_null());
        let has_options = self.options.as_ref().is_some_and(|v| !v.is_null());
        let has_correct = self.correct_answer.as_ref().is_some_and(|v| !v.is_null());
        !has_answer_data && has_options && has_correct
    }
}

/// A taker's submitted answer, one shape per question type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserAnswer {
    SelectedIndex {
        #[serde(rename = "selectedIndex")]
        selected_index: i64,
    },
    SelectedValue {
        #[serde(rename = "selectedValue")]
        selected_value: bool,
    },
    Text {
        text: String,
    },
    Year {
        year: f64,
    },
    Value {
        value: f64,
    },
    Pairs {
        pairs: IndexMap<String, String>,
    },
    Blanks {
        blanks: IndexMap<String, String>,
    },
    SelectedIndices {
        #[serde(rename = "selectedIndices")]
        selected_indices: Vec<i64>,
    },
    /// Anything that does not fit the expected shape; kept for reporting.
    Unrecognized(Value),
}

impl UserAnswer {
    /// Interpret a raw submitted value for a question of type `slug`.
    ///
    /// Bare scalars are accepted as shorthand: a number for a choice index or
    /// range value, a boolean for true/false, a string for text input and a
    /// number array for multi-select. Returns `None` for a missing answer.
    pub fn from_raw(slug: QuestionTypeSlug, raw: &Value) -> Option<UserAnswer> {
        if raw.is_null() {
            return None;
        }
        let parsed = match slug {
            QuestionTypeSlug::MultipleChoice => {
                let source = keyed(raw, "selectedIndex");
                coerce::integer(source).map(|selected_index| UserAnswer::SelectedIndex {
                    selected_index,
                })
            }
            QuestionTypeSlug::TrueFalse => match keyed(raw, "selectedValue") {
                Value::Bool(b) => Some(UserAnswer::SelectedValue { selected_value: *b }),
                _ => None,
            },
            QuestionTypeSlug::TextInput => match keyed(raw, "text") {
                Value::String(s) => Some(UserAnswer::Text { text: s.clone() }),
                _ => None,
            },
            QuestionTypeSlug::YearRange => {
                coerce::to_number(keyed(raw, "year")).map(|year| UserAnswer::Year { year })
            }
            QuestionTypeSlug::NumericRange => {
                coerce::to_number(keyed(raw, "value")).map(|value| UserAnswer::Value { value })
            }
            QuestionTypeSlug::Matching => {
                string_map(raw.get("pairs")).map(|pairs| UserAnswer::Pairs { pairs })
            }
            QuestionTypeSlug::FillBlank => {
                string_map(raw.get("blanks")).map(|blanks| UserAnswer::Blanks { blanks })
            }
            QuestionTypeSlug::MultiSelect => match keyed(raw, "selectedIndices") {
                Value::Array(items) => Some(UserAnswer::SelectedIndices {
                    selected_indices: items.iter().filter_map(coerce::integer).collect(),
                }),
                _ => None,
            },
        };
        Some(parsed.unwrap_or_else(|| UserAnswer::Unrecognized(raw.clone())))
    }
}

/// The value under `key` for an object, or the value itself for a bare scalar.
fn keyed<'a>(raw: &'a Value, key: &str) -> &'a Value {
    match raw {
        Value::Object(map) => map.get(key).unwrap_or(&Value::Null),
        other => other,
    }
}

fn string_map(value: Option<&Value>) -> Option<IndexMap<String, String>> {
    let Value::Object(map) = value? else {
        return None;
    };
    Some(
        map.iter()
            .filter_map(|(k, v)| coerce::scalar_text(v).map(|text| (k.clone(), text)))
            .collect(),
    )
}

/// A quiz definition: metadata, an optional grading policy, and questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Per-quiz grading policy; overrides configured defaults.
    #[serde(default)]
    pub grading: Option<GradingOptions>,
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
}

/// One taker's submission for a quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "submitted_at")]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Question ID to raw submitted answer.
    #[serde(default)]
    pub answers: IndexMap<String, Value>,
}
