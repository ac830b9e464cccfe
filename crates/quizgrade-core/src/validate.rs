//! Per-type answer validation.
//!
//! Each branch compares a taker's [`UserAnswer`] against a normalized
//! [`QuestionBody`] and awards credit between 0 and 100.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::coerce::format_number;
use crate::model::{
    FillBlankAnswer, FillBlankConfig, MatchingAnswer, MultiSelectAnswer, NumericRangeAnswer,
    NumericRangeConfig, PartialCreditRange, QuestionBody, TextInputAnswer, TextInputConfig,
    ToleranceType, UserAnswer, YearRangeAnswer, YearRangeConfig,
};

/// Two floats closer than this are the same numeric answer.
const NUMERIC_EPSILON: f64 = 1e-4;

/// Ceiling for credit earned through keyword matches alone.
const KEYWORD_CREDIT_CAP: f64 = 75.0;

/// Verdict for one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub is_correct: bool,
    pub credit_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl Validation {
    fn credit(credit_percent: f64, feedback: Option<String>) -> Self {
        let credit_percent = if credit_percent.is_finite() {
            credit_percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            is_correct: credit_percent >= 100.0,
            credit_percent,
            feedback,
        }
    }

    fn correct() -> Self {
        Self::credit(100.0, None)
    }

    fn incorrect() -> Self {
        Self::credit(0.0, None)
    }

    fn zero(feedback: impl Into<String>) -> Self {
        Self::credit(0.0, Some(feedback.into()))
    }

    fn partial(credit_percent: f64, feedback: impl Into<String>) -> Self {
        Self::credit(credit_percent, Some(feedback.into()))
    }

    fn binary(is_correct: bool) -> Self {
        if is_correct {
            Self::correct()
        } else {
            Self::incorrect()
        }
    }

    pub fn no_answer() -> Self {
        Self::zero("No answer provided")
    }

    pub fn invalid_format() -> Self {
        Self::zero("Invalid answer format")
    }
}

/// Grade `answer` against `body`.
///
/// A missing answer earns nothing. With `partial_credit_enabled` off, any
/// credit short of 100 is dropped to 0; feedback is kept.
pub fn validate(
    body: &QuestionBody,
    answer: Option<&UserAnswer>,
    partial_credit_enabled: bool,
) -> Validation {
    let Some(answer) = answer else {
        return Validation::no_answer();
    };

    let mut result = match (body, answer) {
        (
            QuestionBody::MultipleChoice { answer: key, .. },
            UserAnswer::SelectedIndex { selected_index },
        ) => Validation::binary(*selected_index == key.correct_index as i64),
        (
            QuestionBody::TrueFalse { answer: key, .. },
            UserAnswer::SelectedValue { selected_value },
        ) => Validation::binary(*selected_value == key.correct_value),
        (QuestionBody::TextInput { config, answer: key }, UserAnswer::Text { text }) => {
            text_input(config, key, text)
        }
        (QuestionBody::YearRange { config, answer: key }, UserAnswer::Year { year }) => {
            year_range(config, key, *year)
        }
        (QuestionBody::NumericRange { config, answer: key }, UserAnswer::Value { value }) => {
            numeric_range(config, key, *value)
        }
        (QuestionBody::Matching { answer: key, .. }, UserAnswer::Pairs { pairs }) => {
            matching(key, pairs)
        }
        (QuestionBody::FillBlank { config, answer: key }, UserAnswer::Blanks { blanks }) => {
            fill_blank(config, key, blanks)
        }
        (
            QuestionBody::MultiSelect { answer: key, .. },
            UserAnswer::SelectedIndices { selected_indices },
        ) => multi_select(key, selected_indices),
        _ => Validation::invalid_format(),
    };

    if !partial_credit_enabled && !result.is_correct {
        result.credit_percent = 0.0;
    }
    result
}

/// Grade a pre-multi-type question, where the answer is a bare option index.
pub fn validate_legacy_answer(user_index: Option<f64>, correct_index: usize) -> Validation {
    match user_index {
        None => Validation::no_answer(),
        Some(index) => Validation::binary(index == correct_index as f64),
    }
}

fn text_input(config: &TextInputConfig, key: &TextInputAnswer, text: &str) -> Validation {
    let fold = |s: &str| {
        let s = if config.trim_whitespace { s.trim() } else { s };
        if config.case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    };
    let submitted = fold(text);

    if key
        .accepted_answers
        .iter()
        .any(|accepted| fold(accepted) == submitted)
    {
        return Validation::correct();
    }

    if !key.keywords.is_empty() {
        let total = key.keywords.len();
        let matched = key
            .keywords
            .iter()
            .filter(|keyword| submitted.contains(&fold(keyword)))
            .count();
        let threshold = key
            .keyword_match_threshold
            .map(|t| t as usize)
            .unwrap_or_else(|| total.div_ceil(2));
        if matched > 0 && matched >= threshold {
            let credit = (matched as f64 / total as f64 * 100.0).min(KEYWORD_CREDIT_CAP);
            return Validation::partial(
                credit,
                format!("Partial credit: matched {matched} of {total} key concepts"),
            );
        }
    }

    Validation::incorrect()
}

/// Credit from the first explicit range that covers `diff`.
fn range_credit(
    ranges: &[PartialCreditRange],
    diff: f64,
    correct: f64,
) -> Option<f64> {
    ranges.iter().find_map(|range| {
        let allowed = tolerance_amount(range.tolerance, range.tolerance_type, correct);
        (diff <= allowed).then_some(range.credit_percent)
    })
}

fn tolerance_amount(tolerance: f64, kind: Option<ToleranceType>, correct: f64) -> f64 {
    match kind.unwrap_or_default() {
        ToleranceType::Absolute => tolerance,
        ToleranceType::Percentage => tolerance / 100.0 * correct.abs(),
    }
}

/// Linear decay from 100 at `diff == 0` to 0 at `diff == tolerance`.
fn decayed_credit(diff: f64, tolerance: f64) -> Option<f64> {
    (tolerance > 0.0 && diff < tolerance).then(|| 100.0 * (1.0 - diff / tolerance))
}

fn year_suffix(diff: f64) -> &'static str {
    if diff > 1.0 {
        "s"
    } else {
        ""
    }
}

fn year_range(config: &YearRangeConfig, key: &YearRangeAnswer, year: f64) -> Validation {
    if let Some(min) = config.min_year.filter(|min| year < *min as f64) {
        return Validation::zero(format!("Year must be at least {min}"));
    }
    if let Some(max) = config.max_year.filter(|max| year > *max as f64) {
        return Validation::zero(format!("Year must be at most {max}"));
    }

    let correct = key.correct_year as f64;
    let diff = (year - correct).abs();
    if diff == 0.0 {
        return Validation::correct();
    }

    let off_by = || format!("Off by {} year{}", format_number(diff), year_suffix(diff));
    if let Some(credit) = range_credit(&key.partial_credit_ranges, diff, correct) {
        return Validation::partial(credit, off_by());
    }
    let tolerance = config.tolerance.map(f64::from).unwrap_or(0.0);
    if let Some(credit) = decayed_credit(diff, tolerance) {
        return Validation::partial(credit, off_by());
    }

    Validation::zero(format!("The correct year was {}", key.correct_year))
}

fn numeric_range(config: &NumericRangeConfig, key: &NumericRangeAnswer, value: f64) -> Validation {
    if let Some(min) = config.min.filter(|min| value < *min) {
        return Validation::zero(format!("Value must be at least {}", format_number(min)));
    }
    if let Some(max) = config.max.filter(|max| value > *max) {
        return Validation::zero(format!("Value must be at most {}", format_number(max)));
    }

    let correct = key.correct_value;
    let diff = (value - correct).abs();
    if diff < NUMERIC_EPSILON {
        return Validation::correct();
    }

    let close = || format!("Close! Off by {diff:.2}");
    if let Some(credit) = range_credit(&key.partial_credit_ranges, diff, correct) {
        return Validation::partial(credit, close());
    }
    if let Some(tolerance) = config.tolerance {
        let allowed = tolerance_amount(tolerance, config.tolerance_type, correct);
        if let Some(credit) = decayed_credit(diff, allowed) {
            return Validation::partial(credit, close());
        }
    }

    let unit = config
        .unit
        .as_deref()
        .map(|unit| format!(" {unit}"))
        .unwrap_or_default();
    Validation::zero(format!(
        "The correct answer was {}{unit}",
        format_number(correct)
    ))
}

fn matching(key: &MatchingAnswer, pairs: &indexmap::IndexMap<String, String>) -> Validation {
    let total = key.correct_pairs.len();
    if total == 0 {
        return Validation::zero("No matching pairs configured");
    }

    let correct = key
        .correct_pairs
        .iter()
        .filter(|(left, right)| {
            pairs
                .get(*left)
                .is_some_and(|submitted| submitted.trim() == right.as_str())
        })
        .count();

    if correct == total {
        return Validation::correct();
    }
    let feedback = format!("{correct} of {total} pairs correct");
    if key.partial_credit_per_pair {
        Validation::partial(correct as f64 / total as f64 * 100.0, feedback)
    } else {
        Validation::zero(feedback)
    }
}

fn fill_blank(
    config: &FillBlankConfig,
    key: &FillBlankAnswer,
    blanks: &indexmap::IndexMap<String, String>,
) -> Validation {
    let total = key.blanks.len();
    if total == 0 {
        return Validation::zero("No blanks configured");
    }

    let fold = |s: &str| {
        let s = s.trim();
        if config.case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    };

    let correct = key
        .blanks
        .iter()
        .filter(|(id, accepted)| {
            let Some(submitted) = blanks.get(*id).map(|s| fold(s)) else {
                return false;
            };
            !submitted.is_empty() && accepted.iter().any(|a| fold(a) == submitted)
        })
        .count();

    if correct == total {
        return Validation::correct();
    }
    if correct == 0 {
        return Validation::incorrect();
    }
    Validation::partial(
        correct as f64 / total as f64 * 100.0,
        format!("{correct} of {total} blanks correct"),
    )
}

fn multi_select(key: &MultiSelectAnswer, selected: &[i64]) -> Validation {
    let selected: HashSet<i64> = selected.iter().copied().collect();
    let expected: HashSet<i64> = key.correct_indices.iter().map(|&i| i as i64).collect();

    let correct = selected.intersection(&expected).count();
    let incorrect = selected.len() - correct;
    let missed = expected.len() - correct;

    if expected.is_empty() {
        return Validation::binary(selected.is_empty());
    }
    if correct == expected.len() && incorrect == 0 {
        return Validation::correct();
    }

    if key.partial_credit {
        let net = correct.saturating_sub(incorrect) as f64;
        Validation::partial(
            net / expected.len() as f64 * 100.0,
            format!("{correct} correct, {incorrect} incorrect, {missed} missed"),
        )
    } else {
        Validation::zero(format!(
            "Selected {correct} of {} correct options",
            expected.len()
        ))
    }
}
