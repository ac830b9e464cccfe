//! Quiz grading: per-question results rolled up into a score, grade and
//! pass/fail verdict.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::coerce;
use crate::error::GradingError;
use crate::model::{Question, QuestionBody, QuestionRecord, UserAnswer};
use crate::normalize::{normalize_record, resolve_records};
use crate::results::{GradeResult, GradingOptions, GradingType, LetterGrade, QuestionResult};
use crate::validate::{validate, validate_legacy_answer, Validation};

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Grade one resolved question against a raw submitted answer.
///
/// `points_earned` is exactly `credit_percent / 100 * points`.
pub fn grade_question(
    question: &Question,
    raw_answer: Option<&Value>,
    partial_credit_enabled: bool,
) -> QuestionResult {
    let raw_answer = raw_answer.filter(|v| !v.is_null());
    let user_answer = raw_answer.and_then(|raw| UserAnswer::from_raw(question.slug(), raw));

    let validation = match (&question.body, raw_answer) {
        (QuestionBody::MultipleChoice { answer, .. }, Some(raw)) if question.legacy && raw.is_number() => {
            validate_legacy_answer(coerce::to_number(raw), answer.correct_index)
        }
        _ => validate(&question.body, user_answer.as_ref(), partial_credit_enabled),
    };
    let Validation {
        is_correct,
        credit_percent,
        feedback,
    } = validation;

    let points_earned = credit_percent / 100.0 * question.points;
    debug!(
        question_id = %question.id,
        question_type = %question.slug(),
        credit_percent,
        "graded question"
    );

    QuestionResult {
        question_id: question.id.clone(),
        question_type: question.slug(),
        is_correct,
        points_earned,
        points_possible: question.points,
        credit_percent,
        user_answer,
        correct_answer: question.body.answer_value(),
        feedback,
    }
}

/// Resolve and grade a single stored record.
pub fn grade_record(
    record: &QuestionRecord,
    raw_answer: Option<&Value>,
    partial_credit_enabled: bool,
) -> Result<QuestionResult, GradingError> {
    let question = normalize_record(record)?;
    Ok(grade_question(&question, raw_answer, partial_credit_enabled))
}

/// Grade already-resolved questions. Missing answers earn zero credit.
pub fn grade_questions(
    questions: &[Question],
    answers: &IndexMap<String, Value>,
    options: &GradingOptions,
) -> GradeResult {
    let question_results: Vec<QuestionResult> = questions
        .iter()
        .map(|question| {
            grade_question(
                question,
                answers.get(&question.id),
                options.partial_credit_enabled,
            )
        })
        .collect();

    let points_earned: f64 = question_results.iter().map(|r| r.points_earned).sum();
    let points_possible: f64 = question_results.iter().map(|r| r.points_possible).sum();
    let score = if points_possible > 0.0 {
        round2(points_earned / points_possible * 100.0)
    } else {
        0.0
    };

    let (grade, passed) = verdict(score, options);

    GradeResult {
        score,
        points_earned: round2(points_earned),
        points_possible: round2(points_possible),
        grade,
        passed,
        question_results,
    }
}

/// Grade a full attempt from stored records.
///
/// Every record is resolved before anything is graded, so an unknown
/// question type fails the whole call.
pub fn grade_quiz(
    records: &[QuestionRecord],
    answers: &IndexMap<String, Value>,
    options: &GradingOptions,
) -> Result<GradeResult, GradingError> {
    let questions = resolve_records(records)?;
    Ok(grade_questions(&questions, answers, options))
}

fn verdict(score: f64, options: &GradingOptions) -> (Option<String>, Option<bool>) {
    let passes = score >= options.pass_threshold;
    match options.grading_type {
        GradingType::Percentage | GradingType::Points => (None, Some(passes)),
        GradingType::PassFail => {
            let grade = if passes { "Pass" } else { "Fail" };
            (Some(grade.to_string()), Some(passes))
        }
        GradingType::Letter => {
            let letter = letter_grade(score, options.letter_table());
            let passed = letter.map(|l| l.min_percentage >= options.pass_threshold);
            (letter.map(|l| l.grade.clone()), passed.or(Some(false)))
        }
    }
}

/// The letter for `score`: highest threshold first, first match wins. When
/// nothing matches, the lowest grade in the table.
pub fn letter_grade(score: f64, table: &[LetterGrade]) -> Option<&LetterGrade> {
    let mut ordered: Vec<&LetterGrade> = table.iter().collect();
    ordered.sort_by(|a, b| b.min_percentage.total_cmp(&a.min_percentage));
    ordered
        .iter()
        .find(|grade| score >= grade.min_percentage)
        .or_else(|| ordered.last())
        .copied()
}

/// Headline text for a result under `grading_type`.
pub fn format_grade_display(
    result: &GradeResult,
    grading_type: GradingType,
    show_point_values: bool,
) -> String {
    let percent = format!("{:.1}%", result.score);
    match grading_type {
        GradingType::Letter | GradingType::PassFail => {
            result.grade.clone().unwrap_or(percent)
        }
        GradingType::Points if show_point_values => format!(
            "{:.1} / {:.1} pts",
            result.points_earned, result.points_possible
        ),
        GradingType::Points | GradingType::Percentage => percent,
    }
}

/// Coarse colour band for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeBand {
    Success,
    Warning,
    Error,
}

pub fn grade_band(score: f64, pass_threshold: f64) -> GradeBand {
    if score >= 80.0 {
        GradeBand::Success
    } else if score >= pass_threshold {
        GradeBand::Warning
    } else {
        GradeBand::Error
    }
}
