//! Grading policy and result types.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{QuestionTypeSlug, UserAnswer};

/// How a quiz score is presented and judged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingType {
    #[default]
    Percentage,
    Letter,
    PassFail,
    Points,
}

impl fmt::Display for GradingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingType::Percentage => write!(f, "percentage"),
            GradingType::Letter => write!(f, "letter"),
            GradingType::PassFail => write!(f, "pass_fail"),
            GradingType::Points => write!(f, "points"),
        }
    }
}

impl FromStr for GradingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percentage" | "percent" | "%" => Ok(GradingType::Percentage),
            "letter" | "letters" => Ok(GradingType::Letter),
            "pass_fail" | "pass-fail" | "passfail" => Ok(GradingType::PassFail),
            "points" | "point" | "pts" => Ok(GradingType::Points),
            other => Err(format!("unknown grading type: {other}")),
        }
    }
}

/// One row of a letter grade table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterGrade {
    pub grade: String,
    #[serde(alias = "min_percentage")]
    pub min_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl LetterGrade {
    pub fn new(grade: &str, min_percentage: f64) -> Self {
        Self {
            grade: grade.to_string(),
            min_percentage,
            description: None,
        }
    }
}

static DEFAULT_LETTER_GRADES: LazyLock<Vec<LetterGrade>> = LazyLock::new(|| {
    [
        ("A+", 97.0),
        ("A", 93.0),
        ("A-", 90.0),
        ("B+", 87.0),
        ("B", 83.0),
        ("B-", 80.0),
        ("C+", 77.0),
        ("C", 73.0),
        ("C-", 70.0),
        ("D+", 67.0),
        ("D", 63.0),
        ("D-", 60.0),
        ("F", 0.0),
    ]
    .into_iter()
    .map(|(grade, min)| LetterGrade::new(grade, min))
    .collect()
});

/// The standard A+ through F table, highest threshold first.
pub fn default_letter_grades() -> &'static [LetterGrade] {
    &DEFAULT_LETTER_GRADES
}

fn default_pass_threshold() -> f64 {
    60.0
}

fn default_partial_credit() -> bool {
    true
}

/// Quiz-level grading policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingOptions {
    #[serde(default, alias = "grading_type")]
    pub grading_type: GradingType,
    /// Minimum score (0 to 100) that counts as passing.
    #[serde(default = "default_pass_threshold", alias = "pass_threshold")]
    pub pass_threshold: f64,
    /// Custom letter table; `None` or empty uses [`default_letter_grades`].
    #[serde(default, alias = "letter_grades", skip_serializing_if = "Option::is_none")]
    pub letter_grades: Option<Vec<LetterGrade>>,
    #[serde(default = "default_partial_credit", alias = "partial_credit_enabled")]
    pub partial_credit_enabled: bool,
}

impl Default for GradingOptions {
    fn default() -> Self {
        Self {
            grading_type: GradingType::default(),
            pass_threshold: default_pass_threshold(),
            letter_grades: None,
            partial_credit_enabled: default_partial_credit(),
        }
    }
}

impl GradingOptions {
    /// The letter table in effect.
    pub fn letter_table(&self) -> &[LetterGrade] {
        match &self.letter_grades {
            Some(grades) if !grades.is_empty() => grades,
            _ => default_letter_grades(),
        }
    }
}

/// Outcome of grading one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: String,
    pub question_type: QuestionTypeSlug,
    pub is_correct: bool,
    pub points_earned: f64,
    pub points_possible: f64,
    /// Fraction of the points awarded, 0 to 100.
    pub credit_percent: f64,
    pub user_answer: Option<UserAnswer>,
    /// Canonical answer key, for display.
    pub correct_answer: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Outcome of grading a whole quiz attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeResult {
    /// Percentage of points earned, rounded to 2 decimals.
    pub score: f64,
    pub points_earned: f64,
    pub points_possible: f64,
    pub grade: Option<String>,
    pub passed: Option<bool>,
    pub question_results: Vec<QuestionResult>,
}
