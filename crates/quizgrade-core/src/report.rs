//! Grading report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Quiz;
use crate::results::{GradeResult, GradingOptions};
use crate::statistics::{QuestionStatistics, QuizStatistics};

/// A complete batch grading report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the graded quiz.
    pub quiz: QuizSummary,
    /// Policy the attempts were graded under.
    pub grading: GradingOptions,
    /// One entry per attempt, in input order.
    pub attempts: Vec<AttemptResult>,
    pub statistics: QuizStatistics,
    pub question_statistics: Vec<QuestionStatistics>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a quiz (without the question definitions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
    pub points_possible: f64,
}

impl QuizSummary {
    pub fn new(quiz: &Quiz, points_possible: f64) -> Self {
        Self {
            id: quiz.id.clone(),
            name: quiz.name.clone(),
            question_count: quiz.questions.len(),
            points_possible,
        }
    }
}

/// The graded outcome of one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub attempt_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub result: GradeResult,
}

impl GradingReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradingReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// The grade results of every attempt, in report order.
    pub fn results(&self) -> Vec<GradeResult> {
        self.attempts.iter().map(|a| a.result.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::compute_statistics;

    fn make_report() -> GradingReport {
        let result = GradeResult {
            score: 75.0,
            points_earned: 1.5,
            points_possible: 2.0,
            grade: None,
            passed: Some(true),
            question_results: Vec::new(),
        };
        GradingReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            quiz: QuizSummary {
                id: "capitals".into(),
                name: "Capitals".into(),
                question_count: 2,
                points_possible: 2.0,
            },
            grading: GradingOptions::default(),
            attempts: vec![AttemptResult {
                attempt_id: "a1".into(),
                participant: Some("ada".into()),
                submitted_at: None,
                result: result.clone(),
            }],
            statistics: compute_statistics(&[result]),
            question_statistics: Vec::new(),
            duration_ms: 3,
        }
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = GradingReport::load_json(&path).unwrap();

        assert_eq!(loaded.quiz.id, "capitals");
        assert_eq!(loaded.attempts.len(), 1);
        assert_eq!(loaded.statistics, report.statistics);
        assert_eq!(loaded.results()[0].score, 75.0);
    }

    #[test]
    fn camel_case_on_disk() {
        let json = serde_json::to_value(make_report()).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json["attempts"][0].get("attemptId").is_some());
        assert_eq!(json["statistics"]["passRate"], serde_json::json!(100.0));
    }

    #[test]
    fn load_missing_file_names_path() {
        let err = GradingReport::load_json(Path::new("/nonexistent/report.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/report.json"));
    }
}
