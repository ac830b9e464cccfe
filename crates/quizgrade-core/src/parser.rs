//! Quiz and attempt file loading.
//!
//! Quizzes are TOML (a `[quiz]` header, an optional `[grading]` table and
//! `[[questions]]`) or JSON (a flat [`Quiz`] object), chosen by extension.
//! Attempts are JSON: one file holding an array or a single attempt, or a
//! directory of such files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::model::{Attempt, QuestionBody, QuestionRecord, Quiz};
use crate::normalize::normalize_record;
use crate::results::GradingOptions;

/// Intermediate TOML structure for quiz files.
#[derive(Debug, Deserialize)]
struct TomlQuizFile {
    quiz: TomlQuizHeader,
    #[serde(default)]
    grading: Option<GradingOptions>,
    #[serde(default)]
    questions: Vec<QuestionRecord>,
}

#[derive(Debug, Deserialize)]
struct TomlQuizHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Parse a quiz file, TOML or JSON by extension.
pub fn parse_quiz(path: &Path) -> Result<Quiz> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read quiz file: {}", path.display()))?;

    parse_quiz_str(&content, path)
}

/// Parse quiz file content; `source_path` picks the format and names errors.
pub fn parse_quiz_str(content: &str, source_path: &Path) -> Result<Quiz> {
    if is_json(source_path) {
        return serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()));
    }

    let parsed: TomlQuizFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Ok(Quiz {
        id: parsed.quiz.id,
        name: parsed.quiz.name,
        description: parsed.quiz.description,
        grading: parsed.grading,
        questions: parsed.questions,
    })
}

/// Load attempts from a JSON file or a directory of JSON files.
///
/// In a directory, unreadable files are skipped with a warning. Attempts
/// without an ID get the file stem (single-attempt files) or `attempt-<n>`.
pub fn load_attempts(path: &Path) -> Result<Vec<Attempt>> {
    let mut attempts = Vec::new();

    if path.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(path)
            .with_context(|| format!("failed to read directory: {}", path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_json(p))
            .collect();
        files.sort();

        for file in files {
            match parse_attempt_file(&file) {
                Ok(batch) => attempts.extend(batch),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", file.display(), e);
                }
            }
        }
    } else {
        attempts = parse_attempt_file(path)?;
    }

    for (index, attempt) in attempts.iter_mut().enumerate() {
        if attempt.id.trim().is_empty() {
            attempt.id = format!("attempt-{}", index + 1);
        }
    }
    Ok(attempts)
}

fn parse_attempt_file(path: &Path) -> Result<Vec<Attempt>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read attempts file: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse JSON: {}", path.display()))?;

    match value {
        Value::Array(_) => serde_json::from_value(value)
            .with_context(|| format!("invalid attempt list: {}", path.display())),
        _ => {
            let mut attempt: Attempt = serde_json::from_value(value)
                .with_context(|| format!("invalid attempt: {}", path.display()))?;
            if attempt.id.trim().is_empty() {
                if let Some(stem) = path.file_stem() {
                    attempt.id = stem.to_string_lossy().into_owned();
                }
            }
            Ok(vec![attempt])
        }
    }
}

/// A warning from quiz validation.
#[derive(Debug, Clone)]
pub struct QuizWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl QuizWarning {
    fn question(id: &str, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(id.to_string()),
            message: message.into(),
        }
    }
}

/// Check a quiz for authoring mistakes that would make grading surprising.
pub fn validate_quiz(quiz: &Quiz) -> Vec<QuizWarning> {
    let mut warnings = Vec::new();

    if quiz.questions.is_empty() {
        warnings.push(QuizWarning {
            question_id: None,
            message: "quiz has no questions".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for record in &quiz.questions {
        if !seen_ids.insert(&record.id) {
            warnings.push(QuizWarning::question(
                &record.id,
                format!("duplicate question ID: {}", record.id),
            ));
        }
    }

    for record in &quiz.questions {
        let question = match normalize_record(record) {
            Ok(question) => question,
            Err(e) => {
                warnings.push(QuizWarning::question(&record.id, e.to_string()));
                continue;
            }
        };

        if question.points == 0.0 {
            warnings.push(QuizWarning::question(&record.id, "question is worth 0 points"));
        }

        let problem = match &question.body {
            QuestionBody::MultipleChoice { config, .. } if config.options.is_empty() => {
                Some("no options configured")
            }
            QuestionBody::MultiSelect { config, .. } if config.options.is_empty() => {
                Some("no options configured")
            }
            QuestionBody::MultiSelect { answer, .. } if answer.correct_indices.is_empty() => {
                Some("no correct options configured")
            }
            QuestionBody::TextInput { answer, .. }
                if answer.accepted_answers.is_empty() && answer.keywords.is_empty() =>
            {
                Some("no accepted answers or keywords configured")
            }
            QuestionBody::Matching { answer, .. } if answer.correct_pairs.is_empty() => {
                Some("no matching pairs configured")
            }
            QuestionBody::FillBlank { answer, .. }
                if answer.blanks.values().any(|accepted| accepted.is_empty()) =>
            {
                Some("a blank has no accepted answers")
            }
            _ => None,
        };
        if let Some(message) = problem {
            warnings.push(QuizWarning::question(&record.id, message));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::GradingType;

    const VALID_TOML: &str = r#"
[quiz]
id = "capitals"
name = "World Capitals"
description = "Match countries and their capitals"

[grading]
grading_type = "letter"
pass_threshold = 70

[[questions]]
id = "q1"
question = "What is the capital of France?"
type = "multiple_choice"
points = 2

[questions.config]
options = ["Paris", "Rome", "Madrid"]

[questions.answer]
correctIndex = 0

[[questions]]
id = "q2"
question = "The Seine flows through {{blank}}."
type = "fill_blank"

[questions.config]
template = "The Seine flows through {{blank}}."

[questions.answer.blanks]
blank_0 = ["Paris"]
"#;

    #[test]
    fn parse_valid_toml() {
        let quiz = parse_quiz_str(VALID_TOML, Path::new("capitals.toml")).unwrap();
        assert_eq!(quiz.id, "capitals");
        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.questions[0].points, 2.0);
        assert_eq!(quiz.questions[1].points, 1.0);
        let grading = quiz.grading.unwrap();
        assert_eq!(grading.grading_type, GradingType::Letter);
        assert_eq!(grading.pass_threshold, 70.0);
        assert!(grading.partial_credit_enabled);
    }

    #[test]
    fn parse_json_by_extension() {
        let json = r#"{
            "id": "legacy",
            "name": "Legacy",
            "questions": [{"id": "q1", "options": ["a", "b"], "correctAnswer": 1}]
        }"#;
        let quiz = parse_quiz_str(json, Path::new("legacy.json")).unwrap();
        assert!(quiz.questions[0].is_legacy());
        assert!(quiz.grading.is_none());
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_quiz_str(bad, Path::new("bad.toml")).is_err());
    }

    #[test]
    fn validate_flags_authoring_mistakes() {
        let toml = r#"
[quiz]
id = "broken"
name = "Broken"

[[questions]]
id = "same"
type = "essay"

[[questions]]
id = "same"
type = "text_input"
points = 0
"#;
        let quiz = parse_quiz_str(toml, Path::new("broken.toml")).unwrap();
        let warnings = validate_quiz(&quiz);
        let messages: Vec<_> = warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("duplicate")));
        assert!(messages.iter().any(|m| m.contains("unknown question type: essay")));
        assert!(messages.iter().any(|m| m.contains("0 points")));
        assert!(messages.iter().any(|m| m.contains("no accepted answers")));
    }

    #[test]
    fn valid_quiz_has_no_warnings() {
        let quiz = parse_quiz_str(VALID_TOML, Path::new("capitals.toml")).unwrap();
        assert!(validate_quiz(&quiz).is_empty());
    }

    #[test]
    fn load_attempts_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("alice.json"),
            r#"{"participant": "alice", "answers": {"q1": 0}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("batch.json"),
            r#"[{"id": "b1", "answers": {}}, {"answers": {"q1": 1}}]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ nope").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let attempts = load_attempts(dir.path()).unwrap();
        let ids: Vec<_> = attempts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "b1", "attempt-3"]);
        assert_eq!(attempts[0].participant.as_deref(), Some("alice"));
    }

    #[test]
    fn load_attempts_single_file_errors_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attempts.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load_attempts(&path).is_err());
    }
}
