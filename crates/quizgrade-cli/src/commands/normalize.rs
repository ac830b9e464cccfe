//! The `quizgrade normalize` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use quizgrade_core::normalize::{normalize_step_record, resolve_records, StepRecord};
use quizgrade_core::parser;

pub fn execute(quiz_path: Option<PathBuf>, steps_path: Option<PathBuf>) -> Result<()> {
    match (quiz_path, steps_path) {
        (Some(quiz), _) => normalize_quiz(&quiz),
        (None, Some(steps)) => normalize_steps(&steps),
        (None, None) => anyhow::bail!("either --quiz or --steps is required"),
    }
}

fn normalize_quiz(path: &Path) -> Result<()> {
    let mut quiz = parser::parse_quiz(path)?;
    let questions = resolve_records(&quiz.questions)
        .with_context(|| format!("failed to resolve quiz '{}'", quiz.id))?;
    quiz.questions = questions.iter().map(|q| q.to_record()).collect();

    println!("{}", serde_json::to_string_pretty(&quiz)?);
    Ok(())
}

fn normalize_steps(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read steps file: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse JSON: {}", path.display()))?;

    let output = if value.is_array() {
        let steps: Vec<StepRecord> = serde_json::from_value(value)
            .with_context(|| format!("invalid step list: {}", path.display()))?;
        let normalized: Vec<StepRecord> = steps.iter().map(normalize_step_record).collect();
        serde_json::to_string_pretty(&normalized)?
    } else {
        let step: StepRecord = serde_json::from_value(value)
            .with_context(|| format!("invalid step: {}", path.display()))?;
        serde_json::to_string_pretty(&normalize_step_record(&step))?
    };

    println!("{output}");
    Ok(())
}
