//! The `quizgrade check` command.

use std::path::PathBuf;

use anyhow::Result;

use quizgrade_core::normalize::normalize_record;
use quizgrade_core::parser;

pub fn execute(quiz_path: PathBuf) -> Result<()> {
    let quiz = parser::parse_quiz(&quiz_path)?;

    println!("Quiz: {} ({} questions)", quiz.name, quiz.questions.len());

    let mut total_points = 0.0;
    for record in &quiz.questions {
        match normalize_record(record) {
            Ok(question) => {
                let legacy = if question.legacy { " (legacy)" } else { "" };
                println!(
                    "  {}: {}{} - {} pt(s)",
                    question.id,
                    question.slug(),
                    legacy,
                    question.points
                );
                total_points += question.points;
            }
            Err(_) => println!("  {}: {} - unresolved", record.id, record.question_type),
        }
    }
    println!("Total points: {total_points}");

    let warnings = parser::validate_quiz(&quiz);
    for w in &warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Quiz is valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
