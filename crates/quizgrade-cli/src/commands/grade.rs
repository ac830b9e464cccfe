//! The `quizgrade grade` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use quizgrade_core::config::load_config_from;
use quizgrade_core::engine::{EngineConfig, GradingEngine, ProgressReporter};
use quizgrade_core::grading::format_grade_display;
use quizgrade_core::parser;
use quizgrade_core::report::{AttemptResult, GradingReport};
use quizgrade_core::results::GradingType;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_attempt_start(&self, attempt_id: &str) {
        eprintln!("  Grading: {attempt_id}");
    }

    fn on_attempt_complete(&self, result: &AttemptResult) {
        let verdict = match result.result.passed {
            Some(true) => "PASS",
            Some(false) => "FAIL",
            None => "-",
        };
        eprintln!(
            "  Done: {} {:.1}% [{}]",
            result.attempt_id, result.result.score, verdict
        );
    }

    fn on_attempt_error(&self, attempt_id: &str, error: &str) {
        eprintln!("  ERROR: {attempt_id}: {error}");
    }

    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} graded, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    quiz_path: PathBuf,
    attempts_path: PathBuf,
    output: Option<PathBuf>,
    parallelism: Option<usize>,
    config_path: Option<PathBuf>,
    grading_type: Option<String>,
    pass_threshold: Option<f64>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let quiz = parser::parse_quiz(&quiz_path)?;
    let attempts = parser::load_attempts(&attempts_path)?;

    let mut grading = config.grading_for(quiz.grading.as_ref());
    if let Some(t) = &grading_type {
        grading.grading_type = t.parse::<GradingType>().map_err(anyhow::Error::msg)?;
    }
    if let Some(threshold) = pass_threshold {
        anyhow::ensure!(
            (0.0..=100.0).contains(&threshold),
            "pass threshold must be between 0 and 100"
        );
        grading.pass_threshold = threshold;
    }
    tracing::debug!("grading policy: {grading:?}");

    eprintln!(
        "quizgrade v{} - Grading {} attempts of '{}' ({} questions, {})",
        env!("CARGO_PKG_VERSION"),
        attempts.len(),
        quiz.name,
        quiz.questions.len(),
        grading.grading_type
    );
    eprintln!();

    let engine = GradingEngine::new(EngineConfig {
        parallelism,
        grading,
    });
    let report = engine.grade_attempts(&quiz, attempts, &ConsoleReporter).await?;

    print_summary(&report, config.show_point_values);

    let output = output.unwrap_or(config.output_dir);
    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let path = output.join(format!("report-{timestamp}.json"));
    report.save_json(&path)?;
    eprintln!("Results saved to: {}", path.display());

    Ok(())
}

fn print_summary(report: &GradingReport, show_point_values: bool) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Attempt", "Participant", "Score", "Points", "Grade", "Result"]);

    for attempt in &report.attempts {
        let result = &attempt.result;
        let verdict = match result.passed {
            Some(true) => "Pass",
            Some(false) => "Fail",
            None => "-",
        };
        table.add_row(vec![
            Cell::new(&attempt.attempt_id),
            Cell::new(attempt.participant.as_deref().unwrap_or("-")),
            Cell::new(format!("{:.1}%", result.score)),
            Cell::new(format!("{} / {}", result.points_earned, result.points_possible)),
            Cell::new(format_grade_display(
                result,
                report.grading.grading_type,
                show_point_values,
            )),
            Cell::new(verdict),
        ]);
    }

    eprintln!("\n{table}");

    let stats = &report.statistics;
    eprintln!(
        "Average {:.1}% | Median {:.1}% | High {:.1}% | Low {:.1}% | Pass rate {:.1}%",
        stats.average_score,
        stats.median_score,
        stats.highest_score,
        stats.lowest_score,
        stats.pass_rate
    );
}
