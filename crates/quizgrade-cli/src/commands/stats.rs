//! The `quizgrade stats` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizgrade_core::report::GradingReport;

pub fn execute(report_path: PathBuf) -> Result<()> {
    let report = GradingReport::load_json(&report_path)?;
    let stats = &report.statistics;

    println!(
        "Quiz: {} ({} attempts, graded as {})",
        report.quiz.name,
        report.attempts.len(),
        report.grading.grading_type
    );
    println!("  Average: {:.2}%", stats.average_score);
    println!("  Median: {:.2}%", stats.median_score);
    println!("  Highest: {:.2}%", stats.highest_score);
    println!("  Lowest: {:.2}%", stats.lowest_score);
    println!("  Std dev: {:.2}", stats.standard_deviation);
    println!("  Pass rate: {:.2}%", stats.pass_rate);

    if !stats.grade_distribution.is_empty() {
        println!("\nGrades:");
        for (grade, count) in &stats.grade_distribution {
            println!("  {grade}: {count}");
        }
    }

    println!("\nScore distribution:");
    for bucket in &stats.score_distribution {
        println!("  {:>6}: {}", bucket.range, bucket.count);
    }

    if !report.question_statistics.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Question", "Type", "Attempts", "Correct", "Avg credit"]);
        for q in &report.question_statistics {
            table.add_row(vec![
                Cell::new(&q.question_id),
                Cell::new(q.question_type),
                Cell::new(q.attempts),
                Cell::new(q.correct),
                Cell::new(format!("{:.1}%", q.average_credit)),
            ]);
        }
        println!("\n{table}");
    }

    Ok(())
}
