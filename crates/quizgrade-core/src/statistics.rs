//! Descriptive statistics across graded attempts.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::grading::round2;
use crate::model::QuestionTypeSlug;
use crate::results::GradeResult;

/// Count of scores falling in one ten-point band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBucket {
    /// Band label, e.g. `70-79` or `90-100`.
    pub range: String,
    pub count: usize,
}

/// Aggregate view of a set of attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStatistics {
    pub average_score: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    pub median_score: f64,
    /// Population standard deviation.
    pub standard_deviation: f64,
    /// Percentage of attempts with a verdict that passed.
    pub pass_rate: f64,
    pub grade_distribution: BTreeMap<String, usize>,
    pub score_distribution: Vec<ScoreBucket>,
}

impl Default for QuizStatistics {
    fn default() -> Self {
        Self {
            average_score: 0.0,
            highest_score: 0.0,
            lowest_score: 0.0,
            median_score: 0.0,
            standard_deviation: 0.0,
            pass_rate: 0.0,
            grade_distribution: BTreeMap::new(),
            score_distribution: empty_buckets(),
        }
    }
}

fn bucket_label(index: usize) -> String {
    let low = index * 10;
    if index == 9 {
        format!("{low}-100")
    } else {
        format!("{low}-{}", low + 9)
    }
}

fn empty_buckets() -> Vec<ScoreBucket> {
    (0..10)
        .map(|index| ScoreBucket {
            range: bucket_label(index),
            count: 0,
        })
        .collect()
}

fn bucket_index(score: f64) -> usize {
    ((score.max(0.0) / 10.0).floor() as usize).min(9)
}

/// Summarize `results`. Empty input yields all zeros.
pub fn compute_statistics(results: &[GradeResult]) -> QuizStatistics {
    if results.is_empty() {
        return QuizStatistics::default();
    }

    let mut scores: Vec<f64> = results.iter().map(|r| r.score).collect();
    scores.sort_by(f64::total_cmp);

    let n = scores.len() as f64;
    let average = scores.iter().sum::<f64>() / n;
    let mid = scores.len() / 2;
    let median = if scores.len() % 2 == 0 {
        (scores[mid - 1] + scores[mid]) / 2.0
    } else {
        scores[mid]
    };
    let variance = scores.iter().map(|s| (s - average).powi(2)).sum::<f64>() / n;

    let judged: Vec<bool> = results.iter().filter_map(|r| r.passed).collect();
    let pass_rate = if judged.is_empty() {
        0.0
    } else {
        judged.iter().filter(|&&passed| passed).count() as f64 / judged.len() as f64 * 100.0
    };

    let mut grade_distribution = BTreeMap::new();
    for grade in results.iter().filter_map(|r| r.grade.as_ref()) {
        *grade_distribution.entry(grade.clone()).or_insert(0) += 1;
    }

    let mut score_distribution = empty_buckets();
    for score in &scores {
        score_distribution[bucket_index(*score)].count += 1;
    }

    QuizStatistics {
        average_score: round2(average),
        highest_score: round2(scores[scores.len() - 1]),
        lowest_score: round2(scores[0]),
        median_score: round2(median),
        standard_deviation: round2(variance.sqrt()),
        pass_rate: round2(pass_rate),
        grade_distribution,
        score_distribution,
    }
}

/// How one question fared across attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStatistics {
    pub question_id: String,
    pub question_type: QuestionTypeSlug,
    pub attempts: usize,
    pub correct: usize,
    /// Mean credit percent, 2 decimals.
    pub average_credit: f64,
}

/// Per-question breakdown, in the order questions are first seen.
pub fn compute_question_statistics(results: &[GradeResult]) -> Vec<QuestionStatistics> {
    let mut totals: IndexMap<&str, (QuestionTypeSlug, usize, usize, f64)> = IndexMap::new();
    for question in results.iter().flat_map(|r| &r.question_results) {
        let entry = totals
            .entry(question.question_id.as_str())
            .or_insert((question.question_type, 0, 0, 0.0));
        entry.1 += 1;
        if question.is_correct {
            entry.2 += 1;
        }
        entry.3 += question.credit_percent;
    }

    totals
        .into_iter()
        .map(|(id, (question_type, attempts, correct, credit))| QuestionStatistics {
            question_id: id.to_string(),
            question_type,
            attempts,
            correct,
            average_credit: round2(credit / attempts as f64),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::QuestionResult;
    use serde_json::Value;

    fn result(score: f64, grade: Option<&str>, passed: Option<bool>) -> GradeResult {
        GradeResult {
            score,
            points_earned: score,
            points_possible: 100.0,
            grade: grade.map(str::to_string),
            passed,
            question_results: Vec::new(),
        }
    }

    #[test]
    fn empty_input_is_all_zero() {
        let stats = compute_statistics(&[]);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.pass_rate, 0.0);
        assert!(stats.grade_distribution.is_empty());
        assert_eq!(stats.score_distribution.len(), 10);
        assert!(stats.score_distribution.iter().all(|b| b.count == 0));
    }

    #[test]
    fn single_passing_result() {
        let stats = compute_statistics(&[result(100.0, Some("A+"), Some(true))]);
        assert_eq!(stats.pass_rate, 100.0);
        assert_eq!(stats.median_score, 100.0);
        assert_eq!(stats.standard_deviation, 0.0);
        assert_eq!(stats.score_distribution[9].count, 1);
        assert_eq!(stats.score_distribution[9].range, "90-100");
    }

    #[test]
    fn descriptive_values() {
        let stats = compute_statistics(&[
            result(90.0, Some("A-"), Some(true)),
            result(70.0, Some("C-"), Some(true)),
            result(50.0, Some("F"), Some(false)),
            result(60.0, Some("D-"), None),
        ]);
        assert_eq!(stats.average_score, 67.5);
        assert_eq!(stats.median_score, 65.0);
        assert_eq!(stats.highest_score, 90.0);
        assert_eq!(stats.lowest_score, 50.0);
        // Population stddev of 50, 60, 70, 90 is sqrt(218.75).
        assert_eq!(stats.standard_deviation, 14.79);
        // The null verdict counts toward neither side.
        assert_eq!(stats.pass_rate, 66.67);
        let grades: Vec<_> = stats.grade_distribution.keys().map(String::as_str).collect();
        assert_eq!(grades, vec!["A-", "C-", "D-", "F"]);
        assert_eq!(stats.score_distribution[5].count, 1);
        assert_eq!(stats.score_distribution[5].range, "50-59");
    }

    #[test]
    fn per_question_in_first_seen_order() {
        let question = |id: &str, correct: bool, credit: f64| QuestionResult {
            question_id: id.into(),
            question_type: QuestionTypeSlug::TrueFalse,
            is_correct: correct,
            points_earned: credit / 100.0,
            points_possible: 1.0,
            credit_percent: credit,
            user_answer: None,
            correct_answer: Value::Null,
            feedback: None,
        };
        let mut first = result(50.0, None, None);
        first.question_results = vec![question("b", true, 100.0), question("a", false, 0.0)];
        let mut second = result(50.0, None, None);
        second.question_results = vec![question("a", false, 50.0), question("b", false, 0.0)];

        let stats = compute_question_statistics(&[first, second]);
        assert_eq!(stats[0].question_id, "b");
        assert_eq!(stats[0].correct, 1);
        assert_eq!(stats[0].average_credit, 50.0);
        assert_eq!(stats[1].question_id, "a");
        assert_eq!(stats[1].attempts, 2);
        assert_eq!(stats[1].average_credit, 25.0);
    }
}
