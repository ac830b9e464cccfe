//! Batch grading engine.
//!
//! Grades many attempts of one quiz with bounded parallelism. The quiz is
//! resolved once and shared read-only across workers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::grading::{grade_questions, round2};
use crate::model::{Attempt, Quiz};
use crate::normalize::resolve_records;
use crate::report::{AttemptResult, GradingReport, QuizSummary};
use crate::results::GradingOptions;
use crate::statistics::{compute_question_statistics, compute_statistics};

/// Configuration for the grading engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum attempts graded at once.
    pub parallelism: usize,
    /// Policy applied to every attempt.
    pub grading: GradingOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            grading: GradingOptions::default(),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_attempt_start(&self, attempt_id: &str);
    fn on_attempt_complete(&self, result: &AttemptResult);
    fn on_attempt_error(&self, attempt_id: &str, error: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_attempt_start(&self, _: &str) {}
    fn on_attempt_complete(&self, _: &AttemptResult) {}
    fn on_attempt_error(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// The batch grading engine.
pub struct GradingEngine {
    config: EngineConfig,
}

impl GradingEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Grade every attempt of `quiz`.
    ///
    /// Fails up front if any question has an unknown type. Results come back
    /// in input order; an attempt whose worker dies is reported and skipped.
    pub async fn grade_attempts(
        &self,
        quiz: &Quiz,
        attempts: Vec<Attempt>,
        progress: &dyn ProgressReporter,
    ) -> Result<GradingReport> {
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let questions = Arc::new(
            resolve_records(&quiz.questions)
                .with_context(|| format!("failed to resolve quiz '{}'", quiz.id))?,
        );
        let options = Arc::new(self.config.grading.clone());
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        tracing::info!(
            "grading {} attempts of quiz '{}' ({} questions)",
            attempts.len(),
            quiz.id,
            questions.len()
        );

        let mut futures = FuturesUnordered::new();

        for (index, attempt) in attempts.into_iter().enumerate() {
            let questions = Arc::clone(&questions);
            let options = Arc::clone(&options);
            let semaphore = Arc::clone(&semaphore);

            futures.push(async move {
                let attempt_id = attempt.id.clone();
                let inner = async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    progress.on_attempt_start(&attempt.id);

                    let graded = tokio::task::spawn_blocking(move || {
                        for id in attempt.answers.keys() {
                            if !questions.iter().any(|q| &q.id == id) {
                                tracing::warn!(
                                    "attempt '{}' answers unknown question '{id}'",
                                    attempt.id
                                );
                            }
                        }
                        let result = grade_questions(&questions, &attempt.answers, &options);
                        AttemptResult {
                            attempt_id: attempt.id,
                            participant: attempt.participant,
                            submitted_at: attempt.submitted_at,
                            result,
                        }
                    })
                    .await
                    .context("grading task failed")?;

                    Ok::<_, anyhow::Error>(graded)
                };
                (index, attempt_id, inner.await)
            });
        }

        let mut results = Vec::new();
        let mut completed = 0usize;
        let mut failed = 0usize;
        let total = futures.len();

        while let Some((index, attempt_id, result)) = futures.next().await {
            match result {
                Ok(attempt_result) => {
                    progress.on_attempt_complete(&attempt_result);
                    results.push((index, attempt_result));
                    completed += 1;
                }
                Err(e) => {
                    tracing::error!("grading failed for attempt {attempt_id}: {e:#}");
                    progress.on_attempt_error(&attempt_id, &e.to_string());
                    failed += 1;
                }
            }
        }

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, completed, failed, elapsed);

        results.sort_by_key(|(index, _)| *index);
        let attempts: Vec<AttemptResult> = results.into_iter().map(|(_, r)| r).collect();
        let grade_results: Vec<_> = attempts.iter().map(|a| a.result.clone()).collect();
        let points_possible = round2(questions.iter().map(|q| q.points).sum());

        Ok(GradingReport {
            id: run_id,
            created_at: chrono::Utc::now(),
            quiz: QuizSummary::new(quiz, points_possible),
            grading: self.config.grading.clone(),
            statistics: compute_statistics(&grade_results),
            question_statistics: compute_question_statistics(&grade_results),
            attempts,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use indexmap::IndexMap;
    use serde_json::{json, Value};

    #[derive(Default)]
    struct CountingReporter {
        started: AtomicUsize,
        completed: Mutex<Vec<String>>,
        batch: Mutex<Option<(usize, usize, usize)>>,
    }

    impl ProgressReporter for CountingReporter {
        fn on_attempt_start(&self, _: &str) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_attempt_complete(&self, result: &AttemptResult) {
            self.completed.lock().unwrap().push(result.attempt_id.clone());
        }
        fn on_attempt_error(&self, _: &str, _: &str) {}
        fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, _: Duration) {
            *self.batch.lock().unwrap() = Some((total, completed, failed));
        }
    }

    fn quiz() -> Quiz {
        serde_json::from_value(json!({
            "id": "geo",
            "name": "Geography",
            "questions": [
                {"id": "q1", "type": "mcq", "config": {"options": ["Paris", "Rome"]}, "answer": {"correctIndex": 0}},
                {"id": "q2", "type": "true_false", "answer": {"correctValue": false}, "points": 3}
            ]
        }))
        .unwrap()
    }

    fn attempt(id: &str, q1: Value, q2: Value) -> Attempt {
        let mut answers = IndexMap::new();
        answers.insert("q1".to_string(), q1);
        answers.insert("q2".to_string(), q2);
        Attempt {
            id: id.to_string(),
            participant: None,
            submitted_at: None,
            answers,
        }
    }

    #[tokio::test]
    async fn grades_in_input_order() {
        let engine = GradingEngine::new(EngineConfig {
            parallelism: 2,
            ..EngineConfig::default()
        });
        let attempts: Vec<Attempt> = (0..10)
            .map(|i| {
                let q1 = json!(i % 2);
                attempt(&format!("a{i}"), q1, json!(false))
            })
            .collect();
        let reporter = CountingReporter::default();

        let report = engine.grade_attempts(&quiz(), attempts, &reporter).await.unwrap();

        let ids: Vec<_> = report.attempts.iter().map(|a| a.attempt_id.as_str()).collect();
        let expected: Vec<String> = (0..10).map(|i| format!("a{i}")).collect();
        assert_eq!(ids, expected);
        assert_eq!(report.attempts[0].result.score, 100.0);
        assert_eq!(report.attempts[1].result.score, 75.0);
        assert_eq!(report.quiz.points_possible, 4.0);
        assert_eq!(report.statistics.average_score, 87.5);
        assert_eq!(report.question_statistics.len(), 2);

        assert_eq!(reporter.started.load(Ordering::SeqCst), 10);
        assert_eq!(reporter.completed.lock().unwrap().len(), 10);
        assert_eq!(*reporter.batch.lock().unwrap(), Some((10, 10, 0)));
    }

    #[tokio::test]
    async fn unknown_question_type_fails_before_grading() {
        let mut quiz = quiz();
        quiz.questions[1].question_type = "essay".into();
        let reporter = CountingReporter::default();
        let err = GradingEngine::new(EngineConfig::default())
            .grade_attempts(&quiz, vec![attempt("a", json!(0), json!(true))], &reporter)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("unknown question type: essay"));
        assert_eq!(reporter.started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_batch_yields_zero_statistics() {
        let report = GradingEngine::new(EngineConfig::default())
            .grade_attempts(&quiz(), Vec::new(), &NoopReporter)
            .await
            .unwrap();
        assert!(report.attempts.is_empty());
        assert_eq!(report.statistics.average_score, 0.0);
    }
}
