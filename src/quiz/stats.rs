// src/quiz/stats.rs

//! Historical statistics derived from terminal quiz attempts.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    error::AppError,
    models::stats::{FinishedAttempt, StatsBucket, UserStats},
    store::QuizStore,
};

/// Aggregates per-user statistics from completed attempts.
#[derive(Clone)]
pub struct StatsAggregator {
    store: Arc<dyn QuizStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self { store }
    }

    /// Terminal attempts for the user, newest first.
    pub async fn quiz_history(&self, user_id: i64) -> Result<Vec<FinishedAttempt>, AppError> {
        Ok(self.store.list_finished_attempts(user_id).await?)
    }

    /// Overall and per-certification stats over the user's terminal
    /// attempts. Recomputed from the full set on each query.
    pub async fn user_stats(&self, user_id: i64) -> Result<UserStats, AppError> {
        let attempts = self.store.list_finished_attempts(user_id).await?;
        Ok(aggregate(&attempts))
    }
}

#[derive(Default)]
struct Accumulator {
    count: i64,
    sum: f64,
    best: f64,
}

impl Accumulator {
    fn push(&mut self, score: f64) {
        self.count += 1;
        self.sum += score;
        if score > self.best {
            self.best = score;
        }
    }

    fn into_bucket(self) -> StatsBucket {
        if self.count == 0 {
            return StatsBucket::default();
        }
        StatsBucket {
            total_attempts: self.count,
            avg_score: self.sum / self.count as f64,
            best_score: self.best,
        }
    }
}

/// Groups terminal attempts by certification and computes
/// `{total_attempts, avg_score, best_score}` per group plus an overall
/// bucket. The mean is a true mean over the full set, not a running
/// average.
pub fn aggregate(attempts: &[FinishedAttempt]) -> UserStats {
    let mut overall = Accumulator::default();
    let mut per_certification: BTreeMap<String, Accumulator> = BTreeMap::new();

    for attempt in attempts {
        overall.push(attempt.score);
        per_certification
            .entry(attempt.certification.clone())
            .or_default()
            .push(attempt.score);
    }

    UserStats {
        overall: overall.into_bucket(),
        certifications: per_certification
            .into_iter()
            .map(|(name, acc)| (name, acc.into_bucket()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(certification: &str, score: f64) -> FinishedAttempt {
        FinishedAttempt {
            id: 0,
            question_set_id: 1,
            set_title: "Set".to_string(),
            certification: certification.to_string(),
            score,
            total_questions: 10,
            correct_answers: (score / 10.0) as i32,
            is_challenge_mode: false,
            failed: false,
            started_at: None,
            completed_at: Some(chrono::Utc::now()),
            answered: 10,
        }
    }

    #[test]
    fn aggregates_one_certification() {
        let attempts = vec![finished("X", 80.0), finished("X", 60.0), finished("X", 100.0)];
        let stats = aggregate(&attempts);

        let bucket = &stats.certifications["X"];
        assert_eq!(bucket.total_attempts, 3);
        assert_eq!(bucket.avg_score, 80.0);
        assert_eq!(bucket.best_score, 100.0);

        assert_eq!(stats.overall.total_attempts, 3);
        assert_eq!(stats.overall.avg_score, 80.0);
        assert_eq!(stats.overall.best_score, 100.0);
    }

    #[test]
    fn groups_by_certification() {
        let attempts = vec![finished("X", 50.0), finished("Y", 90.0), finished("X", 70.0)];
        let stats = aggregate(&attempts);

        assert_eq!(stats.certifications.len(), 2);
        assert_eq!(stats.certifications["X"].total_attempts, 2);
        assert_eq!(stats.certifications["X"].avg_score, 60.0);
        assert_eq!(stats.certifications["Y"].best_score, 90.0);
        assert_eq!(stats.overall.total_attempts, 3);
        assert_eq!(stats.overall.avg_score, 70.0);
    }

    #[test]
    fn no_attempts_yields_zeroed_buckets() {
        let stats = aggregate(&[]);
        assert_eq!(stats.overall, StatsBucket::default());
        assert_eq!(stats.overall.best_score, 0.0);
        assert!(stats.certifications.is_empty());
    }

    #[test]
    fn failed_attempts_count_with_their_zero_score() {
        let mut failed_attempt = finished("X", 0.0);
        failed_attempt.failed = true;
        let attempts = vec![failed_attempt, finished("X", 100.0)];
        let stats = aggregate(&attempts);

        assert_eq!(stats.overall.total_attempts, 2);
        assert_eq!(stats.overall.avg_score, 50.0);
        assert_eq!(stats.overall.best_score, 100.0);
    }
}
