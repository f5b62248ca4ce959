// src/quiz/engine.rs

//! Quiz-attempt lifecycle: creation, answer submission, challenge-mode
//! failure and completion scoring.
//!
//! An attempt is `InProgress` until its terminal transition (completion
//! or challenge failure) sets `completed_at`; terminal attempts reject
//! further submissions and completion is an idempotent no-op on them.

use std::sync::Arc;

use crate::{
    error::AppError,
    models::attempt::{
        AttemptWithProgress, NewAttempt, NewSubmission, QuizAttempt, SubmissionOutcome,
    },
    store::QuizStore,
};

use super::QuestionBank;

pub const DEFAULT_MAX_MISTAKES: i32 = 5;

/// Owns the quiz-attempt state machine.
#[derive(Clone)]
pub struct AttemptEngine {
    store: Arc<dyn QuizStore>,
    bank: QuestionBank,
}

/// Final score as a percentage. A zero-question attempt scores zero
/// rather than dividing by zero.
pub fn completion_score(correct: i64, total_questions: i32) -> f64 {
    if total_questions <= 0 {
        return 0.0;
    }
    (correct as f64 / total_questions as f64) * 100.0
}

impl AttemptEngine {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        let bank = QuestionBank::new(store.clone());
        Self { store, bank }
    }

    /// Creates a new attempt against a question set.
    ///
    /// `total_questions` is snapshotted from the presentation set at this
    /// moment; later changes to the underlying set do not affect it. The
    /// challenge flag defaults to the set's own flag when not supplied.
    pub async fn create_attempt(
        &self,
        question_set_id: i64,
        user_id: Option<i64>,
        shuffle_questions: bool,
        is_challenge_mode: Option<bool>,
        max_mistakes: Option<i32>,
    ) -> Result<QuizAttempt, AppError> {
        let view = self
            .bank
            .get_presentation_set(question_set_id, shuffle_questions)
            .await?
            .ok_or_else(|| AppError::NotFound("Question set not found".to_string()))?;

        let max_mistakes = max_mistakes.unwrap_or(DEFAULT_MAX_MISTAKES);
        if max_mistakes < 1 {
            return Err(AppError::BadRequest(
                "max_mistakes must be at least 1".to_string(),
            ));
        }

        let attempt = self
            .store
            .insert_attempt(NewAttempt {
                question_set_id,
                user_id,
                total_questions: view.questions.len() as i32,
                is_challenge_mode: is_challenge_mode.unwrap_or(view.is_challenge_mode),
                max_mistakes,
            })
            .await?;

        Ok(attempt)
    }

    /// Records one answer submission against an in-progress attempt.
    ///
    /// Correctness is copied from the chosen answer at this instant and
    /// never recomputed. In challenge mode, the incorrect submission that
    /// brings the attempt to `max_mistakes` total mistakes fails it
    /// immediately (inclusive threshold) with a forced zero score.
    pub async fn submit_answer(
        &self,
        attempt_id: i64,
        question_id: i64,
        answer_id: i64,
        time_spent: Option<i32>,
    ) -> Result<SubmissionOutcome, AppError> {
        let attempt = self
            .store
            .load_attempt(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz attempt not found".to_string()))?;

        if attempt.is_terminal() {
            return Err(AppError::InvalidState(
                "Quiz attempt is already finished".to_string(),
            ));
        }

        let question = self
            .store
            .load_question(question_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

        let answer = question
            .answers
            .iter()
            .find(|a| a.id == answer_id)
            .ok_or_else(|| {
                AppError::NotFound("Answer does not belong to the question".to_string())
            })?;

        let is_correct = answer.is_correct;

        let totals = self
            .store
            .append_submission(NewSubmission {
                quiz_attempt_id: attempt_id,
                question_id,
                answer_id,
                is_correct,
                time_spent,
            })
            .await?;

        let mut attempt_failed = false;
        if !is_correct
            && attempt.is_challenge_mode
            && totals.incorrect >= i64::from(attempt.max_mistakes)
        {
            self.store
                .fail_attempt(attempt_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Quiz attempt not found".to_string()))?;
            tracing::info!(
                attempt_id,
                mistakes = totals.incorrect,
                "challenge attempt failed: mistake budget exhausted"
            );
            attempt_failed = true;
        }

        Ok(SubmissionOutcome {
            is_correct,
            attempt_failed,
        })
    }

    /// Completes an in-progress attempt and computes its final score.
    ///
    /// The correct count is derived from the submission log, not the
    /// running counter. Calling this on a terminal attempt returns the
    /// stored record unchanged.
    pub async fn complete_attempt(&self, attempt_id: i64) -> Result<QuizAttempt, AppError> {
        let attempt = self
            .store
            .load_attempt(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz attempt not found".to_string()))?;

        if attempt.is_terminal() {
            return Ok(attempt);
        }

        let totals = self.store.count_submissions(attempt_id).await?;
        let score = completion_score(totals.correct, attempt.total_questions);

        let completed = self
            .store
            .complete_attempt(attempt_id, score, totals.correct as i32)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz attempt not found".to_string()))?;

        Ok(completed)
    }

    /// Reads an attempt back with its submission count.
    pub async fn get_attempt(&self, attempt_id: i64) -> Result<AttemptWithProgress, AppError> {
        let attempt = self
            .store
            .load_attempt(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz attempt not found".to_string()))?;

        let totals = self.store.count_submissions(attempt_id).await?;

        Ok(AttemptWithProgress {
            attempt,
            answered: totals.total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::{NewAnswer, NewQuestion, NewQuestionSet, QuestionSetDetail};
    use crate::store::{MemoryStore, QuizStore};

    /// Seeds a set where every question has one correct answer followed
    /// by one incorrect answer.
    async fn seed_set(store: &MemoryStore, questions: usize, challenge: bool) -> QuestionSetDetail {
        let cert = store
            .ensure_certification_type("CERT-X", None)
            .await
            .unwrap();
        store
            .insert_question_set(NewQuestionSet {
                title: "Practice".to_string(),
                description: None,
                certification_type_id: cert.id,
                is_challenge_mode: challenge,
                json_source: None,
                questions: (0..questions)
                    .map(|i| NewQuestion {
                        question_text: format!("q{i}"),
                        explanation: None,
                        external_id: None,
                        answers: vec![
                            NewAnswer {
                                answer_text: "right".to_string(),
                                is_correct: true,
                                external_id: None,
                            },
                            NewAnswer {
                                answer_text: "wrong".to_string(),
                                is_correct: false,
                                external_id: None,
                            },
                        ],
                    })
                    .collect(),
            })
            .await
            .unwrap()
    }

    fn engine(store: &Arc<MemoryStore>) -> AttemptEngine {
        AttemptEngine::new(store.clone() as Arc<dyn QuizStore>)
    }

    fn answer_ids(set: &QuestionSetDetail, index: usize) -> (i64, i64, i64) {
        let q = &set.questions[index];
        let correct = q.answers.iter().find(|a| a.is_correct).unwrap().id;
        let wrong = q.answers.iter().find(|a| !a.is_correct).unwrap().id;
        (q.id, correct, wrong)
    }

    #[test]
    fn score_is_percentage_of_total() {
        assert_eq!(completion_score(7, 10), 70.0);
        assert_eq!(completion_score(0, 10), 0.0);
        assert_eq!(completion_score(3, 3), 100.0);
    }

    #[test]
    fn zero_question_attempt_scores_zero() {
        assert_eq!(completion_score(0, 0), 0.0);
    }

    #[tokio::test]
    async fn create_attempt_snapshots_question_count() {
        let store = Arc::new(MemoryStore::new());
        let set = seed_set(&store, 10, false).await;
        let engine = engine(&store);

        let attempt = engine
            .create_attempt(set.id, None, false, None, None)
            .await
            .unwrap();

        assert_eq!(attempt.total_questions, 10);
        assert_eq!(attempt.correct_answers, 0);
        assert_eq!(attempt.score, 0.0);
        assert!(!attempt.failed);
        assert!(attempt.completed_at.is_none());
        assert_eq!(attempt.max_mistakes, DEFAULT_MAX_MISTAKES);
    }

    #[tokio::test]
    async fn create_attempt_unknown_set_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);

        let err = engine
            .create_attempt(999, None, false, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn challenge_flag_defaults_to_the_sets_flag() {
        let store = Arc::new(MemoryStore::new());
        let set = seed_set(&store, 3, true).await;
        let engine = engine(&store);

        let attempt = engine
            .create_attempt(set.id, None, false, None, None)
            .await
            .unwrap();
        assert!(attempt.is_challenge_mode);
    }

    #[tokio::test]
    async fn completion_scores_from_submission_log() {
        let store = Arc::new(MemoryStore::new());
        let set = seed_set(&store, 10, false).await;
        let engine = engine(&store);
        let attempt = engine
            .create_attempt(set.id, None, false, None, None)
            .await
            .unwrap();

        for i in 0..7 {
            let (qid, correct, _) = answer_ids(&set, i);
            let outcome = engine
                .submit_answer(attempt.id, qid, correct, Some(5))
                .await
                .unwrap();
            assert!(outcome.is_correct);
            assert!(!outcome.attempt_failed);
        }
        for i in 7..10 {
            let (qid, _, wrong) = answer_ids(&set, i);
            let outcome = engine
                .submit_answer(attempt.id, qid, wrong, None)
                .await
                .unwrap();
            assert!(!outcome.is_correct);
        }

        let completed = engine.complete_attempt(attempt.id).await.unwrap();
        assert_eq!(completed.score, 70.0);
        assert_eq!(completed.correct_answers, 7);
        assert!(!completed.failed);
        assert!(completed.completed_at.is_some());
    }

    #[tokio::test]
    async fn completion_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let set = seed_set(&store, 2, false).await;
        let engine = engine(&store);
        let attempt = engine
            .create_attempt(set.id, None, false, None, None)
            .await
            .unwrap();

        let (qid, correct, _) = answer_ids(&set, 0);
        engine
            .submit_answer(attempt.id, qid, correct, None)
            .await
            .unwrap();

        let first = engine.complete_attempt(attempt.id).await.unwrap();
        let second = engine.complete_attempt(attempt.id).await.unwrap();
        assert_eq!(first.score, second.score);
        assert_eq!(first.completed_at, second.completed_at);
    }

    #[tokio::test]
    async fn degenerate_empty_set_completes_with_zero_score() {
        let store = Arc::new(MemoryStore::new());
        let set = seed_set(&store, 0, false).await;
        let engine = engine(&store);
        let attempt = engine
            .create_attempt(set.id, None, false, None, None)
            .await
            .unwrap();

        let completed = engine.complete_attempt(attempt.id).await.unwrap();
        assert_eq!(completed.total_questions, 0);
        assert_eq!(completed.score, 0.0);
    }

    #[tokio::test]
    async fn challenge_fails_on_the_mistake_that_reaches_the_budget() {
        let store = Arc::new(MemoryStore::new());
        let set = seed_set(&store, 10, true).await;
        let engine = engine(&store);
        let attempt = engine
            .create_attempt(set.id, None, false, Some(true), Some(5))
            .await
            .unwrap();

        // A correct answer in between must not count toward the budget.
        let (qid, correct, _) = answer_ids(&set, 9);
        engine
            .submit_answer(attempt.id, qid, correct, None)
            .await
            .unwrap();

        for i in 0..4 {
            let (qid, _, wrong) = answer_ids(&set, i);
            let outcome = engine
                .submit_answer(attempt.id, qid, wrong, None)
                .await
                .unwrap();
            assert!(!outcome.attempt_failed, "mistake {} should not fail", i + 1);

            let current = store.load_attempt(attempt.id).await.unwrap().unwrap();
            assert!(current.completed_at.is_none());
        }

        let (qid, _, wrong) = answer_ids(&set, 4);
        let outcome = engine
            .submit_answer(attempt.id, qid, wrong, None)
            .await
            .unwrap();
        assert!(outcome.attempt_failed);

        let failed = store.load_attempt(attempt.id).await.unwrap().unwrap();
        assert!(failed.failed);
        assert_eq!(failed.score, 0.0);
        assert!(failed.completed_at.is_some());
        // Correct count preserved from the log despite the zero score.
        assert_eq!(failed.correct_answers, 1);
    }

    #[tokio::test]
    async fn mistakes_do_not_fail_non_challenge_attempts() {
        let store = Arc::new(MemoryStore::new());
        let set = seed_set(&store, 10, false).await;
        let engine = engine(&store);
        let attempt = engine
            .create_attempt(set.id, None, false, None, Some(1))
            .await
            .unwrap();

        for i in 0..6 {
            let (qid, _, wrong) = answer_ids(&set, i);
            let outcome = engine
                .submit_answer(attempt.id, qid, wrong, None)
                .await
                .unwrap();
            assert!(!outcome.attempt_failed);
        }
    }

    #[tokio::test]
    async fn terminal_attempt_rejects_submissions() {
        let store = Arc::new(MemoryStore::new());
        let set = seed_set(&store, 2, false).await;
        let engine = engine(&store);
        let attempt = engine
            .create_attempt(set.id, None, false, None, None)
            .await
            .unwrap();

        engine.complete_attempt(attempt.id).await.unwrap();

        let (qid, correct, _) = answer_ids(&set, 0);
        let err = engine
            .submit_answer(attempt.id, qid, correct, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn failed_challenge_attempt_keeps_zero_score_on_complete() {
        let store = Arc::new(MemoryStore::new());
        let set = seed_set(&store, 4, true).await;
        let engine = engine(&store);
        let attempt = engine
            .create_attempt(set.id, None, false, Some(true), Some(1))
            .await
            .unwrap();

        let (qid, correct, _) = answer_ids(&set, 0);
        engine
            .submit_answer(attempt.id, qid, correct, None)
            .await
            .unwrap();
        let (qid, _, wrong) = answer_ids(&set, 1);
        let outcome = engine
            .submit_answer(attempt.id, qid, wrong, None)
            .await
            .unwrap();
        assert!(outcome.attempt_failed);

        // A later complete call must not resurrect a score.
        let after = engine.complete_attempt(attempt.id).await.unwrap();
        assert!(after.failed);
        assert_eq!(after.score, 0.0);
        assert_eq!(after.correct_answers, 1);
    }

    #[tokio::test]
    async fn submitting_a_foreign_answer_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let set = seed_set(&store, 2, false).await;
        let engine = engine(&store);
        let attempt = engine
            .create_attempt(set.id, None, false, None, None)
            .await
            .unwrap();

        let (qid, _, _) = answer_ids(&set, 0);
        let (_, other_answer, _) = answer_ids(&set, 1);
        let err = engine
            .submit_answer(attempt.id, qid, other_answer, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
