// src/store/mod.rs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::{
    attempt::{NewAttempt, NewSubmission, QuizAttempt, SubmissionTotals},
    catalog::{CertificationType, NewQuestionSet, QuestionDetail, QuestionSetDetail, QuestionSetSummary},
    stats::FinishedAttempt,
    user::User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store-layer error. Expected "row does not exist" conditions are
/// represented as `Option` in the trait signatures instead; this enum only
/// carries uniqueness conflicts and infrastructure failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(db_err.message().to_string());
            }
        }
        StoreError::Unavailable(err.to_string())
    }
}

/// Repository interface over the relational store.
///
/// Every mutating attempt operation is atomic on its own (a single
/// transaction or guarded statement), so the engine's read-modify-write
/// sequences stay consistent under the single-writer-per-attempt
/// assumption, and concurrent submissions to different attempts never
/// block each other.
#[async_trait]
pub trait QuizStore: Send + Sync {
    // --- users ---

    /// Inserts a new user. `Conflict` on duplicate email or username.
    async fn insert_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError>;

    /// Looks a user up by email or username.
    async fn find_user_by_identifier(&self, identifier: &str)
        -> Result<Option<User>, StoreError>;

    // --- certification types ---

    /// Gets or creates a certification type by name.
    async fn ensure_certification_type(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<CertificationType, StoreError>;

    // --- question sets ---

    async fn list_question_sets(&self) -> Result<Vec<QuestionSetSummary>, StoreError>;

    async fn find_question_set_id_by_title(&self, title: &str)
        -> Result<Option<i64>, StoreError>;

    /// Loads a set with all questions and answers, in stored order.
    async fn load_question_set(&self, set_id: i64)
        -> Result<Option<QuestionSetDetail>, StoreError>;

    /// Inserts a set with its nested questions and answers in one
    /// transaction.
    async fn insert_question_set(
        &self,
        new: NewQuestionSet,
    ) -> Result<QuestionSetDetail, StoreError>;

    // --- questions ---

    /// Loads a single question with its answers.
    async fn load_question(&self, question_id: i64)
        -> Result<Option<QuestionDetail>, StoreError>;

    // --- attempts ---

    async fn insert_attempt(&self, new: NewAttempt) -> Result<QuizAttempt, StoreError>;

    async fn load_attempt(&self, attempt_id: i64) -> Result<Option<QuizAttempt>, StoreError>;

    /// Appends one submission record, bumps the running correct counter
    /// when the submission is correct, and returns the submission totals
    /// for the attempt including the new record.
    async fn append_submission(
        &self,
        rec: NewSubmission,
    ) -> Result<SubmissionTotals, StoreError>;

    /// Counts the submissions recorded for an attempt.
    async fn count_submissions(&self, attempt_id: i64)
        -> Result<SubmissionTotals, StoreError>;

    /// Challenge-failure transition: marks the attempt failed with zero
    /// score, recomputing `correct_answers` from the submission log.
    /// A no-op returning the stored row when the attempt is already
    /// terminal; `None` when the attempt does not exist.
    async fn fail_attempt(&self, attempt_id: i64) -> Result<Option<QuizAttempt>, StoreError>;

    /// Completion transition with the given final score and derived
    /// correct count. Same terminal/no-op contract as `fail_attempt`.
    async fn complete_attempt(
        &self,
        attempt_id: i64,
        score: f64,
        correct_answers: i32,
    ) -> Result<Option<QuizAttempt>, StoreError>;

    // --- history / stats ---

    /// Terminal attempts for a user, newest first, joined with set title
    /// and certification and the per-attempt submission count.
    async fn list_finished_attempts(
        &self,
        user_id: i64,
    ) -> Result<Vec<FinishedAttempt>, StoreError>;
}
