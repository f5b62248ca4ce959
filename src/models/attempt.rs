// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'quiz_attempts' table in the database.
///
/// An attempt is in progress until `completed_at` is set; after that it is
/// terminal (completed or failed) and accepts no further submissions.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub question_set_id: i64,

    /// Anonymous attempts carry no user reference.
    pub user_id: Option<i64>,

    /// Percentage score. Meaningful only once the attempt is terminal.
    pub score: f64,

    /// Question count snapshot taken at creation time.
    pub total_questions: i32,

    /// Running counter; the completion path derives the authoritative
    /// value from the question_attempts log instead.
    pub correct_answers: i32,

    pub is_challenge_mode: bool,
    pub max_mistakes: i32,
    pub failed: bool,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl QuizAttempt {
    /// A terminal attempt has been completed or failed and is read-only.
    pub fn is_terminal(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Represents the 'question_attempts' table: one append-only record per
/// answer submission, with correctness copied from the answer at
/// submission time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionAttempt {
    pub id: i64,
    pub quiz_attempt_id: i64,
    pub question_id: i64,
    pub answer_id: i64,
    pub is_correct: bool,
    pub time_spent: Option<i32>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Payload for creating a new quiz attempt row.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub question_set_id: i64,
    pub user_id: Option<i64>,
    pub total_questions: i32,
    pub is_challenge_mode: bool,
    pub max_mistakes: i32,
}

/// Payload for appending a submission record.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub quiz_attempt_id: i64,
    pub question_id: i64,
    pub answer_id: i64,
    pub is_correct: bool,
    pub time_spent: Option<i32>,
}

/// Submission counts for one attempt, derived from the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmissionTotals {
    pub total: i64,
    pub correct: i64,
    pub incorrect: i64,
}

/// Result of a single answer submission, returned to the caller.
#[derive(Debug, Serialize)]
pub struct SubmissionOutcome {
    pub is_correct: bool,
    pub attempt_failed: bool,
}

/// DTO for creating a quiz attempt.
///
/// The challenge flag defaults to the question set's own flag and the
/// mistake budget defaults to 5 when not supplied.
#[derive(Debug, Deserialize)]
pub struct CreateAttemptRequest {
    pub question_set_id: i64,
    #[serde(default)]
    pub shuffle_questions: bool,
    pub is_challenge_mode: Option<bool>,
    pub max_mistakes: Option<i32>,
}

/// DTO for submitting an answer to an in-progress attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: i64,
    pub answer_id: i64,
    pub time_spent: Option<i32>,
}

/// Attempt read-back DTO: the row plus how many submissions it has.
#[derive(Debug, Serialize)]
pub struct AttemptWithProgress {
    #[serde(flatten)]
    pub attempt: QuizAttempt,
    pub answered: i64,
}
