// src/models/catalog.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'certification_types' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CertificationType {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// One row of the question-set catalog listing, joined with its
/// certification type and question count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuestionSetSummary {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub certification: String,
    pub is_challenge_mode: bool,
    pub question_count: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A fully loaded question set with its questions and answers.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionSetDetail {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub certification_type_id: i64,
    pub is_challenge_mode: bool,
    pub questions: Vec<QuestionDetail>,
}

/// Represents the 'questions' table with its answers attached.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    pub id: i64,
    pub question_set_id: i64,
    pub question_text: String,
    pub explanation: Option<String>,
    pub external_id: Option<String>,
    pub answers: Vec<Answer>,
}

/// Represents the 'answers' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub answer_text: String,
    pub is_correct: bool,
    pub external_id: Option<String>,
}

/// Presentation view of a question set, as served to quiz takers.
/// Question order follows the requested presentation order and answer
/// order is freshly randomized; correctness flags are not exposed.
#[derive(Debug, Serialize)]
pub struct QuestionSetView {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_challenge_mode: bool,
    pub questions: Vec<QuestionView>,
}

/// A question as presented to the client (answer correctness hidden).
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: i64,
    pub question_text: String,
    pub explanation: Option<String>,
    pub answers: Vec<AnswerView>,
}

#[derive(Debug, Serialize)]
pub struct AnswerView {
    pub id: i64,
    pub answer_text: String,
}

/// Payload for inserting a new question set with nested questions.
/// Used by the importer and by the catalog curator when materializing
/// derived sets.
#[derive(Debug, Clone)]
pub struct NewQuestionSet {
    pub title: String,
    pub description: Option<String>,
    pub certification_type_id: i64,
    pub is_challenge_mode: bool,
    pub json_source: Option<String>,
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question_text: String,
    pub explanation: Option<String>,
    pub external_id: Option<String>,
    pub answers: Vec<NewAnswer>,
}

#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub answer_text: String,
    pub is_correct: bool,
    pub external_id: Option<String>,
}
