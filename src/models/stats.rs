// src/models/stats.rs

use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::FromRow;

/// Aggregated stats for one group of attempts (one certification, or
/// everything for the overall bucket).
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct StatsBucket {
    pub total_attempts: i64,
    pub avg_score: f64,
    pub best_score: f64,
}

/// Per-user statistics over terminal attempts.
#[derive(Debug, Serialize)]
pub struct UserStats {
    pub overall: StatsBucket,
    pub certifications: BTreeMap<String, StatsBucket>,
}

/// One terminal attempt joined with its question set and certification,
/// as read for history and stats.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FinishedAttempt {
    pub id: i64,
    pub question_set_id: i64,
    pub set_title: String,
    pub certification: String,
    pub score: f64,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub is_challenge_mode: bool,
    pub failed: bool,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub answered: i64,
}

/// Response body for the user stats endpoint: quiz history plus
/// aggregated statistics, mirroring what the profile page consumes.
#[derive(Debug, Serialize)]
pub struct UserStatsResponse {
    pub history: Vec<FinishedAttempt>,
    pub stats: UserStats,
}
