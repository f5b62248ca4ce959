// src/handlers/question_sets.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{error::AppError, models::catalog::QuestionSetDetail, state::AppState};

/// Lists all question sets with certification and question counts,
/// newest first.
pub async fn list_question_sets(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let sets = state.store.list_question_sets().await?;
    Ok(Json(sets))
}

#[derive(Debug, Deserialize)]
pub struct PresentationParams {
    #[serde(default)]
    pub shuffle: bool,
}

/// Serves a question set in presentation order. Answer order is always
/// randomized; question order only when `?shuffle=true`.
pub async fn get_question_set(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<PresentationParams>,
) -> Result<impl IntoResponse, AppError> {
    let view = state
        .bank
        .get_presentation_set(id, params.shuffle)
        .await?
        .ok_or_else(|| AppError::NotFound("Question set not found".to_string()))?;

    Ok(Json(view))
}

/// Materializes (or reuses) the shuffled variant of a question set.
pub async fn create_shuffled_variant(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let variant = state.curator.create_shuffled_variant(id).await?;
    Ok((StatusCode::CREATED, Json(variant_summary(&variant))))
}

#[derive(Debug, Deserialize, Default)]
pub struct ChallengeParams {
    #[serde(default)]
    pub shuffle: bool,
}

/// Materializes (or reuses) the challenge-mode variant of a question set.
pub async fn create_challenge_variant(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(params): Json<ChallengeParams>,
) -> Result<impl IntoResponse, AppError> {
    let variant = state
        .curator
        .create_challenge_variant(id, params.shuffle)
        .await?;
    Ok((StatusCode::CREATED, Json(variant_summary(&variant))))
}

// Correctness flags stay server-side; variants are summarized rather
// than echoed back with their answers.
fn variant_summary(variant: &QuestionSetDetail) -> serde_json::Value {
    json!({
        "id": variant.id,
        "title": variant.title,
        "description": variant.description,
        "is_challenge_mode": variant.is_challenge_mode,
        "question_count": variant.questions.len(),
    })
}
