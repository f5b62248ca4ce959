// src/handlers/attempts.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};

use crate::{
    error::AppError,
    models::attempt::{CreateAttemptRequest, SubmitAnswerRequest},
    state::AppState,
    utils::jwt::OptionalUser,
};

/// Creates a new quiz attempt. Anonymous attempts are allowed; a valid
/// bearer token links the attempt to the user.
pub async fn create_attempt(
    State(state): State<AppState>,
    Extension(OptionalUser(claims)): Extension<OptionalUser>,
    Json(payload): Json<CreateAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.map(|c| c.user_id());

    let attempt = state
        .engine
        .create_attempt(
            payload.question_set_id,
            user_id,
            payload.shuffle_questions,
            payload.is_challenge_mode,
            payload.max_mistakes,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Fetches an attempt with its submission count.
pub async fn get_attempt(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = state.engine.get_attempt(id).await?;
    Ok(Json(attempt))
}

/// Submits one answer to an in-progress attempt.
///
/// Returns `{is_correct, attempt_failed}`; `attempt_failed` signals the
/// client to halt a challenge quiz.
pub async fn submit_answer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .engine
        .submit_answer(id, payload.question_id, payload.answer_id, payload.time_spent)
        .await?;

    Ok(Json(outcome))
}

/// Completes an attempt and returns the terminal record. Idempotent on
/// already-terminal attempts.
pub async fn complete_attempt(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = state.engine.complete_attempt(id).await?;
    Ok(Json(attempt))
}
