// src/handlers/stats.rs

use axum::{extract::State, response::IntoResponse, Extension, Json};

use crate::{
    error::AppError, models::stats::UserStatsResponse, state::AppState, utils::jwt::Claims,
};

/// Quiz history and aggregated statistics for the current user.
pub async fn get_user_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let history = state.stats.quiz_history(user_id).await?;
    let stats = state.stats.user_stats(user_id).await?;

    Ok(Json(UserStatsResponse { history, stats }))
}
