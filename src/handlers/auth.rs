// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{LoginRequest, RegisterRequest, UserData},
    state::AppState,
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with a signed token; 409 when the email or
/// username is already taken.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;

    let user = state
        .store
        .insert_user(&payload.email, &payload.username, &hashed_password)
        .await?;

    let token = sign_jwt(
        user.id,
        &user.username,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "token": token,
            "type": "Bearer",
            "user": UserData::from(&user),
        })),
    ))
}

/// Authenticates a user and returns a JWT token.
///
/// The identifier matches either email or username; the response does
/// not reveal which part of the credentials was wrong.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = state
        .store
        .find_user_by_identifier(&payload.identifier)
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid credentials".to_string()))?;

    let is_valid = verify_password(&payload.password, &user.password)?;
    if !is_valid {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.username,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": UserData::from(&user),
    })))
}
