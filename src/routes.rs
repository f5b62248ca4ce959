// src/routes.rs

use axum::{
    http::Method,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{attempts, auth, question_sets, stats},
    state::AppState,
    utils::jwt::{auth_middleware, optional_auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, question sets, quiz attempts, stats).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store, quiz components, config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let question_set_routes = Router::new()
        .route("/", get(question_sets::list_question_sets))
        .route("/{id}", get(question_sets::get_question_set))
        .route("/{id}/shuffled", post(question_sets::create_shuffled_variant))
        .route("/{id}/challenge", post(question_sets::create_challenge_variant));

    let attempt_routes = Router::new()
        .route(
            "/",
            post(attempts::create_attempt)
                // Anonymous attempts allowed; claims injected when present.
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    optional_auth_middleware,
                )),
        )
        .route("/{id}", get(attempts::get_attempt))
        .route("/{id}/answers", post(attempts::submit_answer))
        .route("/{id}/complete", post(attempts::complete_attempt));

    let user_routes = Router::new()
        .route("/stats", get(stats::get_user_stats))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/question-sets", question_set_routes)
        .nest("/api/quiz/attempts", attempt_routes)
        .nest("/api/user", user_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
