// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    handlers::{
        ensure_visible,
        quiz::{LookupParams, load_quiz},
    },
    models::attempt::SubmitAnswersRequest,
    quiz::{QuizRef, attempt},
    state::SharedStore,
    utils::jwt::Claims,
};

/// Starts the student's attempt at a quiz, or resumes the open one.
/// Fails with 409 once the quiz has been completed.
pub async fn begin_attempt(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Query(params): Query<LookupParams>,
) -> Result<impl IntoResponse, AppError> {
    let (quiz, content) = load_quiz(&*store, id, &params).await?;
    ensure_visible(&claims, &content)?;

    let attempt = attempt::begin(&*store, claims.user_id()?, QuizRef::Quiz(quiz.id)).await?;

    Ok(Json(attempt))
}

/// Saves in-progress answers. The submitted set replaces the stored one.
pub async fn save_progress(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let attempt =
        attempt::save_progress(&*store, attempt_id, claims.user_id()?, &payload.answers).await?;

    Ok(Json(attempt))
}

/// Submits final answers and returns the graded attempt.
pub async fn complete_attempt(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result =
        attempt::complete(&*store, attempt_id, claims.user_id()?, &payload.answers).await?;

    Ok(Json(result))
}

/// The current student's attempts, newest first.
pub async fn list_my_attempts(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = store.list_student_attempts(claims.user_id()?).await?;

    Ok(Json(attempts))
}
