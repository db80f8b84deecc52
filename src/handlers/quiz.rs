// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::{ensure_can_edit, ensure_visible},
    models::{
        content::Content,
        question::{CreateQuestionRequest, PublicQuestion},
        quiz::{Quiz, QuizView},
    },
    quiz::{
        QuizRef,
        lookup::{IdKind, resolve_quiz},
    },
    state::SharedStore,
    store::Store,
    utils::jwt::Claims,
};

/// `?by=quiz|content|auto` selects how the `{id}` path segment is read.
#[derive(Debug, Default, Deserialize)]
pub struct LookupParams {
    #[serde(default)]
    pub by: IdKind,
}

/// Resolves the path id to a quiz and loads its wrapper content.
pub(crate) async fn load_quiz(
    store: &dyn Store,
    id: i64,
    params: &LookupParams,
) -> Result<(Quiz, Content), AppError> {
    let quiz = resolve_quiz(store, QuizRef::new(id, params.by)).await?;

    let content = store
        .find_content(quiz.content_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok((quiz, content))
}

/// Returns a quiz with its questions, answer keys stripped.
/// The id may be the quiz's own id or its content id.
pub async fn get_quiz(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Query(params): Query<LookupParams>,
) -> Result<impl IntoResponse, AppError> {
    let (quiz, content) = load_quiz(&*store, id, &params).await?;
    ensure_visible(&claims, &content)?;

    let questions = store
        .list_questions(quiz.id)
        .await?
        .iter()
        .map(PublicQuestion::from)
        .collect();

    Ok(Json(QuizView {
        quiz,
        content,
        questions,
    }))
}

/// Appends a question to a quiz. Author or admin.
pub async fn add_question(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Query(params): Query<LookupParams>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (quiz, content) = load_quiz(&*store, id, &params).await?;
    ensure_can_edit(&claims, &content)?;

    let next_order = store
        .list_questions(quiz.id)
        .await?
        .iter()
        .map(|q| q.display_order)
        .max()
        .unwrap_or(0)
        + 1;

    let question = store
        .add_question(quiz.id, payload.into_new_question(next_order))
        .await
        .map_err(|e| {
            tracing::error!("Failed to add question: {}", e);
            AppError::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Lists every student's attempts at a quiz. Author or admin.
pub async fn list_quiz_attempts(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Query(params): Query<LookupParams>,
) -> Result<impl IntoResponse, AppError> {
    let (quiz, content) = load_quiz(&*store, id, &params).await?;
    ensure_can_edit(&claims, &content)?;

    let attempts = store.list_quiz_attempts(quiz.id).await?;

    Ok(Json(attempts))
}
