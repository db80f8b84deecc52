// src/handlers/content.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::{ensure_can_edit, ensure_visible},
    models::{
        content::{
            ContentFilter, ContentStatus, ContentType, ContentUpdate, CreateContentRequest,
            NewContent, UpdateContentRequest,
        },
        user::Role,
    },
    state::SharedStore,
    utils::{
        html::{clean_html, clean_optional},
        jwt::Claims,
    },
};

/// Lists content, optionally filtered by class, subject, type and status.
/// Students only ever see published items.
pub async fn list_contents(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Query(mut filter): Query<ContentFilter>,
) -> Result<impl IntoResponse, AppError> {
    if claims.role() == Some(Role::Student) {
        filter.status = Some(ContentStatus::Published);
    }

    let contents = store.list_contents(&filter).await?;

    Ok(Json(contents))
}

/// Fetches one content record.
pub async fn get_content(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let content = store
        .find_content(id)
        .await?
        .ok_or(AppError::NotFound("Content not found".to_string()))?;

    ensure_visible(&claims, &content)?;

    Ok(Json(content))
}

/// Creates content. Quiz content is created together with its quiz and questions.
/// Teacher or admin.
pub async fn create_content(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let is_quiz = payload.content_type == ContentType::Quiz;
    if is_quiz != payload.quiz.is_some() {
        return Err(AppError::BadRequest(
            "A quiz block is required for, and only allowed on, content of type 'quiz'".to_string(),
        ));
    }

    let new_content = NewContent {
        title: payload.title.trim().to_string(),
        description: clean_optional(payload.description),
        content_type: payload.content_type,
        class_id: payload.class_id,
        subject_id: payload.subject_id,
        author_id: claims.user_id()?,
        due_date: payload.due_date,
        status: payload.status.unwrap_or(ContentStatus::Draft),
        attachment_url: payload.attachment_url,
    };

    let body = match payload.quiz {
        Some(quiz_req) => {
            let new_quiz = quiz_req.to_new_quiz();
            let questions = quiz_req
                .questions
                .into_iter()
                .enumerate()
                .map(|(i, q)| q.into_new_question(i as i32 + 1))
                .collect();

            let (content, quiz) = store
                .create_quiz_content(new_content, new_quiz, questions)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create quiz content: {}", e);
                    AppError::from(e)
                })?;

            tracing::info!(content_id = content.id, quiz_id = quiz.id, "Quiz created");
            serde_json::json!({ "content": content, "quiz": quiz })
        }
        None => {
            let content = store.create_content(new_content).await.map_err(|e| {
                tracing::error!("Failed to create content: {}", e);
                AppError::from(e)
            })?;

            tracing::info!(content_id = content.id, "Content created");
            serde_json::json!({ "content": content })
        }
    };

    Ok((StatusCode::CREATED, Json(body)))
}

/// Updates content fields. Author or admin.
pub async fn update_content(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let existing = store
        .find_content(id)
        .await?
        .ok_or(AppError::NotFound("Content not found".to_string()))?;

    ensure_can_edit(&claims, &existing)?;

    let update = ContentUpdate {
        title: payload.title.map(|t| t.trim().to_string()),
        description: payload.description.map(|d| clean_html(&d)),
        due_date: payload.due_date,
        status: payload.status,
        attachment_url: payload.attachment_url,
    };

    if update.is_empty() {
        return Ok(Json(existing));
    }

    let updated = store
        .update_content(id, update)
        .await?
        .ok_or(AppError::NotFound("Content not found".to_string()))?;

    Ok(Json(updated))
}

/// Deletes content together with any quiz, questions and attempts hanging off it.
/// Author or admin.
pub async fn delete_content(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let existing = store
        .find_content(id)
        .await?
        .ok_or(AppError::NotFound("Content not found".to_string()))?;

    ensure_can_edit(&claims, &existing)?;

    if !store.delete_content(id).await? {
        return Err(AppError::NotFound("Content not found".to_string()));
    }

    tracing::info!(content_id = id, "Content deleted");

    Ok(StatusCode::NO_CONTENT)
}
