// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::ResetAttemptsParams,
        user::{AdminCreateUserRequest, AdminUpdateUserRequest},
    },
    quiz::{QuizRef, attempt},
    state::SharedStore,
    store::StoreError,
    utils::{hash::hash_password, jwt::Claims},
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(store): State<SharedStore>) -> Result<impl IntoResponse, AppError> {
    let users = store.list_users().await.map_err(|e| {
        tracing::error!("Failed to list users: {}", e);
        AppError::from(e)
    })?;

    Ok(Json(users))
}

/// Creates a new user with specific role.
/// Admin only.
pub async fn create_user(
    State(store): State<SharedStore>,
    Json(payload): Json<AdminCreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;

    let user = store
        .create_user(&payload.username, &hashed_password, payload.role)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => {
                AppError::Conflict(format!("Username '{}' already exists", payload.username))
            }
            other => {
                tracing::error!("Failed to create user: {}", other);
                AppError::from(other)
            }
        })?;

    tracing::info!(user_id = user.id, role = %payload.role, "User created by admin");

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": user.id}))))
}

/// Changes a user's role and/or password.
/// Admin only.
pub async fn update_user(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if payload.role.is_none() && payload.password.is_none() {
        return Ok(StatusCode::OK);
    }

    let hashed = payload.password.as_deref().map(hash_password).transpose()?;

    let updated = store
        .update_user(id, payload.role, hashed.as_deref())
        .await?;

    if !updated {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a user by ID.
/// Admin only. Prevents deleting self, and users whose content or attempts remain.
pub async fn delete_user(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.user_id()? {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let deleted = store.delete_user(id).await.map_err(|e| match e {
        StoreError::Conflict(_) => AppError::Conflict(
            "User still authors content or has quiz attempts".to_string(),
        ),
        other => {
            tracing::error!("Failed to delete user: {}", other);
            AppError::from(other)
        }
    })?;

    if !deleted {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Clears a student's attempts at a quiz so it can be retaken.
/// Admin only; this is outside the normal attempt lifecycle.
pub async fn reset_attempts(
    State(store): State<SharedStore>,
    Query(params): Query<ResetAttemptsParams>,
) -> Result<impl IntoResponse, AppError> {
    let removed = attempt::reset(&*store, params.student_id, QuizRef::Quiz(params.quiz_id)).await?;

    Ok(Json(serde_json::json!({ "removed": removed })))
}
