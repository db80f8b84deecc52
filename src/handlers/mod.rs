// src/handlers/mod.rs

use axum::{Json, response::IntoResponse};

use crate::{error::AppError, models::content::Content, utils::jwt::Claims};

pub mod admin;
pub mod attempt;
pub mod auth;
pub mod content;
pub mod quiz;

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Content may be changed by its author or by an admin.
pub(crate) fn ensure_can_edit(claims: &Claims, content: &Content) -> Result<(), AppError> {
    if claims.is_admin() || claims.user_id()? == content.author_id {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "Only the author or an admin may modify this content".to_string(),
    ))
}

/// Students only see published material; staff see everything.
pub(crate) fn ensure_visible(claims: &Claims, content: &Content) -> Result<(), AppError> {
    let is_staff = claims.role().is_some_and(|r| r.is_staff());
    if is_staff || content.is_published() {
        return Ok(());
    }
    Err(AppError::NotFound("Content not found".to_string()))
}
