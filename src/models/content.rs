// src/models/content.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use url::Url;
use validator::Validate;

use crate::models::quiz::CreateQuizRequest;

/// Represents the 'contents' table in the database.
/// Generic learning material; a quiz is a satellite of a row with type 'quiz'.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Content {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,

    /// Mapped from the database column 'type' since `type` is a reserved keyword in Rust.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub content_type: String,

    pub class_id: i64,
    pub subject_id: i64,
    pub author_id: i64,
    pub due_date: Option<DateTime<Utc>>,

    /// 'draft', 'published' or 'archived'.
    pub status: String,

    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Content {
    pub fn is_quiz(&self) -> bool {
        self.content_type == ContentType::Quiz.as_str()
    }

    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Published.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Note,
    Homework,
    Dpp,
    Quiz,
    Lecture,
    SamplePaper,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Note => "note",
            ContentType::Homework => "homework",
            ContentType::Dpp => "dpp",
            ContentType::Quiz => "quiz",
            ContentType::Lecture => "lecture",
            ContentType::SamplePaper => "sample_paper",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }
}

/// Insert payload handed to the store.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub title: String,
    pub description: Option<String>,
    pub content_type: ContentType,
    pub class_id: i64,
    pub subject_id: i64,
    pub author_id: i64,
    pub due_date: Option<DateTime<Utc>>,
    pub status: ContentStatus,
    pub attachment_url: Option<String>,
}

/// Partial update handed to the store. `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct ContentUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<ContentStatus>,
    pub attachment_url: Option<String>,
}

impl ContentUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
            && self.attachment_url.is_none()
    }
}

/// Query parameters for listing content.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentFilter {
    pub class_id: Option<i64>,
    pub subject_id: Option<i64>,
    #[serde(rename = "type")]
    pub content_type: Option<ContentType>,
    pub status: Option<ContentStatus>,
}

impl ContentFilter {
    pub fn matches(&self, content: &Content) -> bool {
        self.class_id.is_none_or(|id| content.class_id == id)
            && self.subject_id.is_none_or(|id| content.subject_id == id)
            && self
                .content_type
                .is_none_or(|t| content.content_type == t.as_str())
            && self.status.is_none_or(|s| content.status == s.as_str())
    }
}

/// DTO for creating content. A `quiz` block is required when `type` is 'quiz'.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateContentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub class_id: i64,
    pub subject_id: i64,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<ContentStatus>,
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub attachment_url: Option<String>,
    #[validate(nested)]
    pub quiz: Option<CreateQuizRequest>,
}

/// DTO for updating content. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateContentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<ContentStatus>,
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub attachment_url: Option<String>,
}

/// Validates that a string is a correctly formatted URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}
