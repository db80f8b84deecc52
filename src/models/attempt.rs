// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{FromRow, types::Json};

use crate::quiz::normalize::AnswerMap;

/// Represents the 'quiz_attempts' table in the database.
/// One student's engagement with one quiz.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub quiz_id: i64,
    pub student_id: i64,
    pub started_at: DateTime<Utc>,

    /// `None` while the attempt is in progress.
    pub completed_at: Option<DateTime<Utc>>,

    /// Points earned; set on completion.
    pub score: Option<i32>,

    /// Question id -> selected 1-based option id.
    pub answers: Json<AnswerMap>,
}

impl QuizAttempt {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// DTO for saving progress or completing an attempt.
///
/// Answers arrive in whatever shape the client produced; they are
/// normalized before being stored.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    #[serde(default)]
    pub answers: Map<String, Value>,
}

/// Result of completing an attempt.
#[derive(Debug, Serialize)]
pub struct CompletedAttempt {
    pub attempt: QuizAttempt,
    pub total_possible_score: i32,
    pub percentage: f64,
    pub passed: bool,
    pub correct_count: usize,
    /// Questions graded against a fallback key because none was flagged.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fabricated_keys: Vec<i64>,
}

/// Query parameters for the administrative reset.
#[derive(Debug, Deserialize)]
pub struct ResetAttemptsParams {
    pub student_id: i64,
    pub quiz_id: i64,
}
