// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::models::{
    content::Content,
    question::{CreateQuestionRequest, PublicQuestion},
};

/// Passing threshold used when a teacher does not set one.
pub const DEFAULT_PASSING_SCORE: i32 = 40;

/// Represents the 'quizzes' table in the database.
/// One-to-one satellite of a `contents` row with type 'quiz'.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub content_id: i64,
    pub time_limit_minutes: Option<i32>,

    /// Minimum percentage (0-100) required to pass.
    pub passing_score: i32,

    /// Sum of the point values of all questions.
    pub total_points: i32,

    pub created_at: DateTime<Utc>,
}

/// Insert payload handed to the store alongside its parent content.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub time_limit_minutes: Option<i32>,
    pub passing_score: i32,
}

/// Quiz block nested in a content creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(range(min = 1, max = 600))]
    pub time_limit_minutes: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub passing_score: Option<i32>,
    #[validate(nested)]
    #[serde(default)]
    pub questions: Vec<CreateQuestionRequest>,
}

impl CreateQuizRequest {
    pub fn to_new_quiz(&self) -> NewQuiz {
        NewQuiz {
            time_limit_minutes: self.time_limit_minutes,
            passing_score: self.passing_score.unwrap_or(DEFAULT_PASSING_SCORE),
        }
    }
}

/// Student-facing view of a quiz: wrapper content plus questions without answer keys.
#[derive(Debug, Serialize)]
pub struct QuizView {
    pub quiz: Quiz,
    pub content: Content,
    pub questions: Vec<PublicQuestion>,
}
