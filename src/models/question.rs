// src/models/question.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::quiz::options::PublicOption;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,

    /// The text content of the question.
    pub question_text: String,

    /// Option list. Usually an array of `{text, isCorrect}` objects, but legacy rows
    /// hold a JSON-encoded string and use several flag encodings; see `quiz::options`.
    pub options: Json<Value>,

    /// Points awarded for a correct answer.
    pub points: i32,

    pub display_order: i32,
}

/// DTO for sending a question to a student (no correctness flags).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub options: Vec<PublicOption>,
    pub points: i32,
    pub display_order: i32,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        PublicQuestion {
            id: q.id,
            question_text: q.question_text.clone(),
            options: crate::quiz::options::public_options(&q.options),
            points: q.points,
            display_order: q.display_order,
        }
    }
}

/// One answer choice as submitted by a teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionInput {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 5000))]
    pub question_text: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<OptionInput>,
    #[validate(range(min = 0, max = 1000))]
    pub points: Option<i32>,
    pub display_order: Option<i32>,
}

/// Insert payload handed to the store.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question_text: String,
    pub options: Value,
    pub points: i32,
    pub display_order: i32,
}

impl CreateQuestionRequest {
    /// Builds the store payload; `fallback_order` is used when no explicit order was given.
    pub fn into_new_question(self, fallback_order: i32) -> NewQuestion {
        let options = Value::Array(
            self.options
                .into_iter()
                .map(|o| serde_json::json!({ "text": o.text, "isCorrect": o.is_correct }))
                .collect(),
        );

        NewQuestion {
            question_text: crate::utils::html::clean_html(&self.question_text),
            options,
            points: self.points.unwrap_or(1),
            display_order: self.display_order.unwrap_or(fallback_order),
        }
    }
}

/// New questions must carry exactly one correct option, so fresh data never
/// needs the answer-key fallbacks that legacy rows rely on.
fn validate_options(options: &[OptionInput]) -> Result<(), validator::ValidationError> {
    if options.len() < 2 {
        return Err(validator::ValidationError::new("at_least_two_options"));
    }
    for opt in options {
        if opt.text.trim().is_empty() || opt.text.len() > 500 {
            return Err(validator::ValidationError::new("invalid_option_text"));
        }
    }
    if options.iter().filter(|o| o.is_correct).count() != 1 {
        return Err(validator::ValidationError::new("exactly_one_correct_option"));
    }
    Ok(())
}
