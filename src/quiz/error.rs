// src/quiz/error.rs

use std::fmt;

use crate::store::StoreError;

/// Failures of the attempt lifecycle.
///
/// Malformed option lists never show up here: the option resolver absorbs
/// them so grading stays deterministic.
#[derive(Debug)]
pub enum QuizError {
    /// The named record does not exist, or the caller does not own it.
    NotFound(&'static str),
    /// The student already finished this quiz.
    AlreadyCompleted,
    Store(StoreError),
}

impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizError::NotFound(what) => write!(f, "{} not found", what),
            QuizError::AlreadyCompleted => write!(f, "quiz already completed"),
            QuizError::Store(err) => write!(f, "store error: {}", err),
        }
    }
}

impl std::error::Error for QuizError {}

impl From<StoreError> for QuizError {
    fn from(err: StoreError) -> Self {
        QuizError::Store(err)
    }
}
