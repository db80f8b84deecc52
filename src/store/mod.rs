// src/store/mod.rs

//! Persistence seams.
//!
//! Handlers and the quiz engine only see these traits; `PgStore` is the
//! production implementation.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    models::{
        attempt::QuizAttempt,
        content::{Content, ContentFilter, ContentUpdate, NewContent},
        question::{NewQuestion, Question},
        quiz::{NewQuiz, Quiz},
        user::{Role, User},
    },
    quiz::normalize::AnswerMap,
};

pub mod postgres;

pub use postgres::PgStore;

#[derive(Debug, Clone)]
pub enum StoreError {
    /// A uniqueness or foreign-key rule rejected the write.
    Conflict(String),
    /// Anything else the backend reported.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Conflict(msg) => write!(f, "conflict: {}", msg),
            StoreError::Backend(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str, role: Role) -> StoreResult<User>;
    async fn find_user(&self, id: i64) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn update_user(&self, id: i64, role: Option<Role>, password_hash: Option<&str>) -> StoreResult<bool>;
    /// Fails with `Conflict` while the user still authors content or owns attempts.
    async fn delete_user(&self, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn create_content(&self, content: NewContent) -> StoreResult<Content>;

    /// Creates a quiz content row, its quiz and its questions atomically.
    async fn create_quiz_content(
        &self,
        content: NewContent,
        quiz: NewQuiz,
        questions: Vec<NewQuestion>,
    ) -> StoreResult<(Content, Quiz)>;

    async fn find_content(&self, id: i64) -> StoreResult<Option<Content>>;
    async fn list_contents(&self, filter: &ContentFilter) -> StoreResult<Vec<Content>>;
    async fn update_content(&self, id: i64, update: ContentUpdate) -> StoreResult<Option<Content>>;

    /// Deleting content removes its quiz, questions and attempts as well.
    async fn delete_content(&self, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn find_quiz(&self, id: i64) -> StoreResult<Option<Quiz>>;
    async fn find_quiz_by_content(&self, content_id: i64) -> StoreResult<Option<Quiz>>;

    /// Content row of type 'quiz' with this id.
    async fn find_quiz_content(&self, content_id: i64) -> StoreResult<Option<Content>>;

    /// Questions in display order.
    async fn list_questions(&self, quiz_id: i64) -> StoreResult<Vec<Question>>;

    /// Appends a question and adds its points to the quiz total.
    async fn add_question(&self, quiz_id: i64, question: NewQuestion) -> StoreResult<Question>;

    async fn find_attempt(&self, id: i64) -> StoreResult<Option<QuizAttempt>>;
    async fn find_attempts(&self, student_id: i64, quiz_id: i64) -> StoreResult<Vec<QuizAttempt>>;
    async fn list_student_attempts(&self, student_id: i64) -> StoreResult<Vec<QuizAttempt>>;
    async fn list_quiz_attempts(&self, quiz_id: i64) -> StoreResult<Vec<QuizAttempt>>;

    /// Inserts an in-progress attempt. Returns `None` when another in-progress
    /// attempt for the pair already exists.
    async fn insert_attempt(
        &self,
        student_id: i64,
        quiz_id: i64,
        started_at: DateTime<Utc>,
    ) -> StoreResult<Option<QuizAttempt>>;

    /// Overwrites answers of an in-progress attempt. `None` if it is not in progress.
    async fn save_answers(&self, attempt_id: i64, answers: &AnswerMap) -> StoreResult<Option<QuizAttempt>>;

    /// Finalizes an in-progress attempt. `None` if it is not in progress.
    async fn complete_attempt(
        &self,
        attempt_id: i64,
        answers: &AnswerMap,
        score: i32,
        completed_at: DateTime<Utc>,
    ) -> StoreResult<Option<QuizAttempt>>;

    /// Removes every attempt of the pair. Returns how many were removed.
    async fn delete_attempts(&self, student_id: i64, quiz_id: i64) -> StoreResult<u64>;
}

/// Everything the HTTP layer needs.
pub trait Store: UserStore + ContentStore + QuizStore {}

impl<T: UserStore + ContentStore + QuizStore> Store for T {}
