// src/quiz/lookup.rs

use serde::Deserialize;

use crate::{
    models::quiz::Quiz,
    quiz::QuizError,
    store::QuizStore,
};

/// How a caller addressed a quiz.
///
/// Older clients address a quiz by its own id, others by the id of the
/// content row created alongside it; `Unknown` covers routes that accept both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizRef {
    Quiz(i64),
    Content(i64),
    Unknown(i64),
}

/// Query parameter selecting how a path id is interpreted.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    Quiz,
    Content,
    #[default]
    Auto,
}

impl QuizRef {
    pub fn new(id: i64, kind: IdKind) -> Self {
        match kind {
            IdKind::Quiz => QuizRef::Quiz(id),
            IdKind::Content => QuizRef::Content(id),
            IdKind::Auto => QuizRef::Unknown(id),
        }
    }
}

/// Resolves a reference to its quiz record.
pub async fn resolve_quiz<S>(store: &S, quiz_ref: QuizRef) -> Result<Quiz, QuizError>
where
    S: QuizStore + ?Sized,
{
    let found = match quiz_ref {
        QuizRef::Quiz(id) => store.find_quiz(id).await?,
        QuizRef::Content(id) => quiz_for_content(store, id).await?,
        QuizRef::Unknown(id) => match store.find_quiz(id).await? {
            Some(quiz) => Some(quiz),
            None => quiz_for_content(store, id).await?,
        },
    };

    found.ok_or(QuizError::NotFound("Quiz"))
}

async fn quiz_for_content<S>(store: &S, content_id: i64) -> Result<Option<Quiz>, QuizError>
where
    S: QuizStore + ?Sized,
{
    match store.find_quiz_content(content_id).await? {
        Some(content) => Ok(store.find_quiz_by_content(content.id).await?),
        None => Ok(None),
    }
}
