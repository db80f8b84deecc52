// src/quiz/attempt.rs

//! Attempt lifecycle: `no-attempt -> in-progress -> completed`.
//!
//! Nothing leaves `completed`; only the administrative reset removes attempts.

use chrono::Utc;
use serde_json::{Map, Value};

use crate::{
    models::attempt::{CompletedAttempt, QuizAttempt},
    quiz::{
        QuizError,
        lookup::{QuizRef, resolve_quiz},
        normalize::normalize_answers,
        scoring::score_answers,
    },
    store::QuizStore,
};

/// Starts or resumes the student's attempt at a quiz.
///
/// Returns the existing in-progress attempt unchanged when there is one.
pub async fn begin<S>(store: &S, student_id: i64, quiz_ref: QuizRef) -> Result<QuizAttempt, QuizError>
where
    S: QuizStore + ?Sized,
{
    let quiz = resolve_quiz(store, quiz_ref).await?;

    if let Some(attempt) = current_attempt(store, student_id, quiz.id).await? {
        return Ok(attempt);
    }

    match store.insert_attempt(student_id, quiz.id, Utc::now()).await? {
        Some(attempt) => {
            tracing::info!(
                attempt_id = attempt.id,
                quiz_id = quiz.id,
                student_id,
                "Quiz attempt started"
            );
            Ok(attempt)
        }
        // A concurrent begin won the insert; hand back its attempt.
        None => current_attempt(store, student_id, quiz.id)
            .await?
            .ok_or(QuizError::NotFound("Quiz attempt")),
    }
}

/// Replaces the answers of an in-progress attempt. No merge with earlier saves.
pub async fn save_progress<S>(
    store: &S,
    attempt_id: i64,
    student_id: i64,
    raw_answers: &Map<String, Value>,
) -> Result<QuizAttempt, QuizError>
where
    S: QuizStore + ?Sized,
{
    let attempt = owned_attempt(store, attempt_id, student_id).await?;
    if attempt.is_completed() {
        return Err(QuizError::AlreadyCompleted);
    }

    let answers = normalize_answers(raw_answers);

    store
        .save_answers(attempt.id, &answers)
        .await?
        .ok_or(QuizError::AlreadyCompleted)
}

/// Grades and finalizes an attempt.
pub async fn complete<S>(
    store: &S,
    attempt_id: i64,
    student_id: i64,
    raw_answers: &Map<String, Value>,
) -> Result<CompletedAttempt, QuizError>
where
    S: QuizStore + ?Sized,
{
    let attempt = owned_attempt(store, attempt_id, student_id).await?;
    if attempt.is_completed() {
        return Err(QuizError::AlreadyCompleted);
    }

    let quiz = store
        .find_quiz(attempt.quiz_id)
        .await?
        .ok_or(QuizError::NotFound("Quiz"))?;
    let questions = store.list_questions(quiz.id).await?;

    let answers = normalize_answers(raw_answers);
    let sheet = score_answers(&questions, &answers);

    let completed = store
        .complete_attempt(attempt.id, &answers, sheet.score, Utc::now())
        .await
        .map_err(|err| match err {
            // The completed-attempt unique index fired: the pair already has a result.
            crate::store::StoreError::Conflict(_) => QuizError::AlreadyCompleted,
            other => QuizError::Store(other),
        })?
        .ok_or(QuizError::AlreadyCompleted)?;

    tracing::info!(
        attempt_id = completed.id,
        quiz_id = quiz.id,
        student_id,
        score = sheet.score,
        total = sheet.total_possible,
        "Quiz attempt completed"
    );

    Ok(CompletedAttempt {
        attempt: completed,
        total_possible_score: sheet.total_possible,
        percentage: sheet.percentage,
        passed: sheet.percentage >= f64::from(quiz.passing_score),
        correct_count: sheet.correct_count,
        fabricated_keys: sheet.fabricated_keys,
    })
}

/// Out-of-band administrative reset: forgets every attempt of the pair so the
/// student may take the quiz again.
pub async fn reset<S>(store: &S, student_id: i64, quiz_ref: QuizRef) -> Result<u64, QuizError>
where
    S: QuizStore + ?Sized,
{
    let quiz = resolve_quiz(store, quiz_ref).await?;
    let removed = store.delete_attempts(student_id, quiz.id).await?;

    tracing::warn!(quiz_id = quiz.id, student_id, removed, "Quiz attempts reset");

    Ok(removed)
}

/// In-progress attempt of the pair, or `AlreadyCompleted` when the quiz is done.
async fn current_attempt<S>(store: &S, student_id: i64, quiz_id: i64) -> Result<Option<QuizAttempt>, QuizError>
where
    S: QuizStore + ?Sized,
{
    let attempts = store.find_attempts(student_id, quiz_id).await?;

    if attempts.iter().any(QuizAttempt::is_completed) {
        return Err(QuizError::AlreadyCompleted);
    }

    Ok(attempts.into_iter().find(|a| !a.is_completed()))
}

/// Loads an attempt, treating someone else's attempt as missing.
async fn owned_attempt<S>(store: &S, attempt_id: i64, student_id: i64) -> Result<QuizAttempt, QuizError>
where
    S: QuizStore + ?Sized,
{
    store
        .find_attempt(attempt_id)
        .await?
        .filter(|attempt| attempt.student_id == student_id)
        .ok_or(QuizError::NotFound("Quiz attempt"))
}
