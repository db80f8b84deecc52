// src/quiz/scoring.rs

use crate::{
    models::question::Question,
    quiz::{normalize::AnswerMap, options::resolve_correct_option},
};

/// Outcome of grading one set of answers against a quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSheet {
    pub score: i32,
    pub total_possible: i32,
    pub percentage: f64,
    pub correct_count: usize,
    /// Question ids whose answer key came from a fallback rather than a flag.
    pub fabricated_keys: Vec<i64>,
}

/// Grades normalized answers. Every question counts toward `total_possible`,
/// answered or not.
pub fn score_answers(questions: &[Question], answers: &AnswerMap) -> ScoreSheet {
    let mut score: i32 = 0;
    let mut total_possible: i32 = 0;
    let mut correct_count = 0;
    let mut fabricated_keys = Vec::new();

    for question in questions {
        total_possible = total_possible.saturating_add(question.points);

        let key = resolve_correct_option(&question.options);
        if key.source.is_fabricated() {
            tracing::warn!(
                question_id = question.id,
                quiz_id = question.quiz_id,
                source = ?key.source,
                "Question has no flagged correct option; scoring against option {}",
                key.option_id
            );
            fabricated_keys.push(question.id);
        }

        let selected = answers.get(&question.id.to_string());
        if selected.is_some_and(|s| *s == key.option_id) {
            score = score.saturating_add(question.points);
            correct_count += 1;
        }
    }

    ScoreSheet {
        score,
        total_possible,
        percentage: percentage(score, total_possible),
        correct_count,
        fabricated_keys,
    }
}

/// `score / total * 100`, rounded to two decimals. Zero when nothing is achievable.
pub fn percentage(score: i32, total_possible: i32) -> f64 {
    if total_possible <= 0 {
        return 0.0;
    }
    let raw = f64::from(score) / f64::from(total_possible) * 100.0;
    (raw * 100.0).round() / 100.0
}
