// src/quiz/normalize.rs

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

/// Canonical answers: question id -> selected 1-based option id.
pub type AnswerMap = BTreeMap<String, String>;

/// Property clients are expected to put the selection under.
const SELECTED_OPTION_KEY: &str = "selectedOptionId";

/// The shapes a submitted answer has been seen in.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAnswer<'a> {
    Object(&'a Map<String, Value>),
    Text(&'a str),
    Number(&'a Number),
    Flag(bool),
    Null,
}

impl<'a> From<&'a Value> for RawAnswer<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => RawAnswer::Object(map),
            Value::String(s) => RawAnswer::Text(s),
            Value::Number(n) => RawAnswer::Number(n),
            Value::Bool(b) => RawAnswer::Flag(*b),
            // A bare array carries no single selection.
            Value::Null | Value::Array(_) => RawAnswer::Null,
        }
    }
}

impl RawAnswer<'_> {
    /// Resolves the selected option id, if any.
    pub fn selection(&self) -> Option<String> {
        match self {
            RawAnswer::Object(map) => map
                .get(SELECTED_OPTION_KEY)
                .and_then(scalar_to_string)
                .or_else(|| map.values().find_map(scalar_to_string)),
            RawAnswer::Text(s) => Some((*s).to_string()),
            RawAnswer::Number(n) => Some(number_to_string(n)),
            RawAnswer::Flag(b) => Some(b.to_string()),
            RawAnswer::Null => None,
        }
    }
}

/// Coerces client answers into the canonical map. Unanswered entries are dropped.
///
/// Idempotent: the output, fed back in as JSON strings, normalizes to itself.
pub fn normalize_answers(raw: &Map<String, Value>) -> AnswerMap {
    raw.iter()
        .filter_map(|(question_id, value)| {
            RawAnswer::from(value)
                .selection()
                .map(|selected| (question_id.clone(), selected))
        })
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_to_string(n)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Integral floats render without a fraction so `2.0` and `2` select the same option.
fn number_to_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Lifts canonical answers back into the untyped shape accepted by `normalize_answers`.
    fn to_raw(answers: &AnswerMap) -> Map<String, Value> {
        answers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }

    fn raw(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_primitives_use_string_form() {
        let answers = normalize_answers(&raw(json!({ "1": "2", "2": 3, "3": 4.0 })));
        assert_eq!(answers.get("1").map(String::as_str), Some("2"));
        assert_eq!(answers.get("2").map(String::as_str), Some("3"));
        assert_eq!(answers.get("3").map(String::as_str), Some("4"));
    }

    #[test]
    fn test_null_answers_are_dropped() {
        let answers = normalize_answers(&raw(json!({ "1": null, "2": [], "3": {} })));
        assert!(answers.is_empty());
    }

    #[test]
    fn test_object_prefers_selected_option_id() {
        let answers = normalize_answers(&raw(json!({
            "10": { "answer": "1", "selectedOptionId": 3 },
        })));
        assert_eq!(answers.get("10").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_object_falls_back_to_first_non_null_value() {
        let answers = normalize_answers(&raw(json!({
            "10": { "selectedOptionId": null, "nested": { "x": 1 }, "choice": "4", "other": "1" },
        })));
        assert_eq!(answers.get("10").map(String::as_str), Some("4"));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let input = raw(json!({
            "1": { "selectedOptionId": "2" },
            "2": 1,
            "3": null,
            "4": { "pick": 4.0 },
            "5": "3",
        }));

        let once = normalize_answers(&input);
        let twice = normalize_answers(&to_raw(&once));
        assert_eq!(once, twice);
        assert_eq!(once.len(), 4);
    }
}
