// src/quiz/options.rs

use serde::Serialize;
use serde_json::{Value, json};

/// Keys the correctness flag has been stored under, in lookup order.
const FLAG_KEYS: [&str; 2] = ["isCorrect", "is_correct"];

/// Substituted when a stored option list cannot be used.
const PLACEHOLDER_TEXTS: [&str; 4] = ["Option A", "Option B", "Option C", "Option D"];

/// How the answer key of a question was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// An option carried a truthy correctness flag.
    Flagged,
    /// No option was flagged; the first one was taken.
    FirstOptionFallback,
    /// The stored list was unparseable or empty; placeholders were used.
    Placeholder,
}

impl KeySource {
    pub fn is_fabricated(&self) -> bool {
        !matches!(self, KeySource::Flagged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    /// 1-based position of the correct option, as the client renders it.
    pub option_id: String,
    pub source: KeySource,
}

/// A parsed option list and whether it had to be replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOptions {
    pub options: Vec<Value>,
    pub placeholder: bool,
}

/// Option as shown to students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicOption {
    pub id: String,
    pub text: String,
}

/// Decodes a correctness flag stored as a boolean, a 0/1 integer, or a
/// "true"/"false"/"1"/"0" string.
pub fn is_truthy_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1) || n.as_f64() == Some(1.0),
        Value::String(s) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true")
        }
        _ => false,
    }
}

/// Whether an option object is marked correct under any tolerated key.
pub fn option_is_correct(option: &Value) -> bool {
    FLAG_KEYS
        .iter()
        .filter_map(|key| option.get(*key))
        .any(is_truthy_flag)
}

/// Accepts an option array, or a JSON string encoding one.
///
/// Anything unusable (parse failure, non-array, empty array) yields the
/// placeholder set with the first option correct.
pub fn parse_options(raw: &Value) -> ParsedOptions {
    let parsed = match raw {
        Value::Array(items) => Some(items.clone()),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(items)) => Some(items),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Unparseable option list: {}", e);
                None
            }
        },
        _ => None,
    };

    match parsed {
        Some(options) if !options.is_empty() => ParsedOptions {
            options,
            placeholder: false,
        },
        _ => ParsedOptions {
            options: placeholder_options(),
            placeholder: true,
        },
    }
}

pub fn placeholder_options() -> Vec<Value> {
    PLACEHOLDER_TEXTS
        .iter()
        .enumerate()
        .map(|(i, text)| json!({ "text": text, "isCorrect": i == 0 }))
        .collect()
}

/// Determines the correct option of a stored option list.
///
/// The first flagged option wins. With no flagged option the first option is
/// taken so every question still has a deterministic key; the returned
/// `source` tells callers when that happened.
pub fn resolve_correct_option(raw: &Value) -> ResolvedKey {
    let parsed = parse_options(raw);

    let flagged = parsed.options.iter().position(option_is_correct);

    let (index, source) = match (parsed.placeholder, flagged) {
        (true, _) => (0, KeySource::Placeholder),
        (false, Some(index)) => (index, KeySource::Flagged),
        (false, None) => (0, KeySource::FirstOptionFallback),
    };

    ResolvedKey {
        option_id: (index + 1).to_string(),
        source,
    }
}

/// Student-facing options: 1-based ids and display text, no flags.
pub fn public_options(raw: &Value) -> Vec<PublicOption> {
    parse_options(raw)
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| PublicOption {
            id: (i + 1).to_string(),
            text: option_text(option),
        })
        .collect()
}

fn option_text(option: &Value) -> String {
    match option {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("text")
            .or_else(|| map.get("option_text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy_flag_encodings() {
        for truthy in [json!(true), json!(1), json!("true"), json!("TRUE"), json!("1"), json!(1.0)] {
            assert!(is_truthy_flag(&truthy), "{} should be truthy", truthy);
        }
        for falsy in [json!(false), json!(0), json!("false"), json!("0"), json!(null), json!("yes")] {
            assert!(!is_truthy_flag(&falsy), "{} should be falsy", falsy);
        }
    }

    #[test]
    fn test_resolves_flagged_option_one_based() {
        let options = json!([{ "text": "A", "isCorrect": false }, { "text": "B", "isCorrect": true }]);
        let key = resolve_correct_option(&options);
        assert_eq!(key.option_id, "2");
        assert_eq!(key.source, KeySource::Flagged);
    }

    #[test]
    fn test_parses_json_encoded_string() {
        let options = Value::String(r#"[{"is_correct":"1","text":"X"}]"#.to_string());
        let key = resolve_correct_option(&options);
        assert_eq!(key.option_id, "1");
        assert_eq!(key.source, KeySource::Flagged);
    }

    #[test]
    fn test_snake_case_integer_flag() {
        let options = json!([
            { "text": "A", "is_correct": 0 },
            { "text": "B", "is_correct": 0 },
            { "text": "C", "is_correct": 1 },
        ]);
        assert_eq!(resolve_correct_option(&options).option_id, "3");
    }

    #[test]
    fn test_first_flagged_option_wins() {
        let options = json!([
            { "text": "A", "isCorrect": "false" },
            { "text": "B", "isCorrect": "true" },
            { "text": "C", "isCorrect": true },
        ]);
        assert_eq!(resolve_correct_option(&options).option_id, "2");
    }

    #[test]
    fn test_unflagged_list_falls_back_to_first_option() {
        let options = json!([{ "text": "A" }, { "text": "B", "isCorrect": false }]);
        let key = resolve_correct_option(&options);
        assert_eq!(key.option_id, "1");
        assert_eq!(key.source, KeySource::FirstOptionFallback);
        assert!(key.source.is_fabricated());
    }

    #[test]
    fn test_corrupt_lists_use_placeholders() {
        for raw in [
            Value::String("not json".to_string()),
            Value::String("{}".to_string()),
            json!([]),
            json!({ "text": "A" }),
            Value::Null,
        ] {
            let parsed = parse_options(&raw);
            assert!(parsed.placeholder);
            assert_eq!(parsed.options.len(), 4);

            let key = resolve_correct_option(&raw);
            assert_eq!(key.option_id, "1");
            assert_eq!(key.source, KeySource::Placeholder);
        }
    }

    #[test]
    fn test_public_options_hide_flags() {
        let options = json!([{ "text": "A", "isCorrect": true }, "B"]);
        let public = public_options(&options);
        assert_eq!(
            public,
            vec![
                PublicOption { id: "1".into(), text: "A".into() },
                PublicOption { id: "2".into(), text: "B".into() },
            ]
        );
    }
}
