// src/utils/html.rs

/// Sanitizes teacher-authored HTML (content descriptions, question text).
///
/// Formatting tags survive; scripts, iframes and event-handler attributes
/// are stripped before anything reaches the student portal.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitizes an optional field, keeping `None` as is.
pub fn clean_optional(input: Option<String>) -> Option<String> {
    input.map(|s| clean_html(&s))
}
