// src/normalizer.rs

use serde_json::Value;

use crate::config::OPTION_COUNT;
use crate::models::question::Question;

/// Fallback labels used when a question arrives without a usable option list
/// or with fewer than four entries.
const PLACEHOLDER_OPTIONS: [&str; OPTION_COUNT] = ["Option A", "Option B", "Option C", "Option D"];

/// Fallback prompt for a question record missing both prompt fields.
const PLACEHOLDER_PROMPT: &str = "Missing question";

/// Converts an untyped quiz payload into a canonical question sequence.
///
/// Accepted shapes: a bare array of question records, or a wrapper object
/// with a `questions` array. Anything else degrades to an empty sequence;
/// this function never fails. Pure and idempotent.
pub fn normalize_quiz(payload: &Value) -> Vec<Question> {
    let raw_questions = if let Some(items) = payload.as_array() {
        items
    } else if let Some(items) = payload.get("questions").and_then(Value::as_array) {
        items
    } else {
        tracing::warn!("Quiz payload has no recognizable question list, degrading to empty");
        return Vec::new();
    };

    raw_questions.iter().map(normalize_question).collect()
}

fn normalize_question(item: &Value) -> Question {
    // Prompt field varies between generator versions: `q` or `question`.
    let prompt = item
        .get("q")
        .or_else(|| item.get("question"))
        .and_then(Value::as_str)
        .unwrap_or(PLACEHOLDER_PROMPT)
        .to_string();

    let options = match item.get("options").and_then(Value::as_array) {
        Some(entries) => {
            let mut options: Vec<String> = entries
                .iter()
                .take(OPTION_COUNT)
                .map(|v| match v.as_str() {
                    Some(s) => s.to_string(),
                    None => v.to_string(),
                })
                .collect();
            for i in options.len()..OPTION_COUNT {
                options.push(PLACEHOLDER_OPTIONS[i].to_string());
            }
            options
        }
        None => PLACEHOLDER_OPTIONS.iter().map(|s| s.to_string()).collect(),
    };

    // Correct-answer field also has two spellings; anything that is not a
    // non-negative integer falls back to index 0.
    let correct = item
        .get("correct")
        .or_else(|| item.get("correctAnswer"))
        .and_then(Value::as_i64)
        .filter(|n| *n >= 0)
        .map(|n| n as i32)
        .unwrap_or(0);

    Question {
        prompt,
        options,
        correct,
    }
}
