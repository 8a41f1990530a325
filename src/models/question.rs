// src/models/question.rs

use serde::{Deserialize, Serialize};

/// A quiz question in canonical form: always exactly four options and a
/// valid correct index. Produced by the normalizer, never hand-built from
/// raw payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,

    /// Exactly `config::OPTION_COUNT` entries.
    pub options: Vec<String>,

    /// Index into `options`. Always `>= 0`; compared against submitted
    /// answers, so it shares their integer type.
    pub correct: i32,
}

/// DTO for sending a question to the client (excludes the correct index).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub prompt: String,
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        PublicQuestion {
            prompt: q.prompt.clone(),
            options: q.options.clone(),
        }
    }
}
