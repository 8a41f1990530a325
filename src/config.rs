// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Seconds allotted per question before the answer is auto-failed.
pub const QUESTION_TIME_LIMIT_SECS: u64 = 45;

/// Minimum score (percentage) for a passing outcome.
pub const PASSING_SCORE: i32 = 70;

/// Days a learner must wait after a failed assessment before retrying.
pub const RETRY_COOLDOWN_DAYS: i64 = 14;

/// Every canonical question carries exactly this many options.
pub const OPTION_COUNT: usize = 4;

/// Sentinel answer recorded when a question times out.
/// Distinct from every valid option index, so it never scores.
pub const NO_ANSWER: i32 = -1;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            rust_log,
        }
    }
}
