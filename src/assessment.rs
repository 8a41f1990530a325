// src/assessment.rs

use serde::Serialize;

use crate::config::{NO_ANSWER, PASSING_SCORE, QUESTION_TIME_LIMIT_SECS};
use crate::models::question::Question;
use crate::models::request::Outcome;

/// Final grading of one finished assessment session.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResult {
    pub answers: Vec<i32>,
    pub correct_count: usize,
    pub total_questions: usize,
    pub score: i32,
    pub level: i32,
    pub outcome: Outcome,

    /// XP to grant. Zero on a failed outcome.
    pub reward_xp: i32,
}

/// What `submit_answer` led to: the next question, or the graded result.
#[derive(Debug)]
pub enum Progress {
    /// Advanced to the question at this index; the timer was reset.
    Next(usize),
    Finished(AssessmentResult),
}

/// One running timed assessment. Purely transitional: no clocks, no I/O.
/// The session registry drives the countdown and feeds `tick`/`submit_answer`.
#[derive(Debug)]
pub struct AssessmentSession {
    questions: Vec<Question>,
    answers: Vec<i32>,
    remaining_seconds: u64,
}

impl AssessmentSession {
    /// Callers must hand in a non-empty question list; the registry refuses
    /// degenerate payloads before constructing a session.
    pub fn new(questions: Vec<Question>) -> Self {
        debug_assert!(!questions.is_empty());
        Self {
            questions,
            answers: Vec::new(),
            remaining_seconds: QUESTION_TIME_LIMIT_SECS,
        }
    }

    /// Index of the question currently awaiting an answer.
    pub fn current_index(&self) -> usize {
        self.answers.len()
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index()]
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    /// One countdown second elapsed. Returns the remaining time; at zero the
    /// caller must submit the sentinel answer on the learner's behalf.
    pub fn tick(&mut self) -> u64 {
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        self.remaining_seconds
    }

    /// Records `choice` for the current question. Advancing resets the
    /// timer; answering the last question grades the session.
    pub fn submit_answer(&mut self, choice: i32) -> Progress {
        self.answers.push(choice);

        if self.answers.len() < self.questions.len() {
            self.remaining_seconds = QUESTION_TIME_LIMIT_SECS;
            Progress::Next(self.current_index())
        } else {
            Progress::Finished(grade(&self.questions, &self.answers))
        }
    }
}

/// Scores a full answer sheet against the question list.
fn grade(questions: &[Question], answers: &[i32]) -> AssessmentResult {
    let correct_count = answers
        .iter()
        .zip(questions)
        .filter(|(answer, question)| **answer == question.correct)
        .count();

    let score = score_percentage(correct_count, questions.len());
    let outcome = if score >= PASSING_SCORE {
        Outcome::Success
    } else {
        Outcome::Fail
    };

    AssessmentResult {
        answers: answers.to_vec(),
        correct_count,
        total_questions: questions.len(),
        score,
        level: level_for_score(score),
        outcome,
        reward_xp: match outcome {
            Outcome::Success => reward_for_score(score),
            Outcome::Fail => 0,
        },
    }
}

/// `round(correct / total * 100)` as an integer percentage.
pub fn score_percentage(correct_count: usize, total_questions: usize) -> i32 {
    if total_questions == 0 {
        return 0;
    }
    ((correct_count as f64 / total_questions as f64) * 100.0).round() as i32
}

/// Maps a score to a mastery level, strictest tier first.
pub fn level_for_score(score: i32) -> i32 {
    if score == 100 {
        4
    } else if score >= 85 {
        3
    } else if score >= PASSING_SCORE {
        2
    } else {
        1
    }
}

/// XP tier for a passing score. Callers must not grant on a failed outcome.
pub fn reward_for_score(score: i32) -> i32 {
    if score == 100 {
        100
    } else if score >= 85 {
        75
    } else if score >= PASSING_SCORE {
        50
    } else {
        0
    }
}
