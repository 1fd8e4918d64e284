//! Parsing and validation of raw model output.

use serde::Deserialize;
use thiserror::Error;

use crate::models::{Choice, Question, QuestionBank};

/// Why a response was not accepted into the bank.
///
/// These never escape the generation loop; they are counted and logged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CandidateError {
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("response has no \"question\" field")]
    MissingQuestion,

    #[error("duplicate question: {0}")]
    Duplicate(String),

    #[error("invalid question shape: {0}")]
    InvalidShape(String),
}

/// A model response parsed as JSON but not yet checked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    pub question: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub answer: Option<String>,
    pub explanation: Option<String>,
}

pub fn parse_candidate(raw: &str) -> Result<Candidate, CandidateError> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|e| CandidateError::Malformed(e.to_string()))
}

/// Remove a surrounding Markdown code fence (```` ```json ... ``` ````).
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    match body.split_once('\n') {
        Some((_, inner)) => inner.trim(),
        None => body.trim(),
    }
}

/// True when the candidate has a question that is not already in the bank.
pub fn validate_question(candidate: &Candidate, bank: &QuestionBank) -> bool {
    match &candidate.question {
        Some(text) => !bank.contains_text(text),
        None => false,
    }
}

impl Candidate {
    /// Check structure and convert into a [`Question`].
    ///
    /// Requires non-empty question text, exactly four choices with distinct
    /// non-empty keys, and an answer that names one of those keys.
    pub fn into_question(self) -> Result<Question, CandidateError> {
        let question = self.question.ok_or(CandidateError::MissingQuestion)?;
        let answer = self
            .answer
            .ok_or_else(|| CandidateError::InvalidShape("missing answer".to_string()))?;

        let question = Question {
            question,
            choices: self.choices,
            answer,
            explanation: self.explanation.unwrap_or_default(),
        };
        question.validate().map_err(CandidateError::InvalidShape)?;
        Ok(question)
    }
}

/// Uniqueness first, then shape.
pub fn accept(candidate: Candidate, bank: &QuestionBank) -> Result<Question, CandidateError> {
    if !validate_question(&candidate, bank) {
        return Err(match candidate.question {
            Some(text) => CandidateError::Duplicate(text),
            None => CandidateError::MissingQuestion,
        });
    }
    candidate.into_question()
}
