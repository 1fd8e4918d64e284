//! Quiz generation.
//!
//! Prompts a generative model for one question at a time, grounded in
//! context retrieved for the topic, and keeps only well-formed questions
//! whose text is not already in the bank.

mod candidate;
mod generator;
mod prompt;

pub use candidate::{parse_candidate, validate_question, Candidate, CandidateError};
pub use generator::{
    check_question_count, Generation, GenerationStats, QuizGenerator, MAX_QUESTIONS,
    RETRIES_PER_QUESTION,
};
pub use prompt::{normalize_topic, render_prompt, DEFAULT_TOPIC};

#[cfg(test)]
pub(crate) use generator::tests::{question_json, ScriptedModel};
