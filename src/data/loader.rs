use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{Question, QuestionBank};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} must contain at least one question", .0.display())]
    Empty(PathBuf),

    #[error("duplicate question in bank: {0}")]
    Duplicate(String),

    #[error("invalid question {question:?}: {reason}")]
    Invalid { question: String, reason: String },
}

/// Load a previously saved question bank.
///
/// The file is a JSON array of questions in the same shape the model is
/// asked to produce. Empty banks, repeated question text and questions
/// without four distinct choices and a matching answer are rejected.
pub fn load_bank_from_json<P: AsRef<Path>>(path: P) -> Result<QuestionBank, LoadError> {
    let path = path.as_ref();

    let json_content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let questions: Vec<Question> =
        serde_json::from_str(&json_content).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if questions.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    let mut bank = QuestionBank::new();
    for question in questions {
        question.validate().map_err(|reason| LoadError::Invalid {
            question: question.question.clone(),
            reason,
        })?;
        let text = question.question.clone();
        if !bank.insert(question) {
            return Err(LoadError::Duplicate(text));
        }
    }

    Ok(bank)
}

pub fn save_bank_to_json<P: AsRef<Path>>(bank: &QuestionBank, path: P) -> Result<(), LoadError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(bank).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| LoadError::Write {
        path: path.to_path_buf(),
        source,
    })
}
