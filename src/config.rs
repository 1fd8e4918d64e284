//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! whatever the command line (and its environment fallbacks) overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{QuizError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub model: ModelConfig,
    pub embedding: EmbeddingConfig,
    pub splitter: SplitterConfig,
    pub generation: GenerationConfig,
}

/// Chat-completion model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.8,
            max_tokens: 500,
            api_key: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Send all chunks in one request instead of one request per chunk.
    pub batch: bool,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            batch: true,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SplitterConfig {
    pub separator: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            separator: "\n".to_string(),
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Chunks joined into the prompt context.
    pub top_k: usize,
    /// Parse/validate attempts per model response.
    pub retries_per_question: usize,
    /// Model calls allowed per requested question; 0 removes the cap.
    pub max_rounds_per_question: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            top_k: 1,
            retries_per_question: 3,
            max_rounds_per_question: 5,
        }
    }
}

impl GenerationConfig {
    /// Total model-call cap for a request of `num_questions`, if any.
    pub fn max_rounds(&self, num_questions: usize) -> Option<usize> {
        match self.max_rounds_per_question {
            0 => None,
            per_question => Some(per_question * num_questions),
        }
    }
}

impl Config {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.splitter.chunk_size == 0 {
            return Err(QuizError::InvalidConfiguration(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if self.splitter.chunk_overlap >= self.splitter.chunk_size {
            return Err(QuizError::InvalidConfiguration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.splitter.chunk_overlap, self.splitter.chunk_size
            )));
        }
        if self.generation.top_k == 0 {
            return Err(QuizError::InvalidConfiguration(
                "top-k must be at least 1".to_string(),
            ));
        }
        if self.generation.retries_per_question == 0 {
            return Err(QuizError::InvalidConfiguration(
                "retries per question must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(QuizError::InvalidConfiguration(format!(
                "temperature {} is outside 0..=2",
                self.model.temperature
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.splitter.chunk_size, 1000);
        assert_eq!(config.splitter.chunk_overlap, 100);
        assert_eq!(config.generation.retries_per_question, 3);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.json");
        fs::write(&path, r#"{"model": {"model": "llama3"}, "splitter": {"chunkSize": 500}}"#)
            .unwrap();

        let config = Config::from_json_file(&path).unwrap();
        assert_eq!(config.model.model, "llama3");
        assert_eq!(config.model.max_tokens, 500);
        assert_eq!(config.splitter.chunk_size, 500);
        assert_eq!(config.splitter.chunk_overlap, 100);
        assert_eq!(config.embedding.model, "text-embedding-3-small");
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = Config::default();
        config.splitter.chunk_overlap = 1000;
        assert!(matches!(
            config.validate(),
            Err(QuizError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_max_rounds() {
        let mut generation = GenerationConfig::default();
        assert_eq!(generation.max_rounds(3), Some(15));
        generation.max_rounds_per_question = 0;
        assert_eq!(generation.max_rounds(3), None);
    }
}
