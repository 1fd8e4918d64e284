//! Ingestion-to-quiz orchestration shared by the TUI and the headless CLI.

use crate::config::Config;
use crate::generator::{check_question_count, Generation, QuizGenerator};
use crate::index::{EmbeddingClient, EmbeddingPort, MemoryIndex, VectorIndex};
use crate::ingest::{DocumentSource, Page, TextSplitter};
use crate::llm::{ChatClient, GenerativeModel};
use crate::{QuizError, Result};

pub struct Pipeline<M = ChatClient, E = EmbeddingClient> {
    config: Config,
    model: M,
    index: MemoryIndex<E>,
    pages: Vec<Page>,
    chunk_count: usize,
    indexed: bool,
}

impl Pipeline<ChatClient, EmbeddingClient> {
    /// Build the HTTP-backed pipeline described by `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let model = ChatClient::new(config.model.clone())?;
        let embedder = EmbeddingClient::new(config.embedding.clone())?;
        Ok(Self::new(config, model, embedder))
    }
}

impl<M: GenerativeModel, E: EmbeddingPort> Pipeline<M, E> {
    pub fn new(config: Config, model: M, embedder: E) -> Self {
        let index = MemoryIndex::new(embedder, config.generation.top_k);
        Self {
            config,
            model,
            index,
            pages: Vec::new(),
            chunk_count: 0,
            indexed: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// Load pages from `source`, adding to whatever was loaded before.
    /// The index is rebuilt on the next generation.
    pub fn ingest(&mut self, source: &impl DocumentSource) -> Result<usize> {
        let pages = source.load()?;
        let added = pages.len();
        self.pages.extend(pages);
        self.indexed = false;
        Ok(added)
    }

    /// Split loaded pages and embed them into a fresh index.
    pub async fn build_index(&mut self) -> Result<usize> {
        if self.pages.is_empty() {
            return Err(QuizError::NoDocuments);
        }

        let chunks = TextSplitter::new(&self.config.splitter).split_pages(&self.pages);
        self.index.clear();
        self.chunk_count = self.index.index(chunks).await?;
        self.indexed = true;
        Ok(self.chunk_count)
    }

    /// Generate a new question bank on `topic`, indexing first if needed.
    pub async fn generate(&mut self, topic: &str, num_questions: usize) -> Result<Generation> {
        check_question_count(num_questions)?;

        if !self.indexed {
            self.build_index().await?;
        }

        let generation = &self.config.generation;
        let generator = QuizGenerator::new(topic, num_questions, &self.model, Some(&self.index))?
            .with_retries(generation.retries_per_question)
            .with_max_rounds(generation.max_rounds(num_questions));

        let result = generator.generate_quiz().await?;
        tracing::info!(
            "Generated {} questions with {} model calls ({} parse failures, {} rejected)",
            result.bank.len(),
            result.stats.model_calls,
            result.stats.parse_failures,
            result.stats.rejected
        );
        Ok(result)
    }
}
