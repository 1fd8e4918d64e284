//! # pdf-quiz
//!
//! Generate multiple-choice quizzes from PDF documents with a language model,
//! then take them in the terminal.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pdf_quiz::{save_bank_to_json, Config, PdfSource, Pipeline, QuizError};
//!
//! async fn make_quiz() -> Result<(), QuizError> {
//!     let mut pipeline = Pipeline::from_config(Config::default())?;
//!     pipeline.ingest(&PdfSource::new(vec!["notes.pdf".into()]))?;
//!
//!     // Ask for five questions grounded in the PDF
//!     let generation = pipeline.generate("Cell biology", 5).await?;
//!     save_bank_to_json(&generation.bank, "quiz.json")?;
//!
//!     Ok(())
//! }
//! ```

mod app;
pub mod config;
mod data;
pub mod generator;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod logging;
mod models;
pub mod pipeline;
pub mod session;
pub mod terminal;
mod ui;

use std::collections::BTreeSet;
use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

pub use app::{App, BuilderField, DocumentSummary};
pub use config::Config;
pub use data::{load_bank_from_json, save_bank_to_json, LoadError};
pub use generator::{Generation, GenerationStats, QuizGenerator, MAX_QUESTIONS};
pub use index::{EmbeddingClient, EmbeddingPort, MemoryIndex, Retriever, VectorIndex};
pub use ingest::{DocumentSource, PdfSource};
pub use llm::{ChatClient, GenerativeModel};
pub use models::{AnswerFeedback, AppState, Choice, Question, QuestionBank};
pub use pipeline::Pipeline;
pub use session::{QuizSession, SessionState};

/// Error type for quiz operations.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("no context retriever is configured")]
    MissingContext,

    #[error("no documents have been loaded")]
    NoDocuments,

    /// The model or embedding service failed or answered with an error.
    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    #[error("gave up after {rounds} model calls with {accepted} of {requested} questions")]
    GenerationExhausted {
        rounds: usize,
        accepted: usize,
        requested: usize,
    },

    #[error("question {index} is out of range for a bank of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("failed to read {}: {source}", .path.display())]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read PDF {}: {source}", .path.display())]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QuizError {
    pub fn transport(service: &'static str, err: impl Display) -> Self {
        QuizError::Transport {
            service,
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;

/// A quiz instance that can be run in the terminal.
pub struct Quiz<M = ChatClient, E = EmbeddingClient> {
    app: App,
    pipeline: Option<Pipeline<M, E>>,
}

impl Quiz {
    /// Take a previously saved bank. Generating new questions is disabled.
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bank = load_bank_from_json(path)?;
        Ok(Self {
            app: App::with_bank(bank)?,
            pipeline: None,
        })
    }
}

impl<M: GenerativeModel, E: EmbeddingPort> Quiz<M, E> {
    /// Open on the builder form, generating from whatever `pipeline` has
    /// ingested.
    pub fn builder(pipeline: Pipeline<M, E>, topic: String, num_questions: usize) -> Self {
        let documents = document_summary(&pipeline);
        Self {
            app: App::builder(topic, num_questions, documents),
            pipeline: Some(pipeline),
        }
    }

    /// Run the quiz in the terminal.
    ///
    /// This will take over the terminal, display the quiz UI, and return
    /// when the user quits. Returns the last bank that reached the quiz
    /// screen, even if the user has since moved back to the builder.
    pub async fn run(mut self) -> Result<Option<QuestionBank>> {
        let mut term = terminal::TerminalGuard::enter()?;
        run_event_loop(&mut term, &mut self.app, self.pipeline.as_mut()).await?;
        drop(term);
        Ok(self.app.last_bank().cloned())
    }

    /// Get a reference to the underlying app for custom handling.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a mutable reference to the underlying app for custom handling.
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }
}

/// Files, pages and chunks currently held by `pipeline`.
pub fn document_summary<M, E>(pipeline: &Pipeline<M, E>) -> DocumentSummary
where
    M: GenerativeModel,
    E: EmbeddingPort,
{
    let files: BTreeSet<&str> = pipeline.pages().iter().map(|p| p.source.as_str()).collect();
    DocumentSummary {
        files: files.into_iter().map(str::to_string).collect(),
        pages: pipeline.pages().len(),
        chunks: pipeline.chunk_count(),
    }
}

async fn run_event_loop<M: GenerativeModel, E: EmbeddingPort>(
    terminal: &mut terminal::AppTerminal,
    app: &mut App,
    mut pipeline: Option<&mut Pipeline<M, E>>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if app.state == AppState::Generating {
            let result = match pipeline.as_deref_mut() {
                Some(pipeline) => {
                    let result = pipeline
                        .generate(app.topic(), app.num_questions())
                        .await
                        .map(|generation| generation.bank);
                    app.set_documents(document_summary(pipeline));
                    result
                }
                None => Err(QuizError::NoDocuments),
            };
            if let Err(e) = &result {
                tracing::error!("generation failed: {}", e);
            }
            app.finish_generation(result);
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if handle_input(app, key.code) {
                break;
            }
        }
    }

    Ok(())
}

/// Returns true if the app should exit.
fn handle_input(app: &mut App, key: KeyCode) -> bool {
    match app.state {
        AppState::Builder => handle_builder_input(app, key),
        AppState::Generating => false,
        AppState::Quiz => handle_quiz_input(app, key),
        AppState::Result => handle_result_input(app, key),
    }
}

fn handle_builder_input(app: &mut App, key: KeyCode) -> bool {
    match key {
        KeyCode::Esc => return true,
        KeyCode::Tab | KeyCode::BackTab => app.toggle_field(),
        KeyCode::Enter => app.begin_generation(),
        KeyCode::Up => app.increase_questions(),
        KeyCode::Down => app.decrease_questions(),
        KeyCode::Backspace if app.field() == BuilderField::Topic => app.pop_topic_char(),
        KeyCode::Char(c) => match app.field() {
            BuilderField::Topic => app.push_topic_char(c),
            BuilderField::Count if c == '+' || c == 'k' => app.increase_questions(),
            BuilderField::Count if c == '-' || c == 'j' => app.decrease_questions(),
            BuilderField::Count => {}
        },
        _ => {}
    }
    false
}

fn handle_quiz_input(app: &mut App, key: KeyCode) -> bool {
    let answered = app.feedback().is_some();
    match key {
        KeyCode::Up | KeyCode::Char('k') if !answered => app.select_previous_option(),
        KeyCode::Down | KeyCode::Char('j') if !answered => app.select_next_option(),
        KeyCode::Enter | KeyCode::Char(' ') if !answered => app.submit_answer(),
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('n') => app.next_question(),
        KeyCode::Left | KeyCode::Char('p') => app.previous_question(),
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return true,
        _ => {}
    }
    false
}

fn handle_result_input(app: &mut App, key: KeyCode) -> bool {
    match key {
        KeyCode::Down | KeyCode::Char('j') => app.scroll_results_down(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_results_up(),
        KeyCode::Char('r') | KeyCode::Char('R') => app.retake(),
        KeyCode::Char('g') | KeyCode::Char('G') => app.new_quiz(),
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return true,
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_question;

    fn quiz_app() -> App {
        let mut bank = QuestionBank::new();
        bank.insert(sample_question("First?", "A"));
        bank.insert(sample_question("Second?", "A"));
        App::with_bank(bank).unwrap()
    }

    #[test]
    fn test_builder_typing_and_quit() {
        let mut app = App::builder(String::new(), 3, DocumentSummary::default());
        assert!(!handle_input(&mut app, KeyCode::Char('q')));
        assert_eq!(app.topic(), "q");

        handle_input(&mut app, KeyCode::Tab);
        handle_input(&mut app, KeyCode::Char('+'));
        assert_eq!(app.num_questions(), 4);
        assert_eq!(app.topic(), "q");

        assert!(handle_input(&mut app, KeyCode::Esc));
    }

    #[test]
    fn test_enter_starts_generation() {
        let mut app = App::builder("Rust".to_string(), 3, DocumentSummary::default());
        handle_input(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::Generating);
        assert!(!handle_input(&mut app, KeyCode::Esc));
    }

    #[test]
    fn test_quiz_keys_answer_then_advance() {
        let mut app = quiz_app();

        handle_input(&mut app, KeyCode::Enter);
        assert!(app.feedback().unwrap().correct);

        // Selection is locked once answered.
        handle_input(&mut app, KeyCode::Char('j'));
        assert_eq!(app.selected_option(), 0);

        handle_input(&mut app, KeyCode::Enter);
        assert_eq!(app.current_question_number(), 2);
        assert!(app.feedback().is_none());

        handle_input(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state, AppState::Result);
        assert_eq!(app.session().unwrap().score(), 1);
    }

    #[test]
    fn test_result_retake() {
        let mut app = quiz_app();
        handle_input(&mut app, KeyCode::Char('n'));
        handle_input(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state, AppState::Result);

        handle_input(&mut app, KeyCode::Char('r'));
        assert_eq!(app.state, AppState::Quiz);
        assert!(handle_input(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_error_messages() {
        let err = QuizError::transport("model", "connection refused");
        assert_eq!(err.to_string(), "model request failed: connection refused");

        let err = QuizError::GenerationExhausted {
            rounds: 10,
            accepted: 1,
            requested: 2,
        };
        assert!(err.to_string().contains("1 of 2"));
    }
}
