use crate::generator::MAX_QUESTIONS;
use crate::models::{AnswerFeedback, AppState, Question, QuestionBank, NUM_CHOICES};
use crate::session::QuizSession;
use crate::Result;

/// Which builder input has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderField {
    Topic,
    Count,
}

/// What has been ingested so far, for the builder screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSummary {
    pub files: Vec<String>,
    pub pages: usize,
    pub chunks: usize,
}

pub struct App {
    pub state: AppState,
    topic: String,
    num_questions: usize,
    field: BuilderField,
    documents: DocumentSummary,
    status: Option<String>,
    can_generate: bool,
    session: Option<QuizSession>,
    /// Most recent bank that reached the quiz screen; outlives the session.
    last_bank: Option<QuestionBank>,
    selected_option: usize,
    feedback: Option<AnswerFeedback>,
    result_scroll: usize,
}

impl App {
    /// Start on the builder form.
    pub fn builder(topic: String, num_questions: usize, documents: DocumentSummary) -> Self {
        Self {
            state: AppState::Builder,
            topic,
            num_questions: num_questions.clamp(1, MAX_QUESTIONS),
            field: BuilderField::Topic,
            documents,
            status: None,
            can_generate: true,
            session: None,
            last_bank: None,
            selected_option: 0,
            feedback: None,
            result_scroll: 0,
        }
    }

    /// Start straight on the quiz for an existing bank. Regeneration is
    /// unavailable in this mode.
    pub fn with_bank(bank: QuestionBank) -> Result<Self> {
        let num_questions = bank.len().clamp(1, MAX_QUESTIONS);
        let mut app = Self::builder(String::new(), num_questions, DocumentSummary::default());
        app.can_generate = false;
        app.session = Some(QuizSession::new(bank.clone())?);
        app.last_bank = Some(bank);
        app.state = AppState::Quiz;
        Ok(app)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn num_questions(&self) -> usize {
        self.num_questions
    }

    pub fn field(&self) -> BuilderField {
        self.field
    }

    pub fn documents(&self) -> &DocumentSummary {
        &self.documents
    }

    pub fn set_documents(&mut self, documents: DocumentSummary) {
        self.documents = documents;
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn can_generate(&self) -> bool {
        self.can_generate
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    pub fn last_bank(&self) -> Option<&QuestionBank> {
        self.last_bank.as_ref()
    }

    pub fn selected_option(&self) -> usize {
        self.selected_option
    }

    pub fn feedback(&self) -> Option<&AnswerFeedback> {
        self.feedback.as_ref()
    }

    pub fn result_scroll(&self) -> usize {
        self.result_scroll
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref()?.current_question().ok()
    }

    pub fn current_question_number(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.question_index() + 1)
    }

    pub fn total_questions(&self) -> usize {
        self.session.as_ref().map_or(0, QuizSession::len)
    }

    // Builder

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            BuilderField::Topic => BuilderField::Count,
            BuilderField::Count => BuilderField::Topic,
        };
    }

    pub fn push_topic_char(&mut self, c: char) {
        self.topic.push(c);
    }

    pub fn pop_topic_char(&mut self) {
        self.topic.pop();
    }

    pub fn increase_questions(&mut self) {
        self.num_questions = (self.num_questions + 1).min(MAX_QUESTIONS);
    }

    pub fn decrease_questions(&mut self) {
        self.num_questions = self.num_questions.saturating_sub(1).max(1);
    }

    /// Switch to the generating screen. The event loop performs the work and
    /// reports back through [`App::finish_generation`].
    pub fn begin_generation(&mut self) {
        if !self.can_generate {
            return;
        }
        self.status = None;
        self.session = None;
        self.state = AppState::Generating;
    }

    pub fn finish_generation(&mut self, result: Result<QuestionBank>) {
        match result.and_then(QuizSession::new) {
            Ok(session) => {
                self.last_bank = Some(session.bank().clone());
                self.session = Some(session);
                self.selected_option = 0;
                self.feedback = None;
                self.state = AppState::Quiz;
            }
            Err(e) => {
                self.status = Some(format!("Error: {}", e));
                self.state = AppState::Builder;
            }
        }
    }

    // Quiz

    pub fn select_next_option(&mut self) {
        self.selected_option = (self.selected_option + 1) % NUM_CHOICES;
    }

    pub fn select_previous_option(&mut self) {
        self.selected_option = (self.selected_option + NUM_CHOICES - 1) % NUM_CHOICES;
    }

    pub fn submit_answer(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let label = match session.current_question() {
            Ok(question) => match question.choices.get(self.selected_option) {
                Some(choice) => choice.label(),
                None => return,
            },
            Err(_) => return,
        };
        self.feedback = session.submit_answer(&label).ok();
    }

    pub fn next_question(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.next();
        self.selected_option = 0;
        self.feedback = None;
        if session.is_exhausted() {
            self.result_scroll = 0;
            self.state = AppState::Result;
        }
    }

    pub fn previous_question(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.previous();
            self.selected_option = 0;
            self.feedback = None;
        }
    }

    // Result

    pub fn scroll_results_down(&mut self) {
        let max = self.total_questions().saturating_sub(1);
        self.result_scroll = (self.result_scroll + 1).min(max);
    }

    pub fn scroll_results_up(&mut self) {
        self.result_scroll = self.result_scroll.saturating_sub(1);
    }

    /// Take the same quiz again.
    pub fn retake(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.restart();
            self.selected_option = 0;
            self.feedback = None;
            self.state = AppState::Quiz;
        }
    }

    /// Drop the finished bank and return to the builder.
    pub fn new_quiz(&mut self) {
        if !self.can_generate {
            return;
        }
        self.session = None;
        self.feedback = None;
        self.state = AppState::Builder;
    }
}
