mod question;

#[cfg(test)]
pub(crate) use question::sample_question;
pub use question::{
    check_answer, selected_key, AnswerFeedback, Choice, Question, QuestionBank, NUM_CHOICES,
};

/// Which screen the terminal app is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Topic and question count form.
    Builder,
    /// Waiting on the model.
    Generating,
    Quiz,
    /// Session exhausted, score breakdown.
    Result,
}
