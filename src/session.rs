//! Quiz session: a finished question bank plus navigation state.

use crate::models::{check_answer, selected_key, AnswerFeedback, Question, QuestionBank};
use crate::{QuizError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Cursor points at a question.
    Active,
    /// The cursor ran past the last question and was reset to 0.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    bank: QuestionBank,
    question_index: usize,
    state: SessionState,
    /// Selected key per question, `None` until answered.
    answers: Vec<Option<String>>,
}

impl QuizSession {
    /// Sessions only exist for non-empty banks.
    pub fn new(bank: QuestionBank) -> Result<Self> {
        if bank.is_empty() {
            return Err(QuizError::InvalidConfiguration(
                "cannot start a quiz with an empty question bank".to_string(),
            ));
        }

        let answers = vec![None; bank.len()];
        Ok(Self {
            bank,
            question_index: 0,
            state: SessionState::Active,
            answers,
        })
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn len(&self) -> usize {
        self.bank.len()
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == SessionState::Exhausted
    }

    pub fn get_question_at(&self, index: usize) -> Result<&Question> {
        self.bank.get(index).ok_or(QuizError::IndexOutOfRange {
            index,
            len: self.bank.len(),
        })
    }

    pub fn current_question(&self) -> Result<&Question> {
        self.get_question_at(self.question_index)
    }

    /// Advance the cursor. Moving past the last question exhausts the
    /// session and resets the cursor to 0.
    pub fn next(&mut self) {
        if self.is_exhausted() {
            return;
        }

        self.question_index += 1;
        if self.question_index >= self.bank.len() {
            self.question_index = 0;
            self.state = SessionState::Exhausted;
        }
    }

    /// Step back one question; stays on the first question.
    pub fn previous(&mut self) {
        self.question_index = self.question_index.saturating_sub(1);
    }

    /// Start over on the same bank.
    pub fn restart(&mut self) {
        self.question_index = 0;
        self.state = SessionState::Active;
        self.answers = vec![None; self.bank.len()];
    }

    /// Check `selected` against the current question and remember it.
    pub fn submit_answer(&mut self, selected: &str) -> Result<AnswerFeedback> {
        let feedback = check_answer(self.current_question()?, selected);
        self.answers[self.question_index] = Some(selected_key(selected).to_string());
        Ok(feedback)
    }

    pub fn answer_at(&self, index: usize) -> Option<&str> {
        self.answers.get(index).and_then(|a| a.as_deref())
    }

    pub fn is_correct_at(&self, index: usize) -> bool {
        match (self.answer_at(index), self.bank.get(index)) {
            (Some(answer), Some(question)) => answer == question.answer,
            _ => false,
        }
    }

    pub fn score(&self) -> usize {
        (0..self.bank.len()).filter(|&i| self.is_correct_at(i)).count()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }
}
