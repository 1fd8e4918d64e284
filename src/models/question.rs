use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Number of choices every question carries.
pub const NUM_CHOICES: usize = 4;

/// One labelled answer option, e.g. `{"key": "A", "value": "Paris"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub key: String,
    pub value: String,
}

impl Choice {
    /// Radio-style label shown to the user: `"A) Paris"`.
    pub fn label(&self) -> String {
        format!("{}) {}", self.key, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub choices: Vec<Choice>,
    pub answer: String,
    pub explanation: String,
}

impl Question {
    pub fn choice_labels(&self) -> Vec<String> {
        self.choices.iter().map(Choice::label).collect()
    }

    /// Check the structure every question in a bank must have: non-empty
    /// text, exactly four choices with distinct non-empty keys, and an
    /// answer naming one of those keys.
    pub fn validate(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("question text is empty".to_string());
        }

        if self.choices.len() != NUM_CHOICES {
            return Err(format!(
                "expected {} choices, got {}",
                NUM_CHOICES,
                self.choices.len()
            ));
        }

        let mut keys = HashSet::new();
        for choice in &self.choices {
            if choice.key.trim().is_empty() {
                return Err("choice with empty key".to_string());
            }
            if !keys.insert(choice.key.as_str()) {
                return Err(format!("choice key {} repeated", choice.key));
            }
        }

        if !keys.contains(self.answer.as_str()) {
            return Err(format!("answer {} is not one of the choice keys", self.answer));
        }
        Ok(())
    }

    /// Position of the correct choice, if the answer key is present.
    pub fn answer_position(&self) -> Option<usize> {
        self.choices.iter().position(|c| c.key == self.answer)
    }
}

/// Outcome of checking a selected choice against a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub explanation: String,
}

/// Extract the choice key from either a bare key (`"B"`) or a label (`"B) text"`).
pub fn selected_key(selected: &str) -> &str {
    let selected = selected.trim();
    match selected.split_once(')') {
        Some((key, _)) => key.trim(),
        None => selected,
    }
}

pub fn check_answer(question: &Question, selected: &str) -> AnswerFeedback {
    AnswerFeedback {
        correct: selected_key(selected) == question.answer,
        explanation: question.explanation.clone(),
    }
}

/// Ordered, duplicate-free collection of questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }

    pub fn as_slice(&self) -> &[Question] {
        &self.questions
    }

    pub fn contains_text(&self, text: &str) -> bool {
        self.questions.iter().any(|q| q.question == text)
    }

    /// Append a question. Returns false and leaves the bank untouched when
    /// a question with the same text is already present.
    pub fn insert(&mut self, question: Question) -> bool {
        if self.contains_text(&question.question) {
            return false;
        }
        self.questions.push(question);
        true
    }
}

impl<'a> IntoIterator for &'a QuestionBank {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.questions.iter()
    }
}

#[cfg(test)]
pub(crate) fn sample_question(text: &str, answer: &str) -> Question {
    Question {
        question: text.to_string(),
        choices: ["A", "B", "C", "D"]
            .iter()
            .map(|key| Choice {
                key: key.to_string(),
                value: format!("option {}", key),
            })
            .collect(),
        answer: answer.to_string(),
        explanation: format!("{} is right", answer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_answer_with_label() {
        let question = sample_question("What is 2 + 2?", "B");

        let feedback = check_answer(&question, "B) option B");
        assert!(feedback.correct);
        assert_eq!(feedback.explanation, "B is right");

        let feedback = check_answer(&question, "A) option A");
        assert!(!feedback.correct);
        assert_eq!(feedback.explanation, "B is right");
    }

    #[test]
    fn test_validate_shape() {
        assert!(sample_question("Fine?", "C").validate().is_ok());

        let mut question = sample_question("Three choices?", "A");
        question.choices.pop();
        assert!(question.validate().unwrap_err().contains("expected 4 choices"));

        let mut question = sample_question("Repeated key?", "A");
        question.choices[1].key = "A".to_string();
        assert!(question.validate().unwrap_err().contains("repeated"));

        let question = sample_question("Unknown answer?", "Z");
        assert!(question.validate().unwrap_err().contains("answer Z"));
    }

    #[test]
    fn test_selected_key() {
        assert_eq!(selected_key("C) something (with parens)"), "C");
        assert_eq!(selected_key(" D "), "D");
    }

    #[test]
    fn test_bank_rejects_duplicate_text() {
        let mut bank = QuestionBank::new();
        assert!(bank.insert(sample_question("Q1", "A")));
        assert!(!bank.insert(sample_question("Q1", "B")));
        assert!(bank.insert(sample_question("Q2", "C")));
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.get(0).map(|q| q.answer.as_str()), Some("A"));
    }

    #[test]
    fn test_bank_serializes_as_array() {
        let mut bank = QuestionBank::new();
        bank.insert(sample_question("Q1", "A"));
        let json = serde_json::to_string(&bank).unwrap();
        assert!(json.starts_with("[{\"question\":\"Q1\""));
    }

    #[test]
    fn test_choice_label_and_answer_position() {
        let question = sample_question("Q", "C");
        assert_eq!(question.choice_labels()[2], "C) option C");
        assert_eq!(question.answer_position(), Some(2));
    }
}
