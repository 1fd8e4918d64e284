//! The question generation loop.

use crate::index::Retriever;
use crate::llm::GenerativeModel;
use crate::models::QuestionBank;
use crate::{QuizError, Result};

use super::candidate::{accept, parse_candidate, CandidateError};
use super::prompt::{normalize_topic, render_prompt};

/// Largest bank a single request may ask for.
pub const MAX_QUESTIONS: usize = 10;

/// Parse/validate attempts made on each model response.
pub const RETRIES_PER_QUESTION: usize = 3;

/// Counters for one generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub model_calls: usize,
    pub parse_failures: usize,
    /// Parsed candidates turned away (missing question, duplicate, bad shape).
    pub rejected: usize,
    /// Model responses that used up every attempt without being accepted.
    pub exhausted_rounds: usize,
}

#[derive(Debug, Clone)]
pub struct Generation {
    pub bank: QuestionBank,
    pub stats: GenerationStats,
}

pub fn check_question_count(num_questions: usize) -> Result<()> {
    if num_questions > MAX_QUESTIONS {
        return Err(QuizError::InvalidConfiguration(format!(
            "number of questions cannot exceed {}",
            MAX_QUESTIONS
        )));
    }
    if num_questions == 0 {
        return Err(QuizError::InvalidConfiguration(
            "number of questions must be at least 1".to_string(),
        ));
    }
    Ok(())
}

pub struct QuizGenerator<M, R> {
    topic: String,
    num_questions: usize,
    model: M,
    retriever: Option<R>,
    retries_per_question: usize,
    max_rounds: Option<usize>,
}

impl<M: GenerativeModel, R: Retriever> QuizGenerator<M, R> {
    /// Fails with [`QuizError::InvalidConfiguration`] unless
    /// `1 <= num_questions <= MAX_QUESTIONS`.
    pub fn new(topic: &str, num_questions: usize, model: M, retriever: Option<R>) -> Result<Self> {
        check_question_count(num_questions)?;

        Ok(Self {
            topic: normalize_topic(topic),
            num_questions,
            model,
            retriever,
            retries_per_question: RETRIES_PER_QUESTION,
            max_rounds: None,
        })
    }

    pub fn with_retries(mut self, retries_per_question: usize) -> Self {
        self.retries_per_question = retries_per_question.max(1);
        self
    }

    /// Cap the number of model calls for the whole request. `None` keeps
    /// asking until the bank is full.
    pub fn with_max_rounds(mut self, max_rounds: Option<usize>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn num_questions(&self) -> usize {
        self.num_questions
    }

    /// Retrieve context for the topic and ask the model for one question.
    ///
    /// Returns the raw response text.
    pub async fn generate_question_with_context(&self) -> Result<String> {
        let retriever = self.retriever.as_ref().ok_or(QuizError::MissingContext)?;
        let context = retriever.retrieve(&self.topic).await?;
        let prompt = render_prompt(&self.topic, &context);
        self.model.complete(&prompt).await
    }

    /// Build a bank of exactly `num_questions` unique questions.
    pub async fn generate_quiz(&self) -> Result<Generation> {
        if self.retriever.is_none() {
            return Err(QuizError::MissingContext);
        }

        let mut bank = QuestionBank::new();
        let mut stats = GenerationStats::default();
        tracing::info!(
            "Generating {} questions for topic: {}",
            self.num_questions,
            self.topic
        );

        while bank.len() < self.num_questions {
            if let Some(max_rounds) = self.max_rounds {
                if stats.model_calls >= max_rounds {
                    tracing::warn!(
                        "Giving up after {} model calls with {}/{} questions",
                        stats.model_calls,
                        bank.len(),
                        self.num_questions
                    );
                    return Err(QuizError::GenerationExhausted {
                        rounds: stats.model_calls,
                        accepted: bank.len(),
                        requested: self.num_questions,
                    });
                }
            }

            let raw = self.generate_question_with_context().await?;
            stats.model_calls += 1;
            tracing::debug!("model response: {}", raw);

            let mut retry_count = 0;
            while retry_count < self.retries_per_question {
                let candidate = match parse_candidate(&raw) {
                    Ok(candidate) => candidate,
                    Err(e) => {
                        tracing::warn!("Failed to decode question JSON: {}", e);
                        stats.parse_failures += 1;
                        retry_count += 1;
                        continue;
                    }
                };

                match accept(candidate, &bank) {
                    Ok(question) => {
                        bank.insert(question);
                        tracing::info!(
                            "Successfully generated unique question ({}/{})",
                            bank.len(),
                            self.num_questions
                        );
                        break;
                    }
                    Err(e) => {
                        log_rejection(&e);
                        stats.rejected += 1;
                        retry_count += 1;
                    }
                }
            }

            if retry_count >= self.retries_per_question {
                tracing::warn!("Max retries reached for generating a question. Skipping.");
                stats.exhausted_rounds += 1;
            }
        }

        Ok(Generation { bank, stats })
    }
}

fn log_rejection(error: &CandidateError) {
    match error {
        CandidateError::Duplicate(_) => tracing::warn!("Duplicate question detected"),
        other => tracing::warn!("Invalid question detected: {}", other),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use super::*;

    pub(crate) fn question_json(text: &str) -> String {
        serde_json::json!({
            "question": text,
            "choices": [
                {"key": "A", "value": "one"},
                {"key": "B", "value": "two"},
                {"key": "C", "value": "three"},
                {"key": "D", "value": "four"}
            ],
            "answer": "C",
            "explanation": format!("because {}", text)
        })
        .to_string()
    }

    /// Plays back a fixed list of responses, then repeats `fallback`.
    pub(crate) struct ScriptedModel {
        responses: RefCell<VecDeque<Result<String>>>,
        fallback: Option<String>,
        pub calls: Cell<usize>,
        pub prompts: RefCell<Vec<String>>,
    }

    impl ScriptedModel {
        pub(crate) fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                fallback: None,
                calls: Cell::new(0),
                prompts: RefCell::new(Vec::new()),
            }
        }

        pub(crate) fn ok(responses: &[&str]) -> Self {
            Self::new(responses.iter().map(|r| Ok(r.to_string())).collect())
        }

        pub(crate) fn unique(count: usize) -> Self {
            Self::new(
                (0..count)
                    .map(|i| Ok(question_json(&format!("Question {}?", i))))
                    .collect(),
            )
        }

        pub(crate) fn repeating(mut self, fallback: String) -> Self {
            self.fallback = Some(fallback);
            self
        }
    }

    impl GenerativeModel for ScriptedModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            self.prompts.borrow_mut().push(prompt.to_string());
            match self.responses.borrow_mut().pop_front() {
                Some(response) => response,
                None => self
                    .fallback
                    .clone()
                    .ok_or_else(|| QuizError::transport("model", "script exhausted")),
            }
        }
    }

    pub(crate) struct FixedContext(pub &'static str);

    impl Retriever for FixedContext {
        async fn retrieve(&self, _topic: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn generator(
        count: usize,
        model: &ScriptedModel,
    ) -> QuizGenerator<&ScriptedModel, FixedContext> {
        QuizGenerator::new("Biology", count, model, Some(FixedContext("cells"))).unwrap()
    }

    #[tokio::test]
    async fn test_generates_requested_count() {
        for count in 1..=MAX_QUESTIONS {
            let model = ScriptedModel::unique(count);
            let generation = generator(count, &model).generate_quiz().await.unwrap();

            assert_eq!(generation.bank.len(), count);
            assert_eq!(generation.stats.model_calls, count);
            for question in &generation.bank {
                assert_eq!(question.choices.len(), 4);
                assert!(question.answer_position().is_some());
                assert!(!question.question.is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_too_many_questions_makes_no_calls() {
        let model = ScriptedModel::unique(11);
        let result = QuizGenerator::new("Biology", 11, &model, Some(FixedContext("cells")));

        assert!(matches!(result, Err(QuizError::InvalidConfiguration(_))));
        assert_eq!(model.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_zero_questions_rejected() {
        let model = ScriptedModel::unique(0);
        let result = QuizGenerator::new("Biology", 0, &model, Some(FixedContext("cells")));
        assert!(matches!(result, Err(QuizError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_empty_topic_uses_default() {
        let model = ScriptedModel::unique(1);
        let generator = QuizGenerator::new("", 1, &model, Some(FixedContext("cells"))).unwrap();
        assert_eq!(generator.topic(), "General Knowledge");

        generator.generate_quiz().await.unwrap();
        let prompts = model.prompts.borrow();
        assert!(prompts[0].contains("on the topic: General Knowledge"));
        assert!(prompts[0].contains("Context: cells"));
    }

    #[tokio::test]
    async fn test_duplicates_then_unique_terminates() {
        let first = question_json("Same?");
        let second = question_json("Different?");
        let model = ScriptedModel::ok(&[first.as_str(), first.as_str(), first.as_str(), second.as_str()]);

        let generation = generator(2, &model).generate_quiz().await.unwrap();

        assert_eq!(generation.bank.len(), 2);
        assert_eq!(generation.bank.get(0).unwrap().question, "Same?");
        assert_eq!(generation.bank.get(1).unwrap().question, "Different?");
        assert_eq!(generation.stats.model_calls, 4);
        // Each duplicate response is re-checked three times before re-querying.
        assert_eq!(generation.stats.rejected, 6);
        assert_eq!(generation.stats.exhausted_rounds, 2);
    }

    #[tokio::test]
    async fn test_unparsable_response_checked_three_times_then_requeried() {
        let valid = question_json("Valid?");
        let model = ScriptedModel::ok(&["not json at all", valid.as_str()]);

        let generation = generator(1, &model).generate_quiz().await.unwrap();

        assert_eq!(generation.stats.parse_failures, 3);
        assert_eq!(generation.stats.model_calls, 2);
        assert_eq!(model.calls.get(), 2);
        assert_eq!(generation.stats.exhausted_rounds, 1);
        assert_eq!(generation.bank.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_shape_is_retried() {
        let bad = r#"{"question": "Only two?", "choices": [{"key": "A", "value": "x"}, {"key": "B", "value": "y"}], "answer": "A", "explanation": ""}"#;
        let good = question_json("Four choices?");
        let model = ScriptedModel::ok(&[bad, good.as_str()]);

        let generation = generator(1, &model).generate_quiz().await.unwrap();
        assert_eq!(generation.bank.get(0).unwrap().question, "Four choices?");
        assert_eq!(generation.stats.rejected, 3);
    }

    #[tokio::test]
    async fn test_transport_failure_is_fatal() {
        let model = ScriptedModel::new(vec![
            Ok(question_json("First?")),
            Err(QuizError::transport("model", "quota exceeded")),
        ]);

        let result = generator(3, &model).generate_quiz().await;
        assert!(matches!(result, Err(QuizError::Transport { .. })));
        assert_eq!(model.calls.get(), 2);
    }

    #[tokio::test]
    async fn test_missing_retriever() {
        let model = ScriptedModel::unique(1);
        let generator =
            QuizGenerator::<_, FixedContext>::new("Biology", 1, &model, None).unwrap();

        assert!(matches!(
            generator.generate_quiz().await,
            Err(QuizError::MissingContext)
        ));
        assert_eq!(model.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_round_cap_stops_endless_duplicates() {
        let model = ScriptedModel::ok(&[]).repeating(question_json("Always the same?"));
        let generator = generator(2, &model).with_max_rounds(Some(5));

        match generator.generate_quiz().await {
            Err(QuizError::GenerationExhausted {
                rounds,
                accepted,
                requested,
            }) => {
                assert_eq!(rounds, 5);
                assert_eq!(accepted, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("expected exhaustion, got {:?}", other.map(|g| g.stats)),
        }
        assert_eq!(model.calls.get(), 5);
    }
}
