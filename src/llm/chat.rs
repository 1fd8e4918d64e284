//! OpenAI-compatible `/chat/completions` client.
//!
//! Works against OpenAI itself and against local servers that expose the
//! same API (Ollama's `/v1`, LM Studio).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::{QuizError, Result};

use super::GenerativeModel;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

pub struct ChatClient {
    client: Client,
    config: ModelConfig,
}

impl ChatClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QuizError::transport("model", e))?;

        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        }
    }
}

impl GenerativeModel for ChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut request = self.client.post(self.url()).json(&self.body(prompt));
        if let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(api_key);
        }

        tracing::debug!("requesting completion from {} ({})", self.url(), self.config.model);
        let response = request
            .send()
            .await
            .map_err(|e| QuizError::transport("model", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuizError::transport(
                "model",
                format!("server returned {}: {}", status, body.trim()),
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| QuizError::transport("model", e))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| QuizError::transport("model", "response contained no message"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let client = ChatClient::new(ModelConfig::default()).unwrap();
        let body = serde_json::to_value(client.body("make a question")).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "make a question");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn test_response_parsing() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"id": "x", "choices": [{"index": 0, "message": {"role": "assistant", "content": "{}"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{}"));
    }

    #[test]
    fn test_url() {
        let client = ChatClient::new(ModelConfig {
            base_url: "http://localhost:1234/v1/".to_string(),
            ..ModelConfig::default()
        })
        .unwrap();
        assert_eq!(client.url(), "http://localhost:1234/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_failure() {
        let client = ChatClient::new(ModelConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..ModelConfig::default()
        })
        .unwrap();

        let result = client.complete("hello").await;
        assert!(matches!(result, Err(QuizError::Transport { service: "model", .. })));
    }
}
