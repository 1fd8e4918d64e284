//! OpenAI-compatible `/embeddings` client.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::{QuizError, Result};

use super::EmbeddingPort;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

pub struct EmbeddingClient {
    client: Client,
    config: EmbeddingConfig,
}

impl EmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QuizError::transport("embedding", e))?;

        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!("{}/embeddings", self.config.base_url.trim_end_matches('/'))
    }

    async fn request(&self, input: &[String]) -> Result<std::result::Result<Vec<Vec<f32>>, StatusCode>> {
        let mut request = self.client.post(self.url()).json(&EmbeddingRequest {
            model: &self.config.model,
            input,
        });
        if let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| QuizError::transport("embedding", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("embedding request failed with {}: {}", status, body);
            return Ok(Err(status));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| QuizError::transport("embedding", e))?;
        parsed.data.sort_by_key(|d| d.index);

        Ok(Ok(parsed.data.into_iter().map(|d| d.embedding).collect()))
    }
}

impl EmbeddingPort for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = [text.to_string()];
        match self.request(&input).await? {
            Ok(vectors) => vectors.into_iter().next().ok_or_else(|| {
                QuizError::transport("embedding", "response contained no embedding")
            }),
            Err(status) => Err(QuizError::transport(
                "embedding",
                format!("server returned {}", status),
            )),
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Option<Vec<Vec<f32>>>> {
        if !self.config.batch {
            return Ok(None);
        }

        match self.request(texts).await? {
            Ok(vectors) => Ok(Some(vectors)),
            // Some local servers only accept a single string as input.
            Err(StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::NOT_IMPLEMENTED) => {
                tracing::warn!("embedding server rejected batch input, falling back to single requests");
                Ok(None)
            }
            Err(status) => Err(QuizError::transport(
                "embedding",
                format!("server returned {}", status),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_trims_trailing_slash() {
        let client = EmbeddingClient::new(EmbeddingConfig {
            base_url: "http://localhost:11434/v1/".to_string(),
            ..EmbeddingConfig::default()
        })
        .unwrap();
        assert_eq!(client.url(), "http://localhost:11434/v1/embeddings");
    }

    #[test]
    fn test_request_body_shape() {
        let input = vec!["a".to_string(), "b".to_string()];
        let body = serde_json::to_value(EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &input,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"model": "text-embedding-3-small", "input": ["a", "b"]})
        );
    }

    #[test]
    fn test_response_parsing_orders_by_index() {
        let mut parsed: EmbeddingResponse = serde_json::from_str(
            r#"{"data": [{"embedding": [2.0], "index": 1}, {"embedding": [1.0], "index": 0}]}"#,
        )
        .unwrap();
        parsed.data.sort_by_key(|d| d.index);
        assert_eq!(parsed.data[0].embedding, vec![1.0]);
    }

    #[tokio::test]
    async fn test_batch_disabled_returns_none() {
        let client = EmbeddingClient::new(EmbeddingConfig {
            batch: false,
            ..EmbeddingConfig::default()
        })
        .unwrap();
        let result = client.embed_batch(&["x".to_string()]).await.unwrap();
        assert!(result.is_none());
    }
}
