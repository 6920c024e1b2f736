//! Generative text model collaborators.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenerationError;

pub const DEFAULT_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/google/flan-t5-base";

/// Decoding settings passed through to the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationParams {
    pub max_length: usize,
    pub num_beams: usize,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 150,
            num_beams: 4,
            temperature: 0.7,
        }
    }
}

/// Anything that turns a prompt into free-form text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

/// Client for a Hugging Face Inference style text2text endpoint.
pub struct HttpTextGenerator {
    client: Client,
    url: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParams,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

impl HttpTextGenerator {
    pub fn from_config(config: &ModelConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            inputs: prompt,
            parameters: params,
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        debug!(url = %self.url, "sending prompt to text model");
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Response(e.to_string()))?;

        match parsed {
            GenerateResponse::Single(output) => Ok(output.generated_text),
            GenerateResponse::Batch(outputs) => outputs
                .into_iter()
                .next()
                .map(|output| output.generated_text)
                .ok_or_else(|| GenerationError::Response("empty generation list".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn config_for(server: &MockServer, token: Option<&str>) -> ModelConfig {
        ModelConfig {
            url: server.url("/models/flan"),
            token: token.map(str::to_string),
            timeout_secs: 5,
        }
    }

    #[test]
    fn default_params_match_decoding_settings() {
        let params = GenerationParams::default();
        assert_eq!(params.max_length, 150);
        assert_eq!(params.num_beams, 4);
        assert!((params.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn posts_prompt_and_reads_batch_reply() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/flan")
                    .header("authorization", "Bearer secret")
                    .body_includes("\"inputs\":\"hello\"")
                    .body_includes("\"max_length\":150")
                    .body_includes("\"num_beams\":4")
                    .body_includes("\"temperature\":0.7");
                then.status(200)
                    .json_body(serde_json::json!([{ "generated_text": "hi there" }]));
            })
            .await;

        let generator = HttpTextGenerator::from_config(&config_for(&server, Some("secret"))).unwrap();
        let text = generator
            .generate("hello", &GenerationParams::default())
            .await
            .unwrap();

        assert_eq!(text, "hi there");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn accepts_single_object_reply() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/flan");
                then.status(200)
                    .json_body(serde_json::json!({ "generated_text": "single" }));
            })
            .await;

        let generator = HttpTextGenerator::from_config(&config_for(&server, None)).unwrap();
        let text = generator
            .generate("prompt", &GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(text, "single");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/flan");
                then.status(503).body("model loading");
            })
            .await;

        let generator = HttpTextGenerator::from_config(&config_for(&server, None)).unwrap();
        let err = generator
            .generate("prompt", &GenerationParams::default())
            .await
            .unwrap_err();

        match err {
            GenerationError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "model loading");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_batch_is_a_response_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/flan");
                then.status(200).json_body(serde_json::json!([]));
            })
            .await;

        let generator = HttpTextGenerator::from_config(&config_for(&server, None)).unwrap();
        let err = generator
            .generate("prompt", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Response(_)));
    }
}
