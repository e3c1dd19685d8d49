//! Single-shot completion requests against the Gemini `generateContent` API.
//!
//! A [`CompletionClient`] performs exactly one network attempt per call and
//! classifies what comes back: generated text, a transport failure carrying
//! the server's own message when it sent one, or a malformed payload.

use crate::api::{GenerateContentRequest, GenerateContentResponse};
use crate::core::constants::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, GENERIC_API_FAILURE, MALFORMED_RESPONSE_MESSAGE,
};
use crate::utils::url::generate_content_url;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::error::Error;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// The request did not complete or the endpoint answered with a
    /// non-success status. `status` is `None` for connection-level failures.
    Transport {
        status: Option<StatusCode>,
        message: String,
    },
    /// A success status whose body lacks `candidates[0].content.parts[0].text`.
    MalformedResponse,
}

impl CompletionError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> &str {
        match self {
            CompletionError::Transport { message, .. } => message,
            CompletionError::MalformedResponse => MALFORMED_RESPONSE_MESSAGE,
        }
    }
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_message())
    }
}

impl Error for CompletionError {}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str, credential: &str) -> Result<String, CompletionError>;
}

/// Endpoint coordinates for [`GeminiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiEndpoint {
    pub base_url: String,
    pub model: String,
}

impl Default for GeminiEndpoint {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl GeminiEndpoint {
    pub fn url(&self) -> String {
        generate_content_url(&self.base_url, &self.model)
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: GeminiEndpoint,
}

impl GeminiClient {
    pub fn new(endpoint: GeminiEndpoint) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: GeminiEndpoint) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str, credential: &str) -> Result<String, CompletionError> {
        let url = self.endpoint.url();
        debug!(%url, model = %self.endpoint.model, prompt_len = prompt.len(), "sending completion request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", credential)])
            .header("Content-Type", "application/json")
            .json(&GenerateContentRequest::single_prompt(prompt))
            .send()
            .await
            .map_err(|err| CompletionError::Transport {
                status: None,
                message: describe_transport_error(&err),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| CompletionError::Transport {
                status: Some(status),
                message: describe_transport_error(&err),
            })?;

        if !status.is_success() {
            let message = extract_error_summary(&body)
                .filter(|summary| !summary.is_empty())
                .unwrap_or_else(|| GENERIC_API_FAILURE.to_string());
            debug!(%status, %message, "completion request rejected");
            return Err(CompletionError::Transport {
                status: Some(status),
                message,
            });
        }

        parse_completion(&body)
    }
}

/// Extract the generated text from a success body.
pub fn parse_completion(body: &str) -> Result<String, CompletionError> {
    let parsed: GenerateContentResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(error = %err, "completion body is not a generateContent response");
            return Err(CompletionError::MalformedResponse);
        }
    };
    parsed
        .first_text()
        .map(str::to_owned)
        .ok_or(CompletionError::MalformedResponse)
}

/// Pull `error.message` (or a bare `error`/`message` string) out of an error
/// body, collapsing internal whitespace.
fn extract_error_summary(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
