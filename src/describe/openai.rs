//! OpenAI chat-completions vision describer.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{ContentDescriber, DocumentImage};
use crate::error::DescribeError;

/// Instruction sent alongside every document image.
pub const NAMING_PROMPT: &str = "You are looking at a scanned document. Suggest a clear, concise \
filename based on its content. The filename should be descriptive and include key information \
like document type, company names, dates, or subject matter. Use underscores instead of spaces. \
Do NOT include the file extension. Respond with ONLY the suggested filename, no explanations or \
additional text.";

const MAX_TOKENS: u32 = 50;
const TEMPERATURE: f32 = 0.3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Describer backed by an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiDescriber {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiDescriber {
    /// Create a describer for `model` at `api_base` (e.g. `https://api.openai.com/v1`).
    ///
    /// # Errors
    ///
    /// Returns [`DescribeError::Request`] if the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_base: &str,
    ) -> Result<Self, DescribeError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
        })
    }

    /// Model name sent with each request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Full URL of the completions endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, image: &DocumentImage) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": NAMING_PROMPT},
                    {"type": "image_url", "image_url": {"url": image.to_data_url()}}
                ]
            }],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE
        })
    }
}

impl std::fmt::Debug for OpenAiDescriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiDescriber")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// Pull the proposed title out of a completions response body.
fn parse_title(body: &str) -> Result<String, DescribeError> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| DescribeError::InvalidResponse(e.to_string()))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    let title = clean_reply(&content);
    if title.is_empty() {
        return Err(DescribeError::EmptyResponse);
    }
    Ok(title.to_string())
}

/// First line of the reply without surrounding quotes or backticks.
fn clean_reply(content: &str) -> &str {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim()
}

#[async_trait]
impl ContentDescriber for OpenAiDescriber {
    async fn describe(&self, image: &DocumentImage) -> Result<String, DescribeError> {
        tracing::debug!(model = %self.model, bytes = image.bytes.len(), "Requesting title");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(image))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Describer returned an error status");
            return Err(DescribeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let title = parse_title(&body)?;
        tracing::debug!(title = %title, "Received title");
        Ok(title)
    }
}
