use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BankError, Result};
use crate::settings::AiSettings;

/// A remote text-completion backend.
pub trait Completion {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Client for the OpenAI Responses API.
pub struct OpenAiClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    max_output_tokens: u32,
    api_key: String,
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: &str, model: &str, max_output_tokens: u32, timeout_secs: u64, api_key: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/v1/responses", base_url.trim_end_matches('/')),
            model: model.to_string(),
            max_output_tokens,
            api_key: api_key.to_string(),
        })
    }

    pub fn from_settings(ai: &AiSettings) -> Result<Self> {
        let api_key = ai
            .resolved_api_key()
            .ok_or_else(|| BankError::RemoteService("no API key configured (set OPENAI_API_KEY)".to_string()))?;
        Self::new(&ai.base_url, &ai.model, ai.max_output_tokens, ai.timeout_secs, &api_key)
    }
}

impl Completion for OpenAiClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "sending completion request");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&ResponsesRequest {
                model: &self.model,
                input: prompt,
                max_output_tokens: self.max_output_tokens,
            })
            .send()?;

        let status = response.status();
        tracing::debug!(%status, "completion response");
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BankError::RemoteService(format!("HTTP {status}: {}", body.trim())));
        }

        let reply: ResponsesReply = response.json()?;
        reply
            .output
            .into_iter()
            .flat_map(|item| item.content)
            .find_map(|part| part.text)
            .ok_or_else(|| BankError::RemoteService("response contained no text".to_string()))
    }
}

/// Stands in when no client could be built, so the failure surfaces as a reply.
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl Completion for Unavailable {
    fn complete(&self, _prompt: &str) -> Result<String> {
        Err(BankError::RemoteService(self.reason.clone()))
    }
}
