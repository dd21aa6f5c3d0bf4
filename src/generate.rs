//! Optional generative answer sources.
//!
//! An [`AnswerSource`] may produce a free-form answer for a question given
//! plain-text recipe context. Returning `Ok(None)` means "no usable
//! answer"; the caller then falls back to the intent-based answerer.
//!
//! Two sources exist:
//!
//! - [`DisabledSource`] never answers. It is the default.
//! - [`OpenAiSource`] calls an OpenAI-compatible chat completions API.
//!
//! # Retry
//!
//! The OpenAI source retries transient failures with exponential backoff
//! (1s, 2s, 4s, ...):
//! - HTTP 429 and 5xx: retry
//! - other HTTP 4xx: fail immediately
//! - network errors: retry

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AnswerConfig;

#[async_trait]
pub trait AnswerSource: Send + Sync {
    /// Short identifier, e.g. `"openai"`.
    fn name(&self) -> &str;

    /// Produce an answer, or `None` when the source has nothing usable.
    async fn generate(&self, question: &str, context: Option<&str>) -> Result<Option<String>>;
}

pub struct DisabledSource;

#[async_trait]
impl AnswerSource for DisabledSource {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _question: &str, _context: Option<&str>) -> Result<Option<String>> {
        Ok(None)
    }
}

pub struct OpenAiSource {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    system_prompt: String,
    max_retries: u32,
    min_answer_chars: usize,
}

impl OpenAiSource {
    pub fn new(config: &AnswerConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            max_retries: config.max_retries,
            min_answer_chars: config.min_answer_chars,
        })
    }

    fn request_body(&self, question: &str, context: Option<&str>) -> Value {
        let user = match context {
            Some(context) => format!("{}\n\nQuestion: {}", context, question),
            None => question.to_string(),
        };
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": self.system_prompt },
                { "role": "user", "content": user },
            ],
        })
    }
}

#[async_trait]
impl AnswerSource for OpenAiSource {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, question: &str, context: Option<&str>) -> Result<Option<String>> {
        let body = self.request_body(question, context);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                debug!(attempt, delay_secs = delay.as_secs(), "retrying chat completion");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&self.endpoint)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: Value = response.json().await?;
                        let answer = parse_chat_response(&json)?;
                        return Ok(accept_answer(answer, self.min_answer_chars));
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        warn!(%status, attempt, "chat completion failed, will retry");
                        last_err = Some(anyhow::anyhow!(
                            "OpenAI API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    bail!("OpenAI API error {}: {}", status, body_text);
                }
                Err(e) => {
                    warn!(error = %e, attempt, "chat completion request failed");
                    last_err = Some(e.into());
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Chat completion failed after retries")))
    }
}

/// Extract `choices[0].message.content` from a chat completions response.
pub fn parse_chat_response(json: &Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid chat response: missing choices[0].message.content"))
}

/// Trim a generated answer and drop it when it is too short to be useful.
pub fn accept_answer(answer: String, min_chars: usize) -> Option<String> {
    let trimmed = answer.trim();
    if trimmed.chars().count() <= min_chars {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Build the source named by `config.provider`.
///
/// The OpenAI key is read from `OPENAI_API_KEY` once, here.
pub fn create_source(config: &AnswerConfig) -> Result<Box<dyn AnswerSource>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledSource)),
        "openai" => {
            let api_key = std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;
            Ok(Box::new(OpenAiSource::new(config, api_key)?))
        }
        other => bail!("Unknown answer provider: '{}'", other),
    }
}
