use async_trait::async_trait;
use reqwest::{header, Client, ClientBuilder};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::configuration::SummarizerSettings;
use crate::utils::truncate_graphemes;

pub const NO_SUMMARY: &str = "No summary available";

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// A short summary of `text`. Degrades to [`fallback_summary`]; never fails.
    async fn summarize(&self, text: &str) -> String;
}

/// The first `max_chars` characters of `text`, or [`NO_SUMMARY`] when empty.
pub fn fallback_summary(text: &str, max_chars: usize) -> String {
    if text.is_empty() {
        NO_SUMMARY.to_string()
    } else {
        truncate_graphemes(text, max_chars)
    }
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionSummarizer {
    http_client: Client,
    endpoint: String,
    api_key: Secret<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    fallback_chars: usize,
    source_name: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl ChatCompletionSummarizer {
    pub fn new(config: &SummarizerSettings, source_name: impl Into<String>) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            "application/json"
                .parse()
                .map_err(|e| anyhow::anyhow!("Failed to parse accept header: {e}"))?,
        );

        let http_client = ClientBuilder::new()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            fallback_chars: config.fallback_chars,
            source_name: source_name.into(),
        })
    }

    fn prompt(&self, text: &str) -> String {
        format!(
            "Summarize the following article from \"{}\" in under 100 words. \
             Use plain, easy-to-read language, focus on the core product and \
             internet-industry insight, and add no filler:\n{text}",
            self.source_name
        )
    }

    async fn request_summary(&self, text: &str) -> anyhow::Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: self.prompt(text),
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response: ChatResponse = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to reach the completion endpoint. {e}"))?
            .error_for_status()
            .map_err(|e| anyhow::anyhow!("The completion endpoint rejected the request. {e}"))?
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Unexpected completion response. {e}"))?;

        let summary = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("The completion response has no choices"))?;
        if summary.is_empty() {
            anyhow::bail!("The completion response is empty");
        }
        Ok(summary)
    }
}

#[async_trait]
impl Summarizer for ChatCompletionSummarizer {
    #[tracing::instrument(name = "Summarize article", skip(self))]
    async fn summarize(&self, text: &str) -> String {
        match self.request_summary(text).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(error.cause_chain = ?e, "Summarization failed. Falling back to truncation");
                fallback_summary(text, self.fallback_chars)
            }
        }
    }
}
