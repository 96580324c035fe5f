use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, trace, warn};

use crate::ai::config::AiConfig;

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

pub const DEFAULT_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Phrases that mark an upstream refusal instead of an answer.
const REFUSAL_MARKERS: [&str; 6] = [
    "cannot fulfill",
    "against policy",
    "kitchen closed",
    "i can't help",
    "не могу",
    "⛔",
];

pub fn build_text_chat_body(
    model: &str,
    system: &str,
    user: &str,
    temperature: f64,
    max_tokens: u32,
) -> Value {
    json!({
        "model": model,
        "temperature": temperature,
        "max_tokens": max_tokens,
        "messages": [
            { "role": "system", "content": system },
            { "role": "user", "content": user }
        ]
    })
}

/// Attach the bearer token, send, and turn a non-2xx status into an error.
pub async fn send_openai_request(
    api_key: &str,
    builder: reqwest::RequestBuilder,
) -> Result<reqwest::Response> {
    let resp = builder.bearer_auth(api_key).send().await?;
    if !resp.status().is_success() {
        let status = resp.status();
        let err_text = resp.text().await.unwrap_or_default();
        warn!(%status, "AI API error");
        return Err(anyhow!("AI API error {status}: {err_text}"));
    }
    Ok(resp)
}

/// Extract the first choice's message content from a chat completion body.
pub fn parse_chat_content(raw: &str) -> Result<String> {
    let chat: ChatResponse = serde_json::from_str(raw)?;
    let content = chat
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("missing chat choice"))?
        .message
        .content
        .unwrap_or_default();
    Ok(content.trim().to_string())
}

/// Cut the JSON payload out of surrounding prose.
///
/// Code fences are removed, then the span from the first `{`/`[` to the last
/// `}`/`]` is returned. Without such a span the trimmed text comes back as is.
pub fn extract_json(text: &str) -> String {
    let text = text.replace("```json", "").replace("```", "");
    let start = match (text.find('{'), text.find('[')) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    let end = match (text.rfind('}'), text.rfind(']')) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    match (start, end) {
        (Some(start), Some(end)) if end > start => text[start..=end].to_string(),
        _ => text.trim().to_string(),
    }
}

pub fn is_refusal(text: &str) -> bool {
    let lowered = text.to_lowercase();
    REFUSAL_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Thin client for an OpenAI-compatible chat completion endpoint.
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl ChatClient {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.chat_model.clone(),
            url: config
                .chat_url
                .clone()
                .unwrap_or_else(|| DEFAULT_CHAT_URL.to_string()),
        })
    }

    #[instrument(level = "trace", skip(self, system, user))]
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String> {
        let body = build_text_chat_body(&self.model, system, user, temperature, max_tokens);
        debug!(url = %self.url, model = %self.model, "sending chat completion request");

        let builder = self.client.post(&self.url).json(&body);
        let resp = send_openai_request(&self.api_key, builder).await?;

        let raw = resp.text().await?;
        let snippet: String = raw.chars().take(200).collect();
        debug!(snippet = %snippet, "chat response body");
        trace!(raw = %raw, "chat response");
        parse_chat_content(&raw)
    }
}
