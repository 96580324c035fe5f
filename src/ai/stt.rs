use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, instrument, trace};

use crate::ai::common::send_openai_request;
use crate::ai::config::AiConfig;

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

pub const DEFAULT_STT_URL: &str = "https://api.groq.com/openai/v1/audio/transcriptions";

/// Hint passed to the transcription model.
pub const DEFAULT_PROMPT: &str =
    "The speaker lists food products or asks for a recipe. Keep product names exactly as spoken.";

#[derive(Clone)]
pub struct SttClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl SttClient {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.stt_model.clone(),
            url: config
                .stt_url
                .clone()
                .unwrap_or_else(|| DEFAULT_STT_URL.to_string()),
        })
    }

    /// Transcribe an audio clip. An empty transcript is an error.
    #[instrument(level = "trace", skip(self, bytes))]
    pub async fn transcribe(&self, bytes: Vec<u8>, file_name: &str) -> Result<String> {
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("prompt", DEFAULT_PROMPT);

        debug!(model = %self.model, url = %self.url, "sending transcription request");

        let builder = self.client.post(&self.url).multipart(form);
        let resp = send_openai_request(&self.api_key, builder).await?;

        let raw = resp.text().await?;
        let snippet: String = raw.chars().take(200).collect();
        debug!(snippet = %snippet, "transcription response body");
        let data: TranscriptionResponse = serde_json::from_str(&raw)?;
        let text = data.text.trim().to_string();
        if text.is_empty() {
            return Err(anyhow!("empty transcription"));
        }
        trace!(transcription = %text, "transcription successful");
        Ok(text)
    }
}
