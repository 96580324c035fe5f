use std::env;

pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_STT_MODEL: &str = "whisper-large-v3";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub chat_model: String,
    pub stt_model: String,
    pub chat_url: Option<String>,
    pub stt_url: Option<String>,
    pub timeout_secs: u64,
}

impl AiConfig {
    /// `GROQ_API_KEY` wins over `OPENAI_API_KEY`; without either the bot has
    /// no generator.
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("GROQ_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        Some(Self {
            api_key,
            chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            stt_model: env::var("STT_MODEL").unwrap_or_else(|_| DEFAULT_STT_MODEL.to_string()),
            chat_url: env::var("CHAT_URL").ok(),
            stt_url: env::var("STT_URL").ok(),
            timeout_secs: env::var("AI_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }
}
