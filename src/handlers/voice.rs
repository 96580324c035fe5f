use std::path::{Path, PathBuf};

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::utils::html::escape;
use uuid::Uuid;

use crate::ai::stt::SttClient;
use crate::controller::Controller;
use crate::messages;
use crate::utils::{download_telegram_file, try_send_typing};

use super::{respond, send_replies, user_lang};

/// Temporary file removed when the guard goes out of scope.
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    pub async fn create(dir: &Path, extension: &str) -> Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("voice-{}.{extension}", Uuid::new_v4()));
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::trace!(path = %self.path.display(), "Removed temp artifact"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => tracing::warn!(
                error = %err,
                path = %self.path.display(),
                "Failed to remove temp artifact",
            ),
        }
    }
}

/// Download and transcribe voice messages.
#[derive(Clone)]
pub struct VoicePipeline {
    stt: SttClient,
    temp_dir: PathBuf,
}

impl VoicePipeline {
    pub fn new(stt: SttClient, temp_dir: PathBuf) -> Self {
        Self { stt, temp_dir }
    }

    /// The temp file is gone once this returns, whatever the outcome.
    pub async fn transcribe(&self, bot: &Bot, file_id: &str) -> Result<String> {
        let artifact = TempArtifact::create(&self.temp_dir, "oga").await?;
        download_telegram_file(bot, file_id, artifact.path()).await?;
        let audio = tokio::fs::read(artifact.path()).await?;
        let file_name = artifact
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("voice.oga")
            .to_string();
        self.stt.transcribe(audio, &file_name).await
    }
}

pub async fn handle_voice_message(
    bot: Bot,
    msg: Message,
    controller: Controller,
    voice: VoicePipeline,
) -> Result<()> {
    let (Some(audio), Some(user)) = (msg.voice(), msg.from.as_ref()) else {
        return Ok(());
    };
    let lang = user_lang(user);
    let user_id = user.id.0 as i64;
    try_send_typing(&bot, msg.chat.id).await;

    let text = match voice.transcribe(&bot, &audio.file.id.to_string()).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(error = %err, user_id, "voice transcription failed");
            bot.send_message(msg.chat.id, messages::speech_not_recognized(lang))
                .await?;
            return Ok(());
        }
    };
    tracing::debug!(user_id, chars = text.chars().count(), "voice transcribed");

    let heard = crate::controller::Reply::text(messages::heard(lang, &escape(&text)));
    send_replies(&bot, msg.chat.id, &[heard]).await?;
    let result = controller.handle_text(user_id, lang, &text).await;
    respond(&bot, msg.chat.id, lang, result).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::config::AiConfig;
    use reqwest::Client;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("chefbot-test-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn artifact_is_removed_on_drop() -> Result<()> {
        let dir = temp_dir();
        let artifact = TempArtifact::create(&dir, "oga").await?;
        let path = artifact.path().to_path_buf();
        tokio::fs::write(&path, b"ogg").await?;
        assert!(path.exists());
        drop(artifact);
        assert!(!path.exists());
        tokio::fs::remove_dir_all(&dir).await?;
        Ok(())
    }

    #[tokio::test]
    async fn artifact_that_was_never_written_drops_quietly() -> Result<()> {
        let dir = temp_dir();
        let path = {
            let artifact = TempArtifact::create(&dir, "oga").await?;
            artifact.path().to_path_buf()
        };
        assert!(!path.exists());
        tokio::fs::remove_dir_all(&dir).await?;
        Ok(())
    }

    async fn mount_telegram_file(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/botTEST/GetFile"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"ok":true,"result":{"file_id":"f","file_unique_id":"u","file_path":"voice.oga"}}"#,
                "application/json",
            ))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/file/botTEST/voice.oga"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("ogg", "application/octet-stream"))
            .mount(server)
            .await;
    }

    fn pipeline(server: &MockServer, dir: PathBuf) -> VoicePipeline {
        let config = AiConfig {
            api_key: "k".into(),
            chat_model: "m".into(),
            stt_model: "whisper-large-v3".into(),
            chat_url: None,
            stt_url: Some(format!("{}/openai/v1/audio/transcriptions", server.uri())),
            timeout_secs: 5,
        };
        VoicePipeline::new(SttClient::new(&config).unwrap(), dir)
    }

    fn test_bot(server: &MockServer) -> Bot {
        let client = Client::builder().no_proxy().build().unwrap();
        Bot::with_client("TEST", client).set_api_url(reqwest::Url::parse(&server.uri()).unwrap())
    }

    async fn dir_is_empty(dir: &Path) -> bool {
        let mut entries = tokio::fs::read_dir(dir).await.unwrap();
        entries.next_entry().await.unwrap().is_none()
    }

    #[tokio::test]
    async fn transcribe_downloads_and_cleans_up() -> Result<()> {
        let server = MockServer::start().await;
        mount_telegram_file(&server).await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/audio/transcriptions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"text":"курица, рис"}"#, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = temp_dir();
        let text = pipeline(&server, dir.clone())
            .transcribe(&test_bot(&server), "f")
            .await?;
        assert_eq!(text, "курица, рис");
        assert!(dir_is_empty(&dir).await);
        tokio::fs::remove_dir_all(&dir).await?;
        Ok(())
    }

    #[tokio::test]
    async fn failed_transcription_still_cleans_up() -> Result<()> {
        let server = MockServer::start().await;
        mount_telegram_file(&server).await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = temp_dir();
        let result = pipeline(&server, dir.clone())
            .transcribe(&test_bot(&server), "f")
            .await;
        assert!(result.is_err());
        assert!(dir_is_empty(&dir).await);
        tokio::fs::remove_dir_all(&dir).await?;
        Ok(())
    }
}
