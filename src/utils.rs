use std::path::Path;

use anyhow::Result;
use futures_util::StreamExt;
use teloxide::{net::Download, prelude::*, types::ChatAction};
use tokio::io::AsyncWriteExt;

/// Show the "typing…" indicator and log a warning on failure.
pub async fn try_send_typing(bot: &Bot, chat_id: ChatId) {
    if let Err(err) = bot.send_chat_action(chat_id, ChatAction::Typing).await {
        tracing::warn!(
            error = %err,
            chat_id = chat_id.0,
            "Failed to send chat action",
        );
    }
}

/// Stream a Telegram file to `dest` and return the number of bytes written.
pub async fn download_file_to(bot: &Bot, path: &str, dest: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = bot.download_file_stream(path);
    let mut size = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        size += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    tracing::trace!(size, dest = %dest.display(), "downloaded file bytes");
    Ok(size)
}

/// Fetch a Telegram file by its `file_id` into `dest`.
pub async fn download_telegram_file(bot: &Bot, file_id: &str, dest: &Path) -> Result<u64> {
    let file = bot.get_file(file_id).await?;
    tracing::debug!(path = %file.path, "Downloading Telegram file");
    let size = download_file_to(bot, &file.path, dest).await?;
    tracing::debug!(path = %file.path, size, "Finished download");
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use reqwest::Client;
    use wiremock::{
        matchers::{method, path, path_regex},
        Mock, MockServer, ResponseTemplate,
    };

    fn test_bot(server: &MockServer) -> Bot {
        let client = Client::builder().no_proxy().build().unwrap();
        Bot::with_client("TEST", client).set_api_url(reqwest::Url::parse(&server.uri()).unwrap())
    }

    #[tokio::test]
    async fn try_send_typing_sends_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/botTEST/[Ss]endChatAction$"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"ok":true,"result":true}"#, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        try_send_typing(&test_bot(&server), ChatId(1)).await;
        server.verify().await;
    }

    #[tokio::test]
    async fn download_telegram_file_writes_bytes() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/GetFile"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"ok":true,"result":{"file_id":"f","file_unique_id":"u","file_path":"voice.oga"}}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/file/botTEST/voice.oga"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("ogg", "application/octet-stream"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = std::env::temp_dir().join(format!("chefbot-dl-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await?;
        let dest = dir.join("voice.oga");
        let size = download_telegram_file(&test_bot(&server), "f", &dest).await?;
        assert_eq!(size, 3);
        assert_eq!(tokio::fs::read(&dest).await?, b"ogg");
        tokio::fs::remove_dir_all(&dir).await?;
        server.verify().await;
        Ok(())
    }
}
