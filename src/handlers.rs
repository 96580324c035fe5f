pub mod callback;
pub mod keyboard;
pub mod text;
pub mod voice;

pub use callback::callback_handler;
pub use text::{author, handle_text_message, help, reset};
pub use voice::{handle_voice_message, TempArtifact, VoicePipeline};

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, User};

use crate::controller::Reply;
use crate::locale::Lang;
use crate::messages;
use crate::text_utils::split_message;

/// Telegram rejects longer messages.
pub const MESSAGE_LIMIT: usize = 4096;

pub fn user_lang(user: &User) -> Lang {
    user.language_code
        .as_deref()
        .map(Lang::from_code)
        .unwrap_or_default()
}

/// Send each reply as HTML; the keyboard goes on the last chunk.
pub async fn send_replies(bot: &Bot, chat_id: ChatId, replies: &[Reply]) -> Result<()> {
    for reply in replies {
        let chunks = split_message(&reply.text, MESSAGE_LIMIT);
        let last = chunks.len().saturating_sub(1);
        for (i, chunk) in chunks.into_iter().enumerate() {
            let request = bot.send_message(chat_id, chunk).parse_mode(ParseMode::Html);
            if i == last && !reply.keyboard.is_empty() {
                request
                    .reply_markup(keyboard::build_markup(&reply.keyboard))
                    .await?;
            } else {
                request.await?;
            }
        }
    }
    Ok(())
}

/// Deliver a turn's replies, or a generic apology if the turn failed.
pub async fn respond(bot: &Bot, chat_id: ChatId, lang: Lang, result: Result<Vec<Reply>>) -> Result<()> {
    match result {
        Ok(replies) => send_replies(bot, chat_id, &replies).await,
        Err(err) => {
            tracing::error!(error = %err, chat_id = chat_id.0, "Turn failed");
            bot.send_message(chat_id, messages::internal_error(lang))
                .await?;
            Ok(())
        }
    }
}
