use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::action::Action;
use crate::controller::Controller;
use crate::locale::Lang;
use crate::messages;
use crate::utils::try_send_typing;

use super::{respond, user_lang};

pub async fn send_static(bot: &Bot, chat_id: ChatId, text: &str) -> Result<()> {
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn help(bot: Bot, msg: Message, lang: Lang) -> Result<()> {
    send_static(&bot, msg.chat.id, messages::help(lang)).await
}

pub async fn author(bot: Bot, msg: Message, lang: Lang) -> Result<()> {
    send_static(&bot, msg.chat.id, messages::author(lang)).await
}

/// `/start` and `/reset`: forget the session and greet.
pub async fn reset(bot: Bot, msg: Message, controller: Controller) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let lang = user_lang(user);
    let result = controller
        .handle_action(user.id.0 as i64, lang, Action::Reset)
        .await;
    respond(&bot, msg.chat.id, lang, result).await
}

pub async fn handle_text_message(bot: Bot, msg: Message, controller: Controller) -> Result<()> {
    let (Some(text), Some(user)) = (msg.text(), msg.from.as_ref()) else {
        return Ok(());
    };
    let lang = user_lang(user);
    try_send_typing(&bot, msg.chat.id).await;
    let result = controller.handle_text(user.id.0 as i64, lang, text).await;
    respond(&bot, msg.chat.id, lang, result).await
}
