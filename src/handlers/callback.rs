use anyhow::Result;
use teloxide::prelude::*;

use crate::action::Action;
use crate::controller::Controller;
use crate::utils::try_send_typing;

use super::{respond, user_lang};

pub async fn callback_handler(bot: Bot, q: CallbackQuery, controller: Controller) -> Result<()> {
    // Answer first so the button spinner stops while we generate.
    bot.answer_callback_query(q.id.clone()).await?;

    let (Some(data), Some(msg)) = (q.data.as_deref(), q.message.as_ref()) else {
        return Ok(());
    };
    let chat_id = msg.chat().id;
    let user_id = q.from.id.0 as i64;
    let Some(action) = Action::parse(data) else {
        tracing::debug!(user_id, data, "Ignoring unknown callback data");
        return Ok(());
    };

    let lang = user_lang(&q.from);
    try_send_typing(&bot, chat_id).await;
    let result = controller.handle_action(user_id, lang, action).await;
    respond(&bot, chat_id, lang, result).await
}
