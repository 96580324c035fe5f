use anyhow::Result;
use teloxide::{prelude::*, utils::command::BotCommands};

use crate::controller::Controller;
use crate::handlers::{author, help, reset, user_lang};
use crate::locale::Lang;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "start over.")]
    Start,
    #[command(description = "display this text.")]
    Help,
    #[command(description = "forget the products and start over.")]
    Reset,
    #[command(description = "about the author.")]
    Author,
}

impl Command {
    pub async fn dispatch(self, bot: Bot, msg: Message, controller: Controller) -> Result<()> {
        let lang = msg.from.as_ref().map(user_lang).unwrap_or(Lang::Ru);
        tracing::debug!(command = ?self, chat_id = msg.chat.id.0, "Handling command");
        match self {
            Command::Start | Command::Reset => reset(bot, msg, controller).await?,
            Command::Help => help(bot, msg, lang).await?,
            Command::Author => author(bot, msg, lang).await?,
        }
        Ok(())
    }
}
