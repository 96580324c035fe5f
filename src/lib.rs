use std::sync::Arc;

use anyhow::{bail, Result};
use dotenvy::dotenv;
use teloxide::{dispatching::UpdateHandler, prelude::*, utils::command::BotCommands};

pub mod action;
pub mod ai;
pub mod commands;
pub mod config;
pub mod controller;
pub mod db;
pub mod handlers;
pub mod health;
pub mod intent;
pub mod locale;
pub mod messages;
pub mod session;
pub mod text_utils;
mod utils;

#[cfg(test)]
pub(crate) mod tests;

pub use action::Action;
pub use commands::Command;
pub use config::{Config, StoreBackend};
pub use controller::{Button, Controller, Reply};
pub use locale::Lang;

use crate::ai::gateway::LlmGateway;
use crate::ai::stt::SttClient;
use crate::handlers::{callback_handler, handle_text_message, handle_voice_message, VoicePipeline};
use crate::session::{MemoryStore, SessionStore, SqliteStore};

// ──────────────────────────────────────────────────────────────
// Main application setup
// ──────────────────────────────────────────────────────────────

/// Update routing: buttons, voice, commands, then free text.
pub fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(callback_handler))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter(|msg: Message| msg.voice().is_some())
                        .endpoint(handle_voice_message),
                )
                .branch(dptree::entry().filter_command::<Command>().endpoint(
                    |bot: Bot, msg: Message, cmd: Command, controller: Controller| async move {
                        cmd.dispatch(bot, msg, controller).await
                    },
                ))
                .branch(
                    dptree::entry()
                        .filter(|msg: Message| msg.text().is_some())
                        .endpoint(handle_text_message),
                ),
        )
}

async fn open_store(config: &Config) -> Result<Arc<dyn SessionStore>> {
    match &config.store {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory session store");
            Ok(Arc::new(MemoryStore::new(config.history_cap)))
        }
        StoreBackend::Sqlite(url) => {
            let db_url = db::prepare_sqlite_url(url);
            tracing::info!("Connecting to database at: {}", &db_url);
            let pool = db::connect_db(&db_url, config.db_max_connections).await?;
            db::migrate(&pool).await?;
            tracing::info!("Database connection successful.");
            Ok(Arc::new(SqliteStore::new(pool, config.history_cap)))
        }
    }
}

pub async fn run() -> Result<()> {
    // Load .env file if it exists (for local development)
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting chefbot...");

    let config = Config::from_env();
    let Some(ai) = config.ai.clone() else {
        bail!("GROQ_API_KEY or OPENAI_API_KEY must be set");
    };

    let store = open_store(&config).await?;
    let gateway = Arc::new(LlmGateway::new(&ai)?);
    let controller = Controller::new(store, gateway);
    let voice = VoicePipeline::new(SttClient::new(&ai)?, config.temp_dir.clone());

    let port = config.port;
    tokio::spawn(async move {
        if let Err(err) = health::serve(port).await {
            tracing::error!(error = %err, port, "Health server stopped");
        }
    });

    let bot = Bot::from_env();
    if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
        tracing::warn!(error = %err, "Failed to register bot commands");
    }

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![controller, voice])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
