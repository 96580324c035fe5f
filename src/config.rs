use std::env;
use std::path::PathBuf;

use crate::ai::config::AiConfig;
use crate::session::DEFAULT_HISTORY_CAP;

pub const DEFAULT_DB_URL: &str = "sqlite:chefbot.db";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_PORT: u16 = 8080;

/// Where sessions live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite(String),
}

impl StoreBackend {
    fn from_url(url: &str) -> Self {
        if url.trim().eq_ignore_ascii_case("memory") {
            StoreBackend::Memory
        } else {
            StoreBackend::Sqlite(url.trim().to_string())
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub db_max_connections: u32,
    pub port: u16,
    pub history_cap: usize,
    pub temp_dir: PathBuf,
    pub ai: Option<AiConfig>,
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let db_url = env::var("DB_URL").unwrap_or_else(|_| DEFAULT_DB_URL.to_string());
        let temp_dir = env::var("TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("chefbot"));
        Self {
            store: StoreBackend::from_url(&db_url),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS")
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
                .max(1),
            port: parse_var("PORT").unwrap_or(DEFAULT_PORT),
            history_cap: parse_var::<usize>("MAX_HISTORY_MESSAGES")
                .unwrap_or(DEFAULT_HISTORY_CAP)
                .max(1),
            temp_dir,
            ai: AiConfig::from_env(),
        }
    }
}
