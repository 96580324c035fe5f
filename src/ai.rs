pub mod common;
pub mod config;
pub mod gateway;
pub mod prompts;
pub mod stt;
