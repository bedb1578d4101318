use std::path::PathBuf;

use anyhow::Result;

/// Application configuration loaded from environment variables.
///
/// `ANTHROPIC_API_KEY` is deliberately optional: without it the engine runs
/// every prompt through the deterministic stub path instead of the backend.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub prompts_dir: PathBuf,
    pub anthropic_api_key: Option<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://analyst.db".to_string()),
            prompts_dir: std::env::var("PROMPTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("prompts")),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
