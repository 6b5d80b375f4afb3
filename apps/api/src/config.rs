use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub port: u16,
    pub rust_log: String,
    pub clients_dir: PathBuf,
    /// Present → profiles live in a GitHub repository instead of `clients_dir`.
    pub github: Option<GitHubConfig>,
    pub inter_slot_delay: Duration,
    pub retry_base_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: String,
    pub repo: String,
    pub branch: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let github = match std::env::var("GITHUB_TOKEN") {
            Ok(token) if !token.trim().is_empty() => Some(GitHubConfig {
                token,
                repo: std::env::var("GITHUB_REPO")
                    .unwrap_or_else(|_| "owner/instagram-caption-profiles".to_string()),
                branch: std::env::var("GITHUB_BRANCH").unwrap_or_else(|_| "main".to_string()),
            }),
            _ => None,
        };

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| crate::llm_client::DEFAULT_MODEL.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            clients_dir: std::env::var("CLIENTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("clients")),
            github,
            inter_slot_delay: secs_env("INTER_SLOT_DELAY_SECS", 5)?,
            retry_base_delay: secs_env("RETRY_BASE_DELAY_SECS", 15)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn secs_env(key: &str, default: u64) -> Result<Duration> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .with_context(|| format!("{key} must be a whole number of seconds")),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}
