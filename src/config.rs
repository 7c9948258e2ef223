use anyhow::{Context, Result};
use std::env;

use crate::nutrition::FallbackProfile;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_RATE_LIMIT: u32 = 30;
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` keeps the server up but every model-backed route answers 500.
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
    /// Requests per client IP per minute; 0 disables limiting.
    pub rate_limit: u32,
    pub port: u16,
    pub fallback_profile: FallbackProfile,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let rate_limit = match var("RATE_LIMIT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("RATE_LIMIT must be a whole number, got '{}'", raw))?,
            None => DEFAULT_RATE_LIMIT,
        };

        let port = match var("PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got '{}'", raw))?,
            None => DEFAULT_PORT,
        };

        let fallback_profile = match var("FALLBACK_PROFILE") {
            Some(raw) => raw
                .parse::<FallbackProfile>()
                .map_err(anyhow::Error::msg)
                .context("FALLBACK_PROFILE must be 'detailed' or 'compact'")?,
            None => FallbackProfile::default(),
        };

        let allowed_origins = var("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            api_key: var("OPENAI_API_KEY"),
            model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_url: var("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            allowed_origins,
            rate_limit,
            port,
            fallback_profile,
        })
    }
}
