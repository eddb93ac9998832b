use anyhow::{Context, Result, anyhow};
use claim_flow::ai::DEFAULT_MODEL;

pub const DEFAULT_PORT: u16 = 3000;
/// Inline data URIs for documents, images and video make request bodies large.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 64 * 1024 * 1024;

/// Service settings, read once from the environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub openrouter_api_key: String,
    pub openrouter_model: String,
    /// Unset means OpenRouter itself
    pub openrouter_base_url: Option<String>,
    pub database_url: Option<String>,
    pub port: u16,
    pub max_request_bytes: usize,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openrouter_api_key =
            non_empty("OPENROUTER_API_KEY").ok_or_else(|| anyhow!("OPENROUTER_API_KEY not set"))?;

        let port = match non_empty("PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("PORT must be a port number, got {port:?}"))?,
            None => DEFAULT_PORT,
        };

        let max_request_bytes = match non_empty("MAX_REQUEST_BYTES") {
            Some(bytes) => bytes
                .parse()
                .with_context(|| format!("MAX_REQUEST_BYTES must be a byte count, got {bytes:?}"))?,
            None => DEFAULT_MAX_REQUEST_BYTES,
        };

        let seed_demo_data = non_empty("SEED_DEMO_DATA")
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"));

        Ok(Self {
            openrouter_api_key,
            openrouter_model: non_empty("OPENROUTER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openrouter_base_url: non_empty("OPENROUTER_BASE_URL"),
            database_url: non_empty("DATABASE_URL"),
            port,
            max_request_bytes,
            seed_demo_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = config(&[("OPENROUTER_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.openrouter_model, DEFAULT_MODEL);
        assert!(config.openrouter_base_url.is_none());
        assert_eq!(config.max_request_bytes, DEFAULT_MAX_REQUEST_BYTES);
        assert!(config.database_url.is_none());
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn missing_api_key_is_an_error() {
        assert!(config(&[]).is_err());
        assert!(config(&[("OPENROUTER_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn overrides_are_read() {
        let config = config(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/claims"),
            ("SEED_DEMO_DATA", "true"),
            ("OPENROUTER_MODEL", "google/gemini-2.0-flash-001"),
            ("OPENROUTER_BASE_URL", "http://localhost:4000/v1"),
        ])
        .unwrap();
        assert_eq!(config.openrouter_base_url.as_deref(), Some("http://localhost:4000/v1"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/claims"));
        assert!(config.seed_demo_data);
        assert_eq!(config.openrouter_model, "google/gemini-2.0-flash-001");
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(config(&[("OPENROUTER_API_KEY", "sk-test"), ("PORT", "http")]).is_err());
    }
}
