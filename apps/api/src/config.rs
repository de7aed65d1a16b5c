use anyhow::{Context, Result};

const DEFAULT_BASE_URL: &str = "http://api.taiji.woa.com/openapi";

/// Application configuration loaded from environment variables.
/// Nothing is required: a missing API key yields a client that fails at call time.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider_api_key: String,
    pub provider_base_url: String,
    pub static_dir: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            provider_api_key: std::env::var("HUNYUAN_INTERNAL_API_KEY").unwrap_or_default(),
            provider_base_url: std::env::var("HUNYUAN_INTERNAL_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            static_dir: std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()),
            port: parse_port(std::env::var("PORT").ok())?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn parse_port(raw: Option<String>) -> Result<u16> {
    raw.unwrap_or_else(|| "8000".to_string())
        .parse::<u16>()
        .context("PORT must be a valid port number")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_defaults_to_8000() {
        assert_eq!(parse_port(None).unwrap(), 8000);
    }

    #[test]
    fn test_port_parses_explicit_value() {
        assert_eq!(parse_port(Some("3000".to_string())).unwrap(), 3000);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = parse_port(Some("eighty".to_string())).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
