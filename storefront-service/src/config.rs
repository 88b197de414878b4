use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::Result;
use tracing::{info, warn};

pub const DEFAULT_METADATA_BASE_URL: &str = "http://169.254.169.254";

/// Process settings read once from the environment at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub metadata: MetadataConfig,
    /// Remote cart service; the in-process mock is used when unset
    pub cart_api_url: Option<String>,
    /// Remote trade-in service; the in-process mock is used when unset
    pub trade_in_api_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MetadataConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub token_ttl_seconds: u32,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_METADATA_BASE_URL.to_string(),
            timeout: Duration::from_millis(2000),
            token_ttl_seconds: 21600,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            port: try_load("PORT", "3000")?,
            metadata: MetadataConfig {
                base_url: try_load("METADATA_BASE_URL", DEFAULT_METADATA_BASE_URL)?,
                timeout: Duration::from_millis(try_load("METADATA_TIMEOUT_MS", "2000")?),
                token_ttl_seconds: try_load("METADATA_TOKEN_TTL_SECONDS", "21600")?,
            },
            cart_api_url: optional("CART_API_URL"),
            trade_in_api_url: optional("TRADE_IN_API_URL"),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        anyhow::anyhow!("invalid {key} value {raw:?}: {e}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_load_falls_back_to_default() {
        let port: u16 = try_load("STOREFRONT_TEST_UNSET_PORT", "3000").unwrap();
        assert_eq!(port, 3000);
    }

    #[test]
    fn test_try_load_rejects_bad_default() {
        let result: Result<u16> = try_load("STOREFRONT_TEST_UNSET_PORT", "not-a-port");
        assert!(result.is_err());
    }

    #[test]
    fn test_metadata_defaults() {
        let metadata = MetadataConfig::default();
        assert_eq!(metadata.timeout, Duration::from_secs(2));
        assert_eq!(metadata.base_url, "http://169.254.169.254");
    }
}
