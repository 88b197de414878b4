//! Instance metadata probe backing `/api/server-info`.
//!
//! Uses the token-based IMDSv2 protocol only: one `PUT` for a session token,
//! then the four lookups run concurrently with that token. Every failure,
//! timeout or empty body reads as [`NOT_AVAILABLE`]; the probe itself never
//! fails.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::MetadataConfig;

pub const NOT_AVAILABLE: &str = "Not Available";

const TOKEN_PATH: &str = "/latest/api/token";
const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";
const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub instance_id: String,
    pub public_ip: String,
    pub private_ip: String,
    pub availability_zone: String,
    pub server_time: String,
}

#[derive(Clone)]
pub struct MetadataProbe {
    client: Client,
    config: MetadataConfig,
}

impl MetadataProbe {
    pub fn new(config: MetadataConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build metadata client: {}", e))?;
        Ok(Self { client, config })
    }

    pub async fn server_info(&self) -> ServerInfo {
        let token = self.token().await;

        let (instance_id, public_ip, private_ip, availability_zone) = match token.as_deref() {
            Some(token) => tokio::join!(
                self.lookup(token, "instance-id"),
                self.lookup(token, "public-ipv4"),
                self.lookup(token, "local-ipv4"),
                self.lookup(token, "placement/availability-zone"),
            ),
            None => (
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
            ),
        };

        ServerInfo {
            instance_id,
            public_ip,
            private_ip,
            availability_zone,
            server_time: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }

    async fn token(&self) -> Option<String> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), TOKEN_PATH);
        let response = self
            .client
            .put(&url)
            .header(TOKEN_TTL_HEADER, self.config.token_ttl_seconds.to_string())
            .send()
            .await
            .and_then(|r| r.error_for_status());

        match response {
            Ok(response) => match response.text().await {
                Ok(body) if !body.trim().is_empty() => Some(body.trim().to_string()),
                Ok(_) => {
                    warn!("Metadata token response was empty");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read metadata token");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "Metadata token request failed");
                None
            }
        }
    }

    async fn lookup(&self, token: &str, path: &str) -> String {
        let url = format!(
            "{}/latest/meta-data/{}",
            self.config.base_url.trim_end_matches('/'),
            path
        );
        let result = async {
            let response = self
                .client
                .get(&url)
                .header(TOKEN_HEADER, token)
                .send()
                .await?
                .error_for_status()?;
            response.text().await
        }
        .await;

        match result {
            Ok(body) if !body.trim().is_empty() => body.trim().to_string(),
            Ok(_) => NOT_AVAILABLE.to_string(),
            Err(e) => {
                debug!(path = %path, error = %e, "Metadata lookup failed");
                NOT_AVAILABLE.to_string()
            }
        }
    }
}
