//! HEAD-based asset metadata probe.

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;

use contexxt_config::ProbeConfig;
use contexxt_protocols::{AssetMetadata, MetadataProbe, ProbeError};

/// Looks up content length and type with a single HEAD request.
///
/// Only `http` and `https` URLs are probed.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ProbeError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MetadataProbe for HttpProbe {
    async fn head(&self, url: &str) -> Result<AssetMetadata, ProbeError> {
        let parsed = url::Url::parse(url).map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProbeError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        let response = self
            .client
            .head(parsed)
            .send()
            .await
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        let headers = response.headers();
        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        debug!(
            "Probed {}: length={:?} type={:?}",
            url, content_length, content_type
        );
        Ok(AssetMetadata {
            content_length,
            content_type,
        })
    }
}
