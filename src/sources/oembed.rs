//! Quota-free oEmbed lookups for videos and playlists.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::common::errors::SourceError;

/// Minimal embed metadata the oEmbed endpoint returns. No ids in here;
/// the caller already knows which content it asked about.
#[derive(Debug, Clone, Deserialize)]
pub struct OEmbedData {
    pub title: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_url: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

#[async_trait]
pub trait OEmbedClient: Send + Sync {
    /// Fetch embed metadata for a full content URL.
    async fn fetch(&self, content_url: &str) -> Result<OEmbedData, SourceError>;
}

pub struct OEmbed {
    client: reqwest::Client,
}

impl OEmbed {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OEmbedClient for OEmbed {
    async fn fetch(&self, content_url: &str) -> Result<OEmbedData, SourceError> {
        let url = format!(
            "https://www.youtube.com/oembed?url={}&format=json",
            urlencoding::encode(content_url)
        );
        debug!("oEmbed lookup: {}", url);

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(SourceError::Data(format!(
                "oEmbed returned {}",
                resp.status()
            )));
        }
        resp.json::<OEmbedData>()
            .await
            .map_err(|e| SourceError::Data(format!("oEmbed body: {e}")))
    }
}
