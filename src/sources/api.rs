//! The official Data API v3 client. Authoritative but quota-metered,
//! so the cascades reach for it only after the free sources pass.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::common::errors::SourceError;
use crate::model::{PlaylistVideoEntry, ResolvedMetadata, pick_thumbnail};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn video(&self, id: &str) -> Result<ResolvedMetadata, SourceError>;
    async fn playlist(&self, id: &str) -> Result<ResolvedMetadata, SourceError>;
    async fn channel(&self, id: &str) -> Result<ResolvedMetadata, SourceError>;
    async fn channel_by_handle(&self, handle: &str) -> Result<ResolvedMetadata, SourceError>;
    async fn playlist_items(
        &self,
        playlist_id: &str,
        max: u32,
    ) -> Result<Vec<PlaylistVideoEntry>, SourceError>;
    /// The one operation with no fallback source anywhere else.
    async fn search_channel(
        &self,
        channel_id: &str,
        query: &str,
        max: u32,
    ) -> Result<Vec<PlaylistVideoEntry>, SourceError>;
}

pub struct OfficialApi {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl OfficialApi {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    /// GET a list endpoint and return its non-empty `items` array.
    /// A missing key, non-2xx status, bad body or empty list are all
    /// data-class failures: the API answered (or was never usable),
    /// nothing transport-shaped happened.
    async fn items(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<Value>, SourceError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::Data("no API key configured".into()))?;

        let mut url = format!("{}/{}?key={}", API_BASE, endpoint, urlencoding::encode(key));
        for (name, value) in params {
            url.push_str(&format!("&{}={}", name, urlencoding::encode(value)));
        }
        debug!("Data API request: {}", endpoint);

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(SourceError::Data(format!(
                "{} returned {}",
                endpoint,
                resp.status()
            )));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| SourceError::Data(format!("{endpoint} body: {e}")))?;

        let items = body["items"].as_array().cloned().unwrap_or_default();
        if items.is_empty() {
            return Err(SourceError::Data(format!("{endpoint} returned no items")));
        }
        Ok(items)
    }

    fn channel_from_item(item: &Value) -> Result<ResolvedMetadata, SourceError> {
        let snippet = &item["snippet"];
        let stats = &item["statistics"];
        Ok(ResolvedMetadata::Channel {
            id: required_str(item, "id")?,
            title: required_str(snippet, "title")?,
            thumbnail_url: snippet_thumbnail(snippet),
            subscriber_count: stats["subscriberCount"]
                .as_str()
                .and_then(|s| s.parse().ok()),
            video_count: stats["videoCount"].as_str().and_then(|s| s.parse().ok()),
            uploads_playlist_id: item["contentDetails"]["relatedPlaylists"]["uploads"]
                .as_str()
                .map(str::to_string),
        })
    }
}

#[async_trait]
impl ApiClient for OfficialApi {
    async fn video(&self, id: &str) -> Result<ResolvedMetadata, SourceError> {
        let items = self
            .items("videos", &[("part", "snippet"), ("id", id)])
            .await?;
        let item = &items[0];
        let snippet = &item["snippet"];
        Ok(ResolvedMetadata::Video {
            id: item["id"].as_str().unwrap_or(id).to_string(),
            title: required_str(snippet, "title")?,
            thumbnail_url: snippet_thumbnail(snippet),
            channel_id: snippet["channelId"].as_str().unwrap_or_default().to_string(),
            channel_title: snippet["channelTitle"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        })
    }

    async fn playlist(&self, id: &str) -> Result<ResolvedMetadata, SourceError> {
        let items = self
            .items("playlists", &[("part", "snippet"), ("id", id)])
            .await?;
        let item = &items[0];
        let snippet = &item["snippet"];
        Ok(ResolvedMetadata::Playlist {
            id: item["id"].as_str().unwrap_or(id).to_string(),
            title: required_str(snippet, "title")?,
            thumbnail_url: snippet_thumbnail(snippet),
            channel_id: snippet["channelId"].as_str().unwrap_or_default().to_string(),
            channel_title: snippet["channelTitle"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        })
    }

    async fn channel(&self, id: &str) -> Result<ResolvedMetadata, SourceError> {
        let items = self
            .items(
                "channels",
                &[("part", "snippet,statistics,contentDetails"), ("id", id)],
            )
            .await?;
        Self::channel_from_item(&items[0])
    }

    async fn channel_by_handle(&self, handle: &str) -> Result<ResolvedMetadata, SourceError> {
        let items = self
            .items(
                "channels",
                &[
                    ("part", "snippet,statistics,contentDetails"),
                    ("forHandle", handle),
                ],
            )
            .await?;
        Self::channel_from_item(&items[0])
    }

    async fn playlist_items(
        &self,
        playlist_id: &str,
        max: u32,
    ) -> Result<Vec<PlaylistVideoEntry>, SourceError> {
        let max = max.to_string();
        let items = self
            .items(
                "playlistItems",
                &[
                    ("part", "snippet"),
                    ("playlistId", playlist_id),
                    ("maxResults", &max),
                ],
            )
            .await?;

        let mut entries = Vec::with_capacity(items.len());
        for item in &items {
            let snippet = &item["snippet"];
            let Some(video_id) = snippet["resourceId"]["videoId"].as_str() else {
                continue;
            };
            entries.push(PlaylistVideoEntry {
                video_id: video_id.to_string(),
                title: snippet["title"].as_str().unwrap_or_default().to_string(),
                thumbnail_url: snippet_thumbnail(snippet),
                channel_title: snippet["channelTitle"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                position: snippet["position"].as_u64().unwrap_or(0) as u32,
            });
        }
        if entries.is_empty() {
            return Err(SourceError::Data("playlistItems had no usable entries".into()));
        }
        Ok(entries)
    }

    async fn search_channel(
        &self,
        channel_id: &str,
        query: &str,
        max: u32,
    ) -> Result<Vec<PlaylistVideoEntry>, SourceError> {
        let max = max.to_string();
        let items = self
            .items(
                "search",
                &[
                    ("part", "snippet"),
                    ("channelId", channel_id),
                    ("q", query),
                    ("type", "video"),
                    ("maxResults", &max),
                ],
            )
            .await?;

        let mut entries = Vec::with_capacity(items.len());
        for item in &items {
            let Some(video_id) = item["id"]["videoId"].as_str() else {
                continue;
            };
            let snippet = &item["snippet"];
            entries.push(PlaylistVideoEntry {
                video_id: video_id.to_string(),
                title: snippet["title"].as_str().unwrap_or_default().to_string(),
                thumbnail_url: snippet_thumbnail(snippet),
                channel_title: snippet["channelTitle"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                position: 0,
            });
        }
        Ok(entries)
    }
}

fn required_str(value: &Value, field: &str) -> Result<String, SourceError> {
    value[field]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| SourceError::Data(format!("missing field {field}")))
}

fn snippet_thumbnail(snippet: &Value) -> String {
    let thumbs = &snippet["thumbnails"];
    pick_thumbnail(
        thumbs["high"]["url"].as_str(),
        thumbs["medium"]["url"].as_str(),
        thumbs["default"]["url"].as_str(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snippet_thumbnail_prefers_high() {
        let snippet = json!({
            "thumbnails": {
                "default": {"url": "d.jpg"},
                "medium": {"url": "m.jpg"},
                "high": {"url": "h.jpg"},
            }
        });
        assert_eq!(snippet_thumbnail(&snippet), "h.jpg");
    }

    #[test]
    fn test_snippet_thumbnail_handles_missing_levels() {
        let snippet = json!({"thumbnails": {"default": {"url": "d.jpg"}}});
        assert_eq!(snippet_thumbnail(&snippet), "d.jpg");
        assert_eq!(snippet_thumbnail(&json!({})), "");
    }

    #[test]
    fn test_channel_from_item_maps_counts_and_uploads() {
        let item = json!({
            "id": "UCuAXFkgsw1L7xaCfnd5JJOw",
            "snippet": {"title": "Rick Astley", "thumbnails": {}},
            "statistics": {"subscriberCount": "4200000", "videoCount": "99"},
            "contentDetails": {"relatedPlaylists": {"uploads": "UUuAXFkgsw1L7xaCfnd5JJOw"}},
        });
        let meta = OfficialApi::channel_from_item(&item).unwrap();
        match meta {
            ResolvedMetadata::Channel {
                id,
                subscriber_count,
                video_count,
                uploads_playlist_id,
                ..
            } => {
                assert_eq!(id, "UCuAXFkgsw1L7xaCfnd5JJOw");
                assert_eq!(subscriber_count, Some(4_200_000));
                assert_eq!(video_count, Some(99));
                assert_eq!(
                    uploads_playlist_id.as_deref(),
                    Some("UUuAXFkgsw1L7xaCfnd5JJOw")
                );
            }
            other => panic!("expected channel metadata, got {other:?}"),
        }
    }
}
