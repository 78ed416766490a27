//! Client for community Invidious mirrors. Every call takes the base
//! URL of the instance to hit; which instance that is — and what its
//! failure means for the pool — is the orchestrator's business.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::common::errors::SourceError;
use crate::model::{PlaylistVideoEntry, ResolvedMetadata, pick_thumbnail};

#[async_trait]
pub trait InvidiousClient: Send + Sync {
    async fn video(&self, base_url: &str, id: &str) -> Result<ResolvedMetadata, SourceError>;
    async fn playlist(&self, base_url: &str, id: &str) -> Result<ResolvedMetadata, SourceError>;
    async fn channel(&self, base_url: &str, id: &str) -> Result<ResolvedMetadata, SourceError>;
    /// Resolve an `@handle` (or a legacy custom name treated as one)
    /// into a channel id.
    async fn resolve_handle(&self, base_url: &str, handle: &str) -> Result<String, SourceError>;
    async fn playlist_items(
        &self,
        base_url: &str,
        id: &str,
    ) -> Result<Vec<PlaylistVideoEntry>, SourceError>;
    /// Mirrors expose uploads per-channel, not via the synthetic
    /// uploads playlist id.
    async fn channel_videos(
        &self,
        base_url: &str,
        channel_id: &str,
    ) -> Result<Vec<PlaylistVideoEntry>, SourceError>;
}

pub struct Invidious {
    client: reqwest::Client,
}

impl Invidious {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn get_json(&self, base_url: &str, path: &str) -> Result<Value, SourceError> {
        let url = format!("{}/api/v1/{}", base_url.trim_end_matches('/'), path);
        debug!("Invidious request: {}", url);

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(SourceError::Data(format!(
                "{} returned {}",
                base_url,
                resp.status()
            )));
        }
        resp.json()
            .await
            .map_err(|e| SourceError::Data(format!("{path} body: {e}")))
    }

    fn entries_from_videos(videos: &[Value]) -> Vec<PlaylistVideoEntry> {
        videos
            .iter()
            .enumerate()
            .filter_map(|(idx, video)| {
                let video_id = video["videoId"].as_str()?;
                Some(PlaylistVideoEntry {
                    video_id: video_id.to_string(),
                    title: video["title"].as_str().unwrap_or_default().to_string(),
                    thumbnail_url: labeled_thumbnail(&video["videoThumbnails"]),
                    channel_title: video["author"].as_str().unwrap_or_default().to_string(),
                    position: video["index"].as_u64().unwrap_or(idx as u64) as u32,
                })
            })
            .collect()
    }
}

#[async_trait]
impl InvidiousClient for Invidious {
    async fn video(&self, base_url: &str, id: &str) -> Result<ResolvedMetadata, SourceError> {
        let body = self.get_json(base_url, &format!("videos/{id}")).await?;
        Ok(ResolvedMetadata::Video {
            id: body["videoId"].as_str().unwrap_or(id).to_string(),
            title: required_str(&body, "title")?,
            thumbnail_url: labeled_thumbnail(&body["videoThumbnails"]),
            channel_id: body["authorId"].as_str().unwrap_or_default().to_string(),
            channel_title: body["author"].as_str().unwrap_or_default().to_string(),
        })
    }

    async fn playlist(&self, base_url: &str, id: &str) -> Result<ResolvedMetadata, SourceError> {
        let body = self.get_json(base_url, &format!("playlists/{id}")).await?;
        let thumbnail = body["playlistThumbnail"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        Ok(ResolvedMetadata::Playlist {
            id: body["playlistId"].as_str().unwrap_or(id).to_string(),
            title: required_str(&body, "title")?,
            thumbnail_url: thumbnail,
            channel_id: body["authorId"].as_str().unwrap_or_default().to_string(),
            channel_title: body["author"].as_str().unwrap_or_default().to_string(),
        })
    }

    async fn channel(&self, base_url: &str, id: &str) -> Result<ResolvedMetadata, SourceError> {
        let body = self.get_json(base_url, &format!("channels/{id}")).await?;
        let channel_id = required_str(&body, "authorId")?;
        // The uploads playlist id is UC -> UU, purely textual.
        let uploads = channel_id
            .strip_prefix("UC")
            .map(|suffix| format!("UU{suffix}"));
        Ok(ResolvedMetadata::Channel {
            id: channel_id,
            title: required_str(&body, "author")?,
            thumbnail_url: labeled_thumbnail(&body["authorThumbnails"]),
            subscriber_count: body["subCount"].as_u64(),
            video_count: body["totalVideos"].as_u64(),
            uploads_playlist_id: uploads,
        })
    }

    async fn resolve_handle(&self, base_url: &str, handle: &str) -> Result<String, SourceError> {
        // The channels endpoint accepts handles directly.
        let path = format!("channels/{}", urlencoding::encode(handle));
        let body = self.get_json(base_url, &path).await?;
        required_str(&body, "authorId")
    }

    async fn playlist_items(
        &self,
        base_url: &str,
        id: &str,
    ) -> Result<Vec<PlaylistVideoEntry>, SourceError> {
        let body = self.get_json(base_url, &format!("playlists/{id}")).await?;
        let videos = body["videos"]
            .as_array()
            .ok_or_else(|| SourceError::Data("playlist had no videos array".into()))?;
        let entries = Self::entries_from_videos(videos);
        if entries.is_empty() {
            return Err(SourceError::Data("playlist had no usable entries".into()));
        }
        Ok(entries)
    }

    async fn channel_videos(
        &self,
        base_url: &str,
        channel_id: &str,
    ) -> Result<Vec<PlaylistVideoEntry>, SourceError> {
        let body = self
            .get_json(base_url, &format!("channels/{channel_id}/videos"))
            .await?;
        let videos = body["videos"]
            .as_array()
            .ok_or_else(|| SourceError::Data("channel had no videos array".into()))?;
        let entries = Self::entries_from_videos(videos);
        if entries.is_empty() {
            return Err(SourceError::Data("channel had no usable entries".into()));
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

/// Invidious thumbnail arrays carry a `quality` label per entry.
fn labeled_thumbnail(thumbnails: &Value) -> String {
    let find = |quality: &str| -> Option<String> {
        thumbnails.as_array()?.iter().find_map(|t| {
            if t["quality"].as_str() == Some(quality) {
                t["url"].as_str().map(str::to_string)
            } else {
                None
            }
        })
    };
    let high = find("high");
    let medium = find("medium");
    let default = find("default");
    pick_thumbnail(high.as_deref(), medium.as_deref(), default.as_deref())
}
