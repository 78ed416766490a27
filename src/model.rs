//! The normalized metadata model every source resolves into.
//!
//! Values here live for a single resolution call; the engine retains
//! nothing. Consumers that want caching or persistence do it on their
//! side of the boundary.

use serde::{Deserialize, Serialize};

/// Metadata for one resolved piece of content, whichever source
/// supplied it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResolvedMetadata {
    #[serde(rename_all = "camelCase")]
    Video {
        id: String,
        title: String,
        thumbnail_url: String,
        /// Empty when the source does not expose it (oEmbed).
        channel_id: String,
        channel_title: String,
    },
    #[serde(rename_all = "camelCase")]
    Playlist {
        id: String,
        title: String,
        thumbnail_url: String,
        channel_id: String,
        channel_title: String,
    },
    #[serde(rename_all = "camelCase")]
    Channel {
        id: String,
        title: String,
        thumbnail_url: String,
        subscriber_count: Option<u64>,
        video_count: Option<u64>,
        uploads_playlist_id: Option<String>,
    },
}

impl ResolvedMetadata {
    pub fn id(&self) -> &str {
        match self {
            Self::Video { id, .. } | Self::Playlist { id, .. } | Self::Channel { id, .. } => id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Video { title, .. }
            | Self::Playlist { title, .. }
            | Self::Channel { title, .. } => title,
        }
    }
}

/// One entry of a playlist listing. `position` is source-defined: RSS
/// supplies index order, the API supplies an explicit position, search
/// results carry none and default to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistVideoEntry {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub channel_title: String,
    pub position: u32,
}

/// Pick the best available thumbnail: high, then medium, then default.
/// A present-but-blank URL counts as absent. Nothing usable yields an
/// empty string; thumbnail absence is never a fatal condition.
pub fn pick_thumbnail(
    high: Option<&str>,
    medium: Option<&str>,
    default: Option<&str>,
) -> String {
    for candidate in [high, medium, default].into_iter().flatten() {
        if !candidate.trim().is_empty() {
            return candidate.to_string();
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_thumbnail_prefers_high() {
        assert_eq!(
            pick_thumbnail(Some("hq.jpg"), Some("mq.jpg"), Some("default.jpg")),
            "hq.jpg"
        );
    }

    #[test]
    fn test_pick_thumbnail_falls_through_blank_and_absent() {
        assert_eq!(pick_thumbnail(None, Some("mq.jpg"), Some("default.jpg")), "mq.jpg");
        assert_eq!(pick_thumbnail(Some("  "), Some(""), Some("default.jpg")), "default.jpg");
    }

    #[test]
    fn test_pick_thumbnail_empty_when_nothing_usable() {
        assert_eq!(pick_thumbnail(None, None, None), "");
        assert_eq!(pick_thumbnail(Some(""), None, Some(" ")), "");
    }
}
