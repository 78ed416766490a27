//! Per-channel Atom feed client: the cheapest way to list recent
//! uploads. The feed itself caps at roughly the 15 newest entries;
//! no cap is applied here.

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::common::errors::SourceError;

/// One `<entry>` of a channel feed, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct RssVideo {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub channel_title: String,
    pub published_at: String,
}

#[async_trait]
pub trait RssClient: Send + Sync {
    async fn channel_videos(&self, channel_id: &str) -> Result<Vec<RssVideo>, SourceError>;
}

pub struct RssFeed {
    client: reqwest::Client,
    entry_re: Regex,
    video_id_re: Regex,
    title_re: Regex,
    thumbnail_re: Regex,
    author_re: Regex,
    published_re: Regex,
}

impl RssFeed {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            entry_re: Regex::new(r"(?s)<entry>(.*?)</entry>").unwrap(),
            video_id_re: Regex::new(r"<yt:videoId>([^<]+)</yt:videoId>").unwrap(),
            title_re: Regex::new(r"<title>([^<]*)</title>").unwrap(),
            thumbnail_re: Regex::new(r#"<media:thumbnail url="([^"]+)""#).unwrap(),
            author_re: Regex::new(r"(?s)<author>\s*<name>([^<]*)</name>").unwrap(),
            published_re: Regex::new(r"<published>([^<]+)</published>").unwrap(),
        }
    }

    fn parse_entry(&self, block: &str) -> Option<RssVideo> {
        let video_id = self.video_id_re.captures(block)?[1].to_string();
        let title = self
            .title_re
            .captures(block)
            .map(|c| unescape_xml(&c[1]))
            .unwrap_or_default();
        let thumbnail_url = self
            .thumbnail_re
            .captures(block)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        let channel_title = self
            .author_re
            .captures(block)
            .map(|c| unescape_xml(&c[1]))
            .unwrap_or_default();
        let published_at = self
            .published_re
            .captures(block)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        Some(RssVideo {
            video_id,
            title,
            thumbnail_url,
            channel_title,
            published_at,
        })
    }
}

#[async_trait]
impl RssClient for RssFeed {
    async fn channel_videos(&self, channel_id: &str) -> Result<Vec<RssVideo>, SourceError> {
        let url = format!(
            "https://www.youtube.com/feeds/videos.xml?channel_id={}",
            urlencoding::encode(channel_id)
        );
        debug!("RSS feed fetch: {}", url);

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(SourceError::Data(format!("feed returned {}", resp.status())));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| SourceError::Data(format!("feed body: {e}")))?;

        let videos: Vec<RssVideo> = self
            .entry_re
            .captures_iter(&body)
            .filter_map(|entry| self.parse_entry(&entry[1]))
            .collect();
        if videos.is_empty() {
            return Err(SourceError::Data("feed contained no entries".into()));
        }
        Ok(videos)
    }
}

/// The handful of entities Atom feeds actually emit.
fn unescape_xml(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_ENTRY: &str = r#"
        <entry>
            <id>yt:video:dQw4w9WgXcQ</id>
            <yt:videoId>dQw4w9WgXcQ</yt:videoId>
            <yt:channelId>UCuAXFkgsw1L7xaCfnd5JJOw</yt:channelId>
            <title>Rick &amp; Roll</title>
            <author>
                <name>Rick Astley</name>
                <uri>https://www.youtube.com/channel/UCuAXFkgsw1L7xaCfnd5JJOw</uri>
            </author>
            <published>2009-10-25T06:57:33+00:00</published>
            <media:group>
                <media:thumbnail url="https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg" width="480" height="360"/>
            </media:group>
        </entry>"#;

    #[test]
    fn test_parse_entry_extracts_all_fields() {
        let feed = RssFeed::new(reqwest::Client::new());
        let block = feed.entry_re.captures(SAMPLE_ENTRY).unwrap()[1].to_string();
        let video = feed.parse_entry(&block).unwrap();
        assert_eq!(video.video_id, "dQw4w9WgXcQ");
        assert_eq!(video.title, "Rick & Roll");
        assert_eq!(video.channel_title, "Rick Astley");
        assert_eq!(
            video.thumbnail_url,
            "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
        );
        assert_eq!(video.published_at, "2009-10-25T06:57:33+00:00");
    }

    #[test]
    fn test_entry_without_video_id_is_skipped() {
        let feed = RssFeed::new(reqwest::Client::new());
        assert!(feed.parse_entry("<title>just a title</title>").is_none());
    }

    #[test]
    fn test_unescape_xml() {
        assert_eq!(unescape_xml("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(unescape_xml("it&#39;s"), "it's");
    }
}
