//! The hybrid resolution engine.
//!
//! Every operation runs a fixed, cost-ordered cascade of sources and
//! takes the first usable answer. Each step is attempted exactly once;
//! the only bounded retry is the Invidious leg, which tries up to three
//! distinct mirror instances supplied by the health registry. Failures
//! of individual sources never cross the public boundary — callers see
//! either a result or a single exhaustion error.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::classify::{ContentRef, RefKind, classify};
use crate::common::errors::{ResolveError, SourceError};
use crate::common::http::HttpClient;
use crate::config::ResolverConfig;
use crate::health::{HealthRegistry, InstanceRegistry};
use crate::model::{PlaylistVideoEntry, ResolvedMetadata};
use crate::sources::{
    ApiClient, Invidious, InvidiousClient, OEmbed, OEmbedClient, OfficialApi, RssClient, RssFeed,
};

/// How many distinct mirror instances one cascade leg may try.
const INVIDIOUS_ATTEMPTS: usize = 3;

/// Upper bound passed to the Data API list endpoints.
const API_PAGE_SIZE: u32 = 50;

/// Identifier for each data source a cascade can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    OEmbed,
    Api,
    Rss,
    Invidious,
}

impl SourceKind {
    fn name(self) -> &'static str {
        match self {
            Self::OEmbed => "oembed",
            Self::Api => "api",
            Self::Rss => "rss",
            Self::Invidious => "invidious",
        }
    }
}

/// One logical resolution operation.
#[derive(Debug, Clone)]
pub enum Operation {
    Video(String),
    Playlist(String),
    Channel(String),
    /// Also covers legacy `/c/Name` custom names, resolved best-effort
    /// as handles.
    ChannelByHandle(String),
    PlaylistItems(String),
    SearchChannel { channel_id: String, query: String },
}

impl Operation {
    fn describe(&self) -> String {
        match self {
            Self::Video(id) => format!("video {id}"),
            Self::Playlist(id) => format!("playlist {id}"),
            Self::Channel(id) => format!("channel {id}"),
            Self::ChannelByHandle(handle) => format!("channel handle {handle}"),
            Self::PlaylistItems(id) => format!("playlist items {id}"),
            Self::SearchChannel { channel_id, query } => {
                format!("search '{query}' in channel {channel_id}")
            }
        }
    }
}

const METADATA_CASCADE: &[SourceKind] =
    &[SourceKind::OEmbed, SourceKind::Api, SourceKind::Invidious];
const CHANNEL_CASCADE: &[SourceKind] = &[SourceKind::Api, SourceKind::Invidious];
const UPLOADS_ITEMS_CASCADE: &[SourceKind] =
    &[SourceKind::Rss, SourceKind::Api, SourceKind::Invidious];
const PLAYLIST_ITEMS_CASCADE: &[SourceKind] = &[SourceKind::Api, SourceKind::Invidious];
const SEARCH_CASCADE: &[SourceKind] = &[SourceKind::Api];

/// The ordered source list for an operation. One table, no duplicated
/// fallback loops; ordering is testable on its own.
pub fn cascade(op: &Operation) -> &'static [SourceKind] {
    match op {
        Operation::Video(_) | Operation::Playlist(_) => METADATA_CASCADE,
        Operation::Channel(_) | Operation::ChannelByHandle(_) => CHANNEL_CASCADE,
        Operation::PlaylistItems(id) if uploads_channel_id(id).is_some() => UPLOADS_ITEMS_CASCADE,
        Operation::PlaylistItems(_) => PLAYLIST_ITEMS_CASCADE,
        Operation::SearchChannel { .. } => SEARCH_CASCADE,
    }
}

/// `UUxxxx` is the uploads playlist of channel `UCxxxx`. Purely
/// textual, and the one piece of business knowledge baked into routing.
pub fn uploads_channel_id(playlist_id: &str) -> Option<String> {
    playlist_id
        .strip_prefix("UU")
        .filter(|suffix| !suffix.is_empty())
        .map(|suffix| format!("UC{suffix}"))
}

enum Outcome {
    Metadata(ResolvedMetadata),
    Entries(Vec<PlaylistVideoEntry>),
}

/// The hybrid metadata resolver.
///
/// Cheap construction, no background work; every resolution call is an
/// independent suspending operation and the health registry is the only
/// shared mutable state between them.
pub struct Resolver {
    oembed: Arc<dyn OEmbedClient>,
    api: Arc<dyn ApiClient>,
    rss: Arc<dyn RssClient>,
    invidious: Arc<dyn InvidiousClient>,
    registry: Arc<dyn HealthRegistry>,
}

impl Resolver {
    /// Wire up the real clients from configuration.
    pub fn new(config: &ResolverConfig) -> Result<Self, reqwest::Error> {
        let client = HttpClient::new(config.http_timeout())?;
        let registry = InstanceRegistry::new(
            config.invidious_instances.clone(),
            config.health.policy(),
        );
        if registry.is_empty() {
            warn!("no Invidious instances configured; mirror fallback is disabled");
        } else {
            debug!("mirror pool holds {} instances", registry.len());
        }
        Ok(Self::with_clients(
            Arc::new(OEmbed::new(client.clone())),
            Arc::new(OfficialApi::new(client.clone(), config.api_key.clone())),
            Arc::new(RssFeed::new(client.clone())),
            Arc::new(Invidious::new(client)),
            Arc::new(registry),
        ))
    }

    /// Dependency-injecting constructor; what the tests use.
    pub fn with_clients(
        oembed: Arc<dyn OEmbedClient>,
        api: Arc<dyn ApiClient>,
        rss: Arc<dyn RssClient>,
        invidious: Arc<dyn InvidiousClient>,
        registry: Arc<dyn HealthRegistry>,
    ) -> Self {
        Self {
            oembed,
            api,
            rss,
            invidious,
            registry,
        }
    }

    /// Classify a URL and resolve whatever it points at.
    pub async fn resolve_url(&self, url: &str) -> Result<ResolvedMetadata, ResolveError> {
        let Some(content) = classify(url) else {
            return Err(ResolveError::InvalidInput(format!(
                "unrecognized URL: {url}"
            )));
        };
        self.resolve_ref(&content).await
    }

    pub async fn resolve_ref(&self, content: &ContentRef) -> Result<ResolvedMetadata, ResolveError> {
        match content.kind {
            RefKind::Video => self.video(&content.id).await,
            RefKind::Playlist => self.playlist(&content.id).await,
            RefKind::Channel => self.channel(&content.id).await,
            RefKind::ChannelHandle | RefKind::ChannelCustomName => {
                self.channel_by_handle(&content.id).await
            }
        }
    }

    pub async fn video(&self, id: &str) -> Result<ResolvedMetadata, ResolveError> {
        self.run_metadata(Operation::Video(id.to_string())).await
    }

    pub async fn playlist(&self, id: &str) -> Result<ResolvedMetadata, ResolveError> {
        self.run_metadata(Operation::Playlist(id.to_string())).await
    }

    pub async fn channel(&self, id: &str) -> Result<ResolvedMetadata, ResolveError> {
        self.run_metadata(Operation::Channel(id.to_string())).await
    }

    pub async fn channel_by_handle(&self, handle: &str) -> Result<ResolvedMetadata, ResolveError> {
        let handle = handle.trim_start_matches('@').to_string();
        self.run_metadata(Operation::ChannelByHandle(handle)).await
    }

    pub async fn playlist_items(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistVideoEntry>, ResolveError> {
        self.run_entries(Operation::PlaylistItems(playlist_id.to_string()))
            .await
    }

    pub async fn search_channel(
        &self,
        channel_id: &str,
        query: &str,
    ) -> Result<Vec<PlaylistVideoEntry>, ResolveError> {
        self.run_entries(Operation::SearchChannel {
            channel_id: channel_id.to_string(),
            query: query.to_string(),
        })
        .await
    }

    async fn run_metadata(&self, op: Operation) -> Result<ResolvedMetadata, ResolveError> {
        match self.run_cascade(op).await? {
            Outcome::Metadata(meta) => Ok(meta),
            Outcome::Entries(_) => Err(ResolveError::InvalidInput(
                "operation does not yield metadata".into(),
            )),
        }
    }

    async fn run_entries(&self, op: Operation) -> Result<Vec<PlaylistVideoEntry>, ResolveError> {
        match self.run_cascade(op).await? {
            Outcome::Entries(entries) => Ok(entries),
            Outcome::Metadata(_) => Err(ResolveError::InvalidInput(
                "operation does not yield a listing".into(),
            )),
        }
    }

    /// The generic cascade runner: strictly sequential, first success
    /// wins, every step failure is a visible value, logged and dropped.
    async fn run_cascade(&self, op: Operation) -> Result<Outcome, ResolveError> {
        for source in cascade(&op) {
            match self.attempt(*source, &op).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) => {
                    debug!("{} failed for {}: {}", source.name(), op.describe(), err);
                }
            }
        }
        warn!("all sources exhausted for {}", op.describe());
        Err(ResolveError::Exhausted {
            operation: op.describe(),
        })
    }

    async fn attempt(&self, source: SourceKind, op: &Operation) -> Result<Outcome, SourceError> {
        match source {
            SourceKind::OEmbed => self.attempt_oembed(op).await,
            SourceKind::Api => self.attempt_api(op).await,
            SourceKind::Rss => self.attempt_rss(op).await,
            SourceKind::Invidious => self.attempt_invidious(op).await,
        }
    }

    // oEmbed has no channel id; the author name is all it knows.
    async fn attempt_oembed(&self, op: &Operation) -> Result<Outcome, SourceError> {
        let meta = match op {
            Operation::Video(id) => {
                let data = self
                    .oembed
                    .fetch(&format!("https://www.youtube.com/watch?v={id}"))
                    .await?;
                ResolvedMetadata::Video {
                    id: id.clone(),
                    title: data.title,
                    thumbnail_url: data.thumbnail_url,
                    channel_id: String::new(),
                    channel_title: data.author_name,
                }
            }
            Operation::Playlist(id) => {
                let data = self
                    .oembed
                    .fetch(&format!("https://www.youtube.com/playlist?list={id}"))
                    .await?;
                ResolvedMetadata::Playlist {
                    id: id.clone(),
                    title: data.title,
                    thumbnail_url: data.thumbnail_url,
                    channel_id: String::new(),
                    channel_title: data.author_name,
                }
            }
            _ => {
                return Err(SourceError::Data(
                    "oEmbed cannot serve this operation".into(),
                ));
            }
        };
        Ok(Outcome::Metadata(meta))
    }

    async fn attempt_api(&self, op: &Operation) -> Result<Outcome, SourceError> {
        match op {
            Operation::Video(id) => Ok(Outcome::Metadata(self.api.video(id).await?)),
            Operation::Playlist(id) => Ok(Outcome::Metadata(self.api.playlist(id).await?)),
            Operation::Channel(id) => Ok(Outcome::Metadata(self.api.channel(id).await?)),
            Operation::ChannelByHandle(handle) => {
                Ok(Outcome::Metadata(self.api.channel_by_handle(handle).await?))
            }
            Operation::PlaylistItems(id) => Ok(Outcome::Entries(
                self.api.playlist_items(id, API_PAGE_SIZE).await?,
            )),
            Operation::SearchChannel { channel_id, query } => Ok(Outcome::Entries(
                self.api
                    .search_channel(channel_id, query, API_PAGE_SIZE)
                    .await?,
            )),
        }
    }

    async fn attempt_rss(&self, op: &Operation) -> Result<Outcome, SourceError> {
        let Operation::PlaylistItems(id) = op else {
            return Err(SourceError::Data("RSS only lists uploads".into()));
        };
        let Some(channel_id) = uploads_channel_id(id) else {
            return Err(SourceError::Data("not an uploads playlist id".into()));
        };
        let videos = self.rss.channel_videos(&channel_id).await?;
        let entries = videos
            .into_iter()
            .enumerate()
            .map(|(idx, video)| PlaylistVideoEntry {
                video_id: video.video_id,
                title: video.title,
                thumbnail_url: video.thumbnail_url,
                channel_title: video.channel_title,
                position: idx as u32,
            })
            .collect();
        Ok(Outcome::Entries(entries))
    }

    /// The Invidious leg: up to three distinct instances. A transport
    /// failure penalizes the instance, unusable data does not — the
    /// mirror answered, the payload was merely useless for this call.
    async fn attempt_invidious(&self, op: &Operation) -> Result<Outcome, SourceError> {
        let mut tried: Vec<String> = Vec::new();
        for _ in 0..INVIDIOUS_ATTEMPTS {
            let Some(base) = self.registry.healthy_instance() else {
                debug!("no healthy Invidious instance available");
                break;
            };
            if tried.contains(&base) {
                // Pool wrapped around: no more distinct instances.
                break;
            }
            tried.push(base.clone());

            match self.invidious_call(&base, op).await {
                Ok(outcome) => {
                    self.registry.report_success(&base);
                    return Ok(outcome);
                }
                Err(err) if err.is_transport() => {
                    warn!("Invidious instance {} unreachable: {}", base, err);
                    self.registry.report_failure(&base);
                }
                Err(err) => {
                    debug!("Invidious instance {} gave unusable data: {}", base, err);
                }
            }
        }
        Err(SourceError::Data(
            "no Invidious instance produced a result".into(),
        ))
    }

    async fn invidious_call(&self, base: &str, op: &Operation) -> Result<Outcome, SourceError> {
        match op {
            Operation::Video(id) => {
                Ok(Outcome::Metadata(self.invidious.video(base, id).await?))
            }
            Operation::Playlist(id) => {
                Ok(Outcome::Metadata(self.invidious.playlist(base, id).await?))
            }
            Operation::Channel(id) => {
                Ok(Outcome::Metadata(self.invidious.channel(base, id).await?))
            }
            Operation::ChannelByHandle(handle) => {
                let channel_id = self.invidious.resolve_handle(base, handle).await?;
                Ok(Outcome::Metadata(
                    self.invidious.channel(base, &channel_id).await?,
                ))
            }
            Operation::PlaylistItems(id) => match uploads_channel_id(id) {
                // Mirrors expose uploads per-channel, not through the
                // synthetic playlist id.
                Some(channel_id) => Ok(Outcome::Entries(
                    self.invidious.channel_videos(base, &channel_id).await?,
                )),
                None => Ok(Outcome::Entries(
                    self.invidious.playlist_items(base, id).await?,
                )),
            },
            Operation::SearchChannel { .. } => Err(SourceError::Data(
                "channel search has no mirror fallback".into(),
            )),
        }
    }
}
