//! Hybrid metadata resolution for YouTube content.
//!
//! Given a URL or a bare id, the [`Resolver`] returns metadata (title,
//! thumbnail, channel) and item listings for videos, channels and
//! playlists while spending as little official-API quota as possible.
//! Each operation cascades through a fixed, cost-ordered list of data
//! sources — the free oEmbed endpoint, the quota-metered Data API,
//! per-channel RSS feeds and a pool of community Invidious mirrors —
//! taking the first source that answers usably. Mirror liveness is
//! tracked by an [`InstanceRegistry`] so unreachable mirrors drop out
//! of rotation quickly without a single bad response evicting a
//! healthy one.

pub mod classify;
pub mod common;
pub mod config;
pub mod health;
pub mod model;
pub mod resolver;
pub mod sources;

pub use classify::{ContentRef, RefKind, classify};
pub use common::errors::{ResolveError, SourceError};
pub use config::ResolverConfig;
pub use health::{HealthPolicy, HealthRegistry, InstanceRegistry};
pub use model::{PlaylistVideoEntry, ResolvedMetadata};
pub use resolver::{Operation, Resolver};
