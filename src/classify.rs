//! URL classification: raw strings into typed content references.
//!
//! Pure string work, no I/O. Anything that is not a recognized YouTube
//! content URL comes back as `None` and the caller decides what that
//! means.

use serde::{Deserialize, Serialize};

/// What a recognized URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RefKind {
    Video,
    Channel,
    /// An `@handle`; needs a resolution call before it is a channel id.
    ChannelHandle,
    /// A legacy `/c/Name` custom URL; resolved best-effort as a handle.
    ChannelCustomName,
    Playlist,
}

/// A classified content reference. The `id` semantics depend on `kind`:
/// an opaque video/channel/playlist id, or a handle/custom-name string
/// that still requires resolution against a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRef {
    pub kind: RefKind,
    pub id: String,
}

impl ContentRef {
    fn new(kind: RefKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

const HOSTS: [&str; 4] = ["youtube.com", "www.youtube.com", "m.youtube.com", "youtu.be"];

/// Classify a raw URL into a [`ContentRef`].
///
/// Host matching is case-insensitive; the fragment is ignored; when both
/// `list` and `v` query parameters are present the playlist wins. The
/// bare domain root, `/watch` without `v`, and non-content paths such as
/// `/feed/...` are not recognized.
pub fn classify(url: &str) -> Option<ContentRef> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }

    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let rest = rest.split('#').next().unwrap_or(rest);

    let (host, path_and_query) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };
    let host = host.to_ascii_lowercase();
    if !HOSTS.contains(&host.as_str()) {
        return None;
    }

    let (path, query) = match path_and_query.split_once('?') {
        Some((p, q)) => (p, q),
        None => (path_and_query, ""),
    };

    let list_param = query_param(query, "list");

    // Playlist beats video when both `list` and `v` are present.
    if let Some(list) = list_param {
        if path == "/playlist" || path == "/watch" {
            return Some(ContentRef::new(RefKind::Playlist, list));
        }
    }

    if host == "youtu.be" {
        let id = segment_head(path.trim_start_matches('/'))?;
        return Some(ContentRef::new(RefKind::Video, id));
    }

    if path == "/watch" {
        return query_param(query, "v").map(|v| ContentRef::new(RefKind::Video, v));
    }

    if let Some(tail) = path
        .strip_prefix("/shorts/")
        .or_else(|| path.strip_prefix("/embed/"))
        .or_else(|| path.strip_prefix("/live/"))
    {
        let id = segment_head(tail)?;
        return Some(ContentRef::new(RefKind::Video, id));
    }

    if let Some(tail) = path.strip_prefix("/channel/") {
        let id = segment_head(tail)?;
        return Some(ContentRef::new(RefKind::Channel, id));
    }
    if let Some(tail) = path.strip_prefix("/@") {
        let handle = segment_head(tail)?;
        return Some(ContentRef::new(RefKind::ChannelHandle, handle));
    }
    if let Some(tail) = path.strip_prefix("/c/") {
        let name = segment_head(tail)?;
        return Some(ContentRef::new(RefKind::ChannelCustomName, name));
    }

    None
}

/// First non-empty value of a query parameter, exact-case key match.
fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == name && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// First path segment, dropping trailing slash and sub-paths.
fn segment_head(tail: &str) -> Option<String> {
    let head = tail.split('/').next().unwrap_or("");
    if head.is_empty() {
        None
    } else {
        Some(head.to_string())
    }
}
