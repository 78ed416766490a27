pub mod api;
pub mod invidious;
pub mod oembed;
pub mod rss;

pub use api::{ApiClient, OfficialApi};
pub use invidious::{Invidious, InvidiousClient};
pub use oembed::{OEmbed, OEmbedClient, OEmbedData};
pub use rss::{RssClient, RssFeed, RssVideo};
