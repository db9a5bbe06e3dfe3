//! RSS 2.0 parsing
//!
//! Only the `<item>` fields stored locally are read; everything else in the
//! document is ignored.

use almanac_domain::{FeedEntry, Result};
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::errors::InfraError;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: Option<TextElement>,
    #[serde(default)]
    link: Option<TextElement>,
    #[serde(default)]
    guid: Option<TextElement>,
    #[serde(rename = "pubDate", default)]
    pub_date: Option<TextElement>,
    #[serde(default)]
    description: Option<TextElement>,
}

#[derive(Debug, Deserialize)]
struct TextElement {
    #[serde(rename = "$text", default)]
    content: String,
}

fn text(element: Option<TextElement>) -> Option<String> {
    element.map(|e| e.content.trim().to_string()).filter(|s| !s.is_empty())
}

/// Entries of an RSS document fetched from `feed_url`.
///
/// An item is keyed by its `<guid>`, falling back to `<link>` and then the
/// title. Items with none of the three are dropped.
pub fn parse_rss(feed_url: &str, xml: &str) -> Result<Vec<FeedEntry>> {
    let rss: Rss = from_str(xml).map_err(InfraError::from)?;

    Ok(rss
        .channel
        .items
        .into_iter()
        .filter_map(|item| {
            let title = text(item.title);
            let link = text(item.link);
            let guid = text(item.guid).or_else(|| link.clone()).or_else(|| title.clone())?;
            let published_at = text(item.pub_date)
                .and_then(|raw| DateTime::parse_from_rfc2822(&raw).ok())
                .map(|date| date.with_timezone(&Utc));

            Some(FeedEntry {
                feed_url: feed_url.to_string(),
                guid,
                title: title.unwrap_or_default(),
                link,
                published_at,
                summary: text(item.description),
            })
        })
        .collect())
}
