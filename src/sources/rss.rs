use std::sync::Arc;

use roxmltree::{Document, Node};
use tracing::warn;

use crate::dates::normalize_rfc2822;
use crate::domain::{FeedSource, FeedType, Post};
use crate::errors::{AggregatorError, AggregatorResult};
use crate::sources::traits::FeedExtractor;
use crate::sources::xml::{self, CONTENT_NS};

/// Reader for RSS 2.0 documents (`<rss><channel>...`), including the
/// `content:encoded` extension.
#[derive(Debug, Default)]
pub struct RssExtractor;

impl RssExtractor {
    pub fn new() -> Self {
        Self
    }
}

fn required(node: Node<'_, '_>, name: &str) -> Option<String> {
    xml::plain_child(node, name).and_then(xml::text)
}

impl FeedExtractor for RssExtractor {
    fn feed_type(&self) -> FeedType {
        FeedType::Rss
    }

    fn extract_source(&self, document: &Document<'_>) -> AggregatorResult<FeedSource> {
        let missing = |field: &str| AggregatorError::MalformedSource(field.to_string());

        let channel = xml::plain_child(document.root_element(), "channel")
            .ok_or_else(|| missing("channel"))?;
        let title = required(channel, "title").ok_or_else(|| missing("channel title"))?;
        let link = required(channel, "link").ok_or_else(|| missing("channel link"))?;

        let updated = required(channel, "lastBuildDate").and_then(|text| {
            normalize_rfc2822(&text)
                .map_err(|e| warn!("Ignoring lastBuildDate of {}: {}", link, e))
                .ok()
        });

        // RSS has no feed-level id; the site link stands in for it.
        Ok(FeedSource::new(link.clone(), title, link).with_updated(updated))
    }

    fn extract_post(&self, source: &Arc<FeedSource>, entry: Node<'_, '_>) -> AggregatorResult<Post> {
        let missing = |field: &str| AggregatorError::MalformedEntry(field.to_string());

        let title = required(entry, "title").ok_or_else(|| missing("title"))?;
        let published = required(entry, "pubDate").ok_or_else(|| missing("pubDate"))?;
        let published = normalize_rfc2822(&published)?;
        let id = required(entry, "guid").ok_or_else(|| missing("guid"))?;
        let link = required(entry, "link").ok_or_else(|| missing("link"))?;

        let description = xml::plain_child(entry, "description").and_then(xml::raw_text);
        // content:encoded wins the body; description is then the summary.
        // Without it, description is the body and there is no summary.
        let (content, summary) = match xml::child(entry, Some(CONTENT_NS), "encoded") {
            Some(encoded) => (xml::raw_text(encoded), description),
            None => (description, None),
        };

        Ok(Post::new(title, published, id, link, Arc::clone(source))
            .with_summary(summary)
            .with_content(content))
    }
}
