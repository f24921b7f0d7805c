use std::sync::Arc;

use roxmltree::{Document, Node};
use tracing::warn;

use crate::dates::normalize_iso8601;
use crate::domain::{Author, FeedSource, FeedType, Post};
use crate::errors::{AggregatorError, AggregatorResult};
use crate::sources::traits::FeedExtractor;
use crate::sources::xml;

/// Reader for Atom 1.0 documents (`<feed xmlns="http://www.w3.org/2005/Atom">`).
#[derive(Debug, Default)]
pub struct AtomExtractor;

impl AtomExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_author(feed: Node<'_, '_>) -> Option<Author> {
        let author = xml::atom_child(feed, "author")?;
        let field = |name: &str| xml::atom_child(author, name).and_then(xml::text);

        Some(Author {
            name: field("name"),
            config_name: None,
            uri: field("uri"),
            email: field("email"),
        })
    }
}

fn required(node: Node<'_, '_>, name: &str) -> Option<String> {
    xml::atom_child(node, name).and_then(xml::text)
}

impl FeedExtractor for AtomExtractor {
    fn feed_type(&self) -> FeedType {
        FeedType::Atom
    }

    fn extract_source(&self, document: &Document<'_>) -> AggregatorResult<FeedSource> {
        let missing = |field: &str| AggregatorError::MalformedSource(field.to_string());
        let feed = document.root_element();

        let title = required(feed, "title").ok_or_else(|| missing("feed title"))?;
        let id = required(feed, "id").ok_or_else(|| missing("feed id"))?;
        let link = xml::atom_link(feed).ok_or_else(|| missing("feed link"))?;

        let updated = required(feed, "updated").and_then(|text| {
            normalize_iso8601(&text)
                .map_err(|e| warn!("Ignoring updated of {}: {}", id, e))
                .ok()
        });

        Ok(FeedSource::new(id, title, link)
            .with_author(Self::extract_author(feed))
            .with_updated(updated))
    }

    fn extract_post(&self, source: &Arc<FeedSource>, entry: Node<'_, '_>) -> AggregatorResult<Post> {
        let missing = |field: &str| AggregatorError::MalformedEntry(field.to_string());

        let title = required(entry, "title").ok_or_else(|| missing("title"))?;
        let published = required(entry, "published")
            .or_else(|| required(entry, "updated"))
            .ok_or_else(|| missing("published or updated"))?;
        let published = normalize_iso8601(&published)?;
        let id = required(entry, "id").ok_or_else(|| missing("id"))?;
        let link = xml::atom_link(entry).ok_or_else(|| missing("link"))?;

        let content = xml::atom_child(entry, "content").and_then(xml::raw_text);
        let summary = xml::atom_child(entry, "summary").and_then(xml::raw_text);

        Ok(Post::new(title, published, id, link, Arc::clone(source))
            .with_summary(summary)
            .with_content(content))
    }
}
