use roxmltree::Document;

use crate::errors::{AggregatorError, AggregatorResult};
use crate::sources::atom::AtomExtractor;
use crate::sources::detect::detect_feed_type;
use crate::sources::rss::RssExtractor;
use crate::sources::traits::FeedExtractor;

pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn FeedExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            extractors: Vec::new(),
        };

        registry.register(Box::new(RssExtractor::new()));
        registry.register(Box::new(AtomExtractor::new()));

        registry
    }

    pub fn register(&mut self, extractor: Box<dyn FeedExtractor>) {
        self.extractors.push(extractor);
    }

    /// Pick the extractor for a parsed document, once per feed
    pub fn for_document(&self, document: &Document<'_>) -> AggregatorResult<&dyn FeedExtractor> {
        let feed_type = detect_feed_type(document)?;

        self.extractors
            .iter()
            .find(|e| e.feed_type() == feed_type)
            .map(|e| e.as_ref())
            .ok_or_else(|| AggregatorError::UnknownFeedType(feed_type.to_string()))
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
