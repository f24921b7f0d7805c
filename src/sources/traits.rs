use std::sync::Arc;

use roxmltree::{Document, Node};

use crate::domain::{FeedSource, FeedType, Post};
use crate::errors::AggregatorResult;

/// Dialect-specific reader turning a parsed feed document into the
/// normalized model.
pub trait FeedExtractor: Send + Sync {
    /// Dialect this extractor reads
    fn feed_type(&self) -> FeedType;

    /// Build the feed-level record from the whole document
    fn extract_source(&self, document: &Document<'_>) -> AggregatorResult<FeedSource>;

    /// Build one post from an `item`/`entry` node of the same document
    fn extract_post(&self, source: &Arc<FeedSource>, entry: Node<'_, '_>) -> AggregatorResult<Post>;
}
