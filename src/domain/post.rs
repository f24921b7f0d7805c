use std::sync::Arc;

use crate::dates::Timestamp;
use crate::domain::FeedSource;

/// One accepted entry. Many posts share the same [`FeedSource`].
#[derive(Debug, Clone)]
pub struct Post {
    pub title: String,
    pub published: Timestamp,
    pub id: String,
    pub link: String,
    pub source: Arc<FeedSource>,
    pub summary: Option<String>,
    pub content: Option<String>,
}

impl Post {
    pub fn new(
        title: String,
        published: Timestamp,
        id: String,
        link: String,
        source: Arc<FeedSource>,
    ) -> Self {
        Self {
            title,
            published,
            id,
            link,
            source,
            summary: None,
            content: None,
        }
    }

    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_content(mut self, content: Option<String>) -> Self {
        self.content = content;
        self
    }
}
