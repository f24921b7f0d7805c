use crate::dates::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedType {
    Rss,
    Atom,
}

impl FeedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedType::Rss => "rss",
            FeedType::Atom => "atom",
        }
    }
}

impl std::fmt::Display for FeedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity attached to a feed source.
///
/// `config_name` is the operator-assigned feed name; it is filled in by the
/// aggregator after extraction and serves as the display fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub name: Option<String>,
    pub config_name: Option<String>,
    pub uri: Option<String>,
    pub email: Option<String>,
}

impl Author {
    /// Name to show for this author: the feed's own name, else the configured one.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.config_name.as_deref())
    }
}

/// Feed-level metadata, one per configured feed and run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub id: String,
    pub title: String,
    pub link: String,
    pub author: Option<Author>,
    pub updated: Option<Timestamp>,
}

impl FeedSource {
    pub fn new(id: String, title: String, link: String) -> Self {
        Self {
            id,
            title,
            link,
            author: None,
            updated: None,
        }
    }

    pub fn with_author(mut self, author: Option<Author>) -> Self {
        self.author = author;
        self
    }

    pub fn with_updated(mut self, updated: Option<Timestamp>) -> Self {
        self.updated = updated;
        self
    }

    /// Attach the configured feed name, synthesizing an author if the feed
    /// declared none.
    pub fn with_config_name(mut self, config_name: &str) -> Self {
        let author = self.author.get_or_insert_with(Author::default);
        author.config_name = Some(config_name.to_string());
        self
    }

    /// Label used when rendering posts from this source.
    pub fn display_name(&self) -> &str {
        self.author
            .as_ref()
            .and_then(Author::display_name)
            .unwrap_or(&self.title)
    }
}
