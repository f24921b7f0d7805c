use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregatorError {
    // Normalization errors
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Unknown feed type: root element <{0}> is neither RSS nor Atom")]
    UnknownFeedType(String),

    #[error("Malformed feed source: missing {0}")]
    MalformedSource(String),

    #[error("Malformed entry: missing {0}")]
    MalformedEntry(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Parsing errors
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    // Output errors
    #[error("Rendering failed: {0}")]
    Render(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AggregatorError {
    /// Errors that only invalidate a single entry; the rest of the feed is kept.
    pub fn is_entry_level(&self) -> bool {
        matches!(
            self,
            AggregatorError::MalformedEntry(_) | AggregatorError::InvalidTimestamp(_)
        )
    }
}

pub type AggregatorResult<T> = Result<T, AggregatorError>;
