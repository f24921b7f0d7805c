use std::sync::OnceLock;
use std::time::Duration;

use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};
use url::Url;

use crate::config::FetchConfig;
use crate::errors::AggregatorResult;

/// Source of raw feed documents.
#[cfg_attr(test, mockall::automock)]
pub trait FeedFetcher: Send + Sync {
    /// Fetch the raw XML text behind a feed URL
    fn fetch(&self, url: &str) -> AggregatorResult<String>;
}

/// Blocking HTTP fetcher. Every request is bounded by the configured
/// per-feed timeout; expiry surfaces as [`AggregatorError::Http`].
///
/// [`AggregatorError::Http`]: crate::errors::AggregatorError::Http
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> AggregatorResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }
}

impl FeedFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> AggregatorResult<String> {
        let url = Url::parse(url)?;
        debug!("Fetching feed from: {}", url);

        let response = self.client.get(url.clone()).send()?.error_for_status()?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes()?;

        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(decode_feed(&bytes, content_type.as_deref()))
    }
}

fn xml_declared_encoding() -> &'static Regex {
    static DECLARATION: OnceLock<Regex> = OnceLock::new();
    DECLARATION.get_or_init(|| {
        Regex::new(r#"^\s*<\?xml[^>]*?\bencoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#)
            .expect("declaration pattern is valid")
    })
}

/// `charset` parameter of a `Content-Type` header value.
fn header_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Decode a feed body to text.
///
/// A byte order mark wins, then the XML declaration's `encoding`, then the
/// HTTP charset, then UTF-8. Undecodable bytes become U+FFFD with a warning.
pub fn decode_feed(bytes: &[u8], content_type: Option<&str>) -> String {
    let declared = xml_declared_encoding()
        .captures(bytes)
        .and_then(|caps| caps.get(1))
        .and_then(|label| Encoding::for_label(label.as_bytes()));
    let from_header = content_type
        .and_then(header_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()));
    let encoding = declared.or(from_header).unwrap_or(UTF_8);

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!("Feed body is not valid {}; replaced undecodable bytes", used.name());
    }
    text.into_owned()
}
