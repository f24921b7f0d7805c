use std::fmt;
use std::sync::Arc;

use roxmltree::{Document, ParsingOptions};
use tracing::{debug, error, info, warn};

use crate::config::FeedConfig;
use crate::domain::{FeedSource, Post};
use crate::errors::AggregatorResult;
use crate::filter;
use crate::services::fetch_service::FeedFetcher;
use crate::sources::{xml, ExtractorRegistry};

#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateOptions {
    /// Log every entry decision at info level instead of debug.
    pub debug: bool,
}

/// What happened to one configured feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedReport {
    pub name: String,
    pub entries_seen: usize,
    pub entries_filtered: usize,
    pub entries_skipped: usize,
    pub posts: usize,
    /// Set when the whole feed was skipped.
    pub error: Option<String>,
}

impl FeedReport {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of one aggregation pass.
#[derive(Debug, Default)]
pub struct Aggregation {
    /// Accepted posts, newest first.
    pub posts: Vec<Post>,
    /// One source per successfully processed feed, in configured order.
    pub sources: Vec<Arc<FeedSource>>,
    /// One report per attempted feed, in configured order.
    pub reports: Vec<FeedReport>,
}

impl Aggregation {
    pub fn failures(&self) -> impl Iterator<Item = &FeedReport> {
        self.reports.iter().filter(|r| r.is_failure())
    }

    pub fn entries_skipped(&self) -> usize {
        self.reports.iter().map(|r| r.entries_skipped).sum()
    }

    pub fn entries_filtered(&self) -> usize {
        self.reports.iter().map(|r| r.entries_filtered).sum()
    }
}

/// Newest first. The sort is stable, so equal timestamps keep feed order and
/// then entry order.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.published.cmp(&a.published));
}

pub struct AggregateService {
    registry: ExtractorRegistry,
    options: AggregateOptions,
}

impl AggregateService {
    pub fn new(registry: ExtractorRegistry, options: AggregateOptions) -> Self {
        Self { registry, options }
    }

    fn note(&self, message: fmt::Arguments<'_>) {
        if self.options.debug {
            info!("{}", message);
        } else {
            debug!("{}", message);
        }
    }

    /// Normalize one feed document. Entry-level failures are skipped and
    /// counted in `report`; anything returned as `Err` invalidates the feed.
    pub fn process_feed(
        &self,
        feed: &FeedConfig,
        text: &str,
        report: &mut FeedReport,
    ) -> AggregatorResult<(Arc<FeedSource>, Vec<Post>)> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let document = Document::parse_with_options(text, options)?;

        let extractor = self.registry.for_document(&document)?;
        let source = extractor
            .extract_source(&document)?
            .with_config_name(&feed.name);
        let source = Arc::new(source);
        self.note(format_args!(
            "{}: {} feed \"{}\" ({})",
            feed.name,
            extractor.feed_type(),
            source.title,
            source.id
        ));

        let policy = feed.policy();
        let mut posts = Vec::new();

        for (position, entry) in xml::entries(&document).enumerate() {
            report.entries_seen += 1;

            if !filter::should_include(&policy, entry) {
                report.entries_filtered += 1;
                self.note(format_args!("{}: entry {} excluded by filter", feed.name, position));
                continue;
            }

            match extractor.extract_post(&source, entry) {
                Ok(post) => {
                    self.note(format_args!("{}: entry {} accepted ({})", feed.name, position, post.id));
                    posts.push(post);
                }
                Err(e) if e.is_entry_level() => {
                    report.entries_skipped += 1;
                    warn!("{}: skipping entry {}: {}", feed.name, position, e);
                }
                Err(e) => return Err(e),
            }
        }

        report.posts = posts.len();
        Ok((source, posts))
    }

    /// Normalize, filter and merge the given feeds in order.
    ///
    /// Each input pairs a feed with the outcome of fetching it; a failed fetch
    /// is reported like any other feed-level failure.
    pub fn aggregate<'a, I>(&self, inputs: I) -> Aggregation
    where
        I: IntoIterator<Item = (&'a FeedConfig, AggregatorResult<String>)>,
    {
        let mut aggregation = Aggregation::default();

        for (feed, fetched) in inputs {
            let mut report = FeedReport::new(&feed.name);

            let processed = fetched.and_then(|text| self.process_feed(feed, &text, &mut report));
            match processed {
                Ok((source, posts)) => {
                    info!(
                        "{}: {} posts ({} filtered, {} skipped)",
                        feed.name,
                        posts.len(),
                        report.entries_filtered,
                        report.entries_skipped
                    );
                    aggregation.sources.push(source);
                    aggregation.posts.extend(posts);
                }
                Err(e) => {
                    error!("Skipping feed {}: {}", feed.name, e);
                    report.error = Some(e.to_string());
                }
            }

            aggregation.reports.push(report);
        }

        sort_posts(&mut aggregation.posts);
        aggregation
    }

    /// Fetch and aggregate the feeds one after another.
    pub fn run<F>(&self, fetcher: &F, feeds: &[FeedConfig]) -> Aggregation
    where
        F: FeedFetcher + ?Sized,
    {
        self.aggregate(feeds.iter().map(|feed| {
            info!("Fetching {} from {}", feed.name, feed.url);
            (feed, fetcher.fetch(&feed.url))
        }))
    }
}

impl Default for AggregateService {
    fn default() -> Self {
        Self::new(ExtractorRegistry::new(), AggregateOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AggregatorError;
    use crate::services::fetch_service::MockFeedFetcher;
    use std::collections::BTreeMap;

    fn rss(items: &[(&str, &str)]) -> String {
        let items: String = items
            .iter()
            .map(|(guid, date)| {
                format!(
                    "<item><title>{guid}</title><link>https://rss.example/{guid}</link>\
                     <guid>{guid}</guid><pubDate>{date}</pubDate><category>{guid}</category></item>"
                )
            })
            .collect();
        format!(
            "<rss version=\"2.0\"><channel><title>RSS</title>\
             <link>https://rss.example/</link>{items}</channel></rss>"
        )
    }

    fn atom(entries: &[(&str, &str)]) -> String {
        let entries: String = entries
            .iter()
            .map(|(id, date)| {
                format!(
                    "<entry><title>{id}</title><link href=\"https://atom.example/{id}\"/>\
                     <id>{id}</id><updated>{date}</updated></entry>"
                )
            })
            .collect();
        format!(
            "<feed xmlns=\"http://www.w3.org/2005/Atom\"><title>Atom</title>\
             <id>urn:atom</id><link href=\"https://atom.example/\"/>{entries}</feed>"
        )
    }

    fn ids(aggregation: &Aggregation) -> Vec<&str> {
        aggregation.posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_merge_orders_newest_first() {
        let a = FeedConfig::new("a", "https://rss.example/feed");
        let b = FeedConfig::new("b", "https://atom.example/feed");
        let service = AggregateService::default();

        let aggregation = service.aggregate(vec![
            (
                &a,
                Ok(rss(&[
                    ("t1", "Mon, 01 Jan 2024 10:00:00 GMT"),
                    ("t3", "Mon, 01 Jan 2024 12:00:00 GMT"),
                ])),
            ),
            (
                &b,
                Ok(atom(&[("t2", "2024-01-01T11:00:00Z"), ("t4", "2024-01-01T13:00:00Z")])),
            ),
        ]);

        assert_eq!(ids(&aggregation), vec!["t4", "t3", "t2", "t1"]);
        assert_eq!(aggregation.sources.len(), 2);
        assert_eq!(aggregation.failures().count(), 0);
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let a = FeedConfig::new("a", "https://rss.example/feed");
        let b = FeedConfig::new("b", "https://atom.example/feed");
        let service = AggregateService::default();

        let aggregation = service.aggregate(vec![
            (
                &a,
                Ok(rss(&[
                    ("a1", "Mon, 01 Jan 2024 10:00:00 GMT"),
                    ("a2", "Mon, 01 Jan 2024 10:00:00 GMT"),
                ])),
            ),
            (
                &b,
                Ok(atom(&[("b1", "2024-01-01T10:00:00Z"), ("newest", "2024-01-02T00:00:00Z")])),
            ),
        ]);

        assert_eq!(ids(&aggregation), vec!["newest", "a1", "a2", "b1"]);
    }

    #[test]
    fn test_bad_entry_skipped_rest_of_feed_kept() {
        let feed = FeedConfig::new("a", "https://rss.example/feed");
        let text = rss(&[("first", "Mon, 01 Jan 2024 10:00:00 GMT")]).replace(
            "</channel>",
            "<item><title>no guid</title><link>https://rss.example/x</link>\
             <pubDate>Mon, 01 Jan 2024 11:00:00 GMT</pubDate></item>\
             <item><title>bad date</title><link>https://rss.example/y</link>\
             <guid>bad-date</guid><pubDate>tomorrow</pubDate></item>\
             <item><title>last</title><link>https://rss.example/last</link>\
             <guid>last</guid><pubDate>Mon, 01 Jan 2024 12:00:00 GMT</pubDate></item></channel>",
        );

        let aggregation = AggregateService::default().aggregate(vec![(&feed, Ok(text))]);

        assert_eq!(ids(&aggregation), vec!["last", "first"]);
        let report = &aggregation.reports[0];
        assert_eq!(report.entries_seen, 4);
        assert_eq!(report.entries_skipped, 2);
        assert_eq!(report.posts, 2);
        assert!(!report.is_failure());
    }

    #[test]
    fn test_unknown_feed_type_skips_only_that_feed() {
        let html = FeedConfig::new("html", "https://html.example/");
        let good = FeedConfig::new("good", "https://atom.example/feed");

        let aggregation = AggregateService::default().aggregate(vec![
            (&html, Ok("<html><body><p>Not a feed</p></body></html>".to_string())),
            (&good, Ok(atom(&[("only", "2024-01-01T10:00:00Z")]))),
        ]);

        assert_eq!(ids(&aggregation), vec!["only"]);
        assert_eq!(aggregation.sources.len(), 1);

        let failures: Vec<&FeedReport> = aggregation.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name, "html");
        assert!(failures[0].error.as_deref().unwrap().contains("Unknown feed type"));
    }

    #[test]
    fn test_malformed_source_and_bad_xml_are_feed_failures() {
        let no_title = FeedConfig::new("no-title", "https://a.example/");
        let broken = FeedConfig::new("broken", "https://b.example/");
        let unreachable = FeedConfig::new("unreachable", "https://c.example/");

        let aggregation = AggregateService::default().aggregate(vec![
            (
                &no_title,
                Ok("<rss><channel><link>https://a.example/</link></channel></rss>".to_string()),
            ),
            (&broken, Ok("<rss><channel>".to_string())),
            (
                &unreachable,
                Err(AggregatorError::Config("connection refused".to_string())),
            ),
        ]);

        assert!(aggregation.posts.is_empty());
        assert!(aggregation.sources.is_empty());
        assert_eq!(aggregation.failures().count(), 3);
        assert!(aggregation.reports[0].error.as_deref().unwrap().contains("Malformed feed source"));
        assert!(aggregation.reports[1].error.as_deref().unwrap().contains("XML parsing failed"));
    }

    #[test]
    fn test_config_name_is_back_filled_before_posts() {
        let feed = FeedConfig::new("rusty", "https://rss.example/feed");
        let aggregation = AggregateService::default().aggregate(vec![(
            &feed,
            Ok(rss(&[
                ("one", "Mon, 01 Jan 2024 10:00:00 GMT"),
                ("two", "Mon, 01 Jan 2024 11:00:00 GMT"),
            ])),
        )]);

        for post in &aggregation.posts {
            let author = post.source.author.as_ref().unwrap();
            assert_eq!(author.config_name.as_deref(), Some("rusty"));
            assert!(Arc::ptr_eq(&post.source, &aggregation.sources[0]));
        }
    }

    #[test]
    fn test_filter_policy_applied_per_feed() {
        let mut feed = FeedConfig::new("picky", "https://rss.example/feed");
        let mut wanted = BTreeMap::new();
        wanted.insert("text".to_string(), "keep".to_string());
        feed.category = Some(vec![wanted]);

        let aggregation = AggregateService::default().aggregate(vec![(
            &feed,
            Ok(rss(&[
                ("keep", "Mon, 01 Jan 2024 10:00:00 GMT"),
                ("drop", "Mon, 01 Jan 2024 11:00:00 GMT"),
            ])),
        )]);

        assert_eq!(ids(&aggregation), vec!["keep"]);
        assert_eq!(aggregation.entries_filtered(), 1);
        assert_eq!(aggregation.entries_skipped(), 0);
    }

    #[test]
    fn test_doctype_is_accepted() {
        let feed = FeedConfig::new("old", "https://rss.example/feed");
        let text = format!(
            "<!DOCTYPE rss PUBLIC \"-//Netscape Communications//DTD RSS 0.91//EN\" \
             \"http://my.netscape.com/publish/formats/rss-0.91.dtd\">{}",
            rss(&[("x", "Mon, 01 Jan 2024 10:00:00 GMT")])
        );

        let aggregation = AggregateService::default().aggregate(vec![(&feed, Ok(text))]);
        assert_eq!(ids(&aggregation), vec!["x"]);
    }

    #[test]
    fn test_run_fetches_each_feed_in_order() {
        let feeds = vec![
            FeedConfig::new("a", "https://rss.example/feed"),
            FeedConfig::new("down", "https://down.example/feed"),
            FeedConfig::new("b", "https://atom.example/feed"),
        ];

        let mut fetcher = MockFeedFetcher::new();
        let mut seq = mockall::Sequence::new();
        fetcher
            .expect_fetch()
            .withf(|url| url.to_string() == "https://rss.example/feed")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(rss(&[("a1", "Mon, 01 Jan 2024 10:00:00 GMT")])));
        fetcher
            .expect_fetch()
            .withf(|url| url.to_string() == "https://down.example/feed")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AggregatorError::Config("timed out".to_string())));
        fetcher
            .expect_fetch()
            .withf(|url| url.to_string() == "https://atom.example/feed")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(atom(&[("b1", "2024-01-01T09:00:00Z")])));

        let aggregation = AggregateService::default().run(&fetcher, &feeds);

        assert_eq!(ids(&aggregation), vec!["a1", "b1"]);
        let names: Vec<&str> = aggregation.reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "down", "b"]);
        assert!(aggregation.reports[1].is_failure());
    }
}
