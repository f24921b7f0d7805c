pub mod atom;
pub mod detect;
pub mod registry;
pub mod rss;
pub mod traits;
pub mod xml;

pub use atom::AtomExtractor;
pub use detect::detect_feed_type;
pub use registry::ExtractorRegistry;
pub use rss::RssExtractor;
pub use traits::FeedExtractor;
