use roxmltree::Document;

use crate::domain::FeedType;
use crate::errors::{AggregatorError, AggregatorResult};
use crate::sources::xml;

/// Decide the feed dialect from the document's root element.
///
/// `<rss>` without a namespace is RSS, `<feed>` in the Atom namespace is
/// Atom. Anything else (RDF, HTML error pages, an Atom-less `<feed>`) is
/// rejected.
pub fn detect_feed_type(document: &Document<'_>) -> AggregatorResult<FeedType> {
    let root = document.root_element();

    match (xml::is_plain(root, "rss"), xml::is_atom(root, "feed")) {
        (true, false) => Ok(FeedType::Rss),
        (false, true) => Ok(FeedType::Atom),
        _ => Err(AggregatorError::UnknownFeedType(
            root.tag_name().name().to_string(),
        )),
    }
}
