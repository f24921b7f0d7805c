//! Small helpers over `roxmltree` nodes shared by both dialects and the filter.

use roxmltree::{Document, Node};

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";

/// Prefixes that resolve even when the feed itself never declares them.
const KNOWN_PREFIXES: &[(&str, &str)] = &[("atom", ATOM_NS), ("content", CONTENT_NS)];

/// Element with the given local name and no namespace (plain RSS vocabulary).
pub fn is_plain(node: Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().namespace().is_none() && node.tag_name().name() == name
}

/// Element with the given local name in the Atom namespace.
pub fn is_atom(node: Node<'_, '_>, name: &str) -> bool {
    is_in(node, Some(ATOM_NS), name)
}

fn is_in(node: Node<'_, '_>, namespace: Option<&str>, name: &str) -> bool {
    node.is_element() && node.tag_name().namespace() == namespace && node.tag_name().name() == name
}

/// First direct child element matching namespace and local name.
pub fn child<'a, 'input>(
    node: Node<'a, 'input>,
    namespace: Option<&str>,
    name: &str,
) -> Option<Node<'a, 'input>> {
    node.children().find(|c| is_in(*c, namespace, name))
}

pub fn plain_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    child(node, None, name)
}

pub fn atom_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    child(node, Some(ATOM_NS), name)
}

/// Direct text of an element, verbatim. `None` when the element has no text.
pub fn raw_text(node: Node<'_, '_>) -> Option<String> {
    let text: String = node
        .children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Trimmed text of an element; whitespace-only text counts as absent.
pub fn text(node: Node<'_, '_>) -> Option<String> {
    raw_text(node)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Resolve a possibly prefixed element name (`content:encoded`, `title`)
/// into namespace and local name, relative to `scope`.
///
/// Returns `None` for a prefix that cannot be resolved.
pub fn resolve_name<'a>(scope: Node<'a, '_>, qualified: &'a str) -> Option<(Option<&'a str>, &'a str)> {
    match qualified.split_once(':') {
        None => Some((None, qualified)),
        Some((prefix, local)) => {
            let namespace = KNOWN_PREFIXES
                .iter()
                .find(|(known, _)| *known == prefix)
                .map(|(_, uri)| *uri)
                .or_else(|| scope.lookup_namespace_uri(Some(prefix)))?;
            Some((Some(namespace), local))
        }
    }
}

/// Candidate entries anywhere in the document: RSS `item` or Atom `entry`,
/// in document order.
pub fn entries<'a, 'input>(document: &'a Document<'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    document
        .descendants()
        .filter(|n| is_plain(*n, "item") || is_atom(*n, "entry"))
}

/// Preferred Atom `link`: the first `rel="alternate"` (or rel-less) link with
/// an `href`, otherwise the first link with any `href`.
pub fn atom_link(node: Node<'_, '_>) -> Option<String> {
    fn href(link: &Node<'_, '_>) -> Option<String> {
        link.attribute("href")
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
    }

    let links: Vec<Node<'_, '_>> = node.children().filter(|c| is_atom(*c, "link")).collect();

    links
        .iter()
        .filter(|l| matches!(l.attribute("rel"), None | Some("alternate")))
        .find_map(href)
        .or_else(|| links.iter().find_map(href))
}
