//! Per-feed inclusion policies evaluated against raw entry nodes.

use std::collections::BTreeMap;

use roxmltree::Node;

use crate::sources::xml;

/// One category match: `text` compares the category's text, every other key
/// names an attribute of the same category element.
pub type CategorySpec = BTreeMap<String, String>;

/// Element name (optionally prefixed, e.g. `content:encoded`) to expected text.
pub type FieldMatch = BTreeMap<String, String>;

/// Which entries of a feed are kept.
///
/// `None` means the policy is not configured. A configured but empty list
/// matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InclusionPolicy {
    pub category: Option<Vec<CategorySpec>>,
    pub posts: Option<Vec<FieldMatch>>,
}

impl InclusionPolicy {
    pub fn include_all() -> Self {
        Self::default()
    }

    pub fn is_include_all(&self) -> bool {
        self.category.is_none() && self.posts.is_none()
    }
}

/// Keep the entry when no policy is configured, or when either the category
/// or the posts policy matches.
pub fn should_include(policy: &InclusionPolicy, entry: Node<'_, '_>) -> bool {
    policy.is_include_all()
        || matches_category(policy.category.as_deref(), entry)
        || matches_posts(policy.posts.as_deref(), entry)
}

/// Any spec matching any `category` element (RSS or Atom) below the entry.
pub fn matches_category(specs: Option<&[CategorySpec]>, entry: Node<'_, '_>) -> bool {
    let Some(specs) = specs else {
        return false;
    };

    let categories: Vec<Node<'_, '_>> = entry
        .descendants()
        .filter(|n| xml::is_plain(*n, "category") || xml::is_atom(*n, "category"))
        .collect();

    specs
        .iter()
        .any(|spec| categories.iter().any(|category| category_matches(spec, *category)))
}

fn category_matches(spec: &CategorySpec, category: Node<'_, '_>) -> bool {
    spec.iter().all(|(key, value)| {
        if key == "text" {
            xml::text(category).as_deref() == Some(value.trim())
        } else {
            category.attribute(key.as_str()) == Some(value.as_str())
        }
    })
}

/// Any configured element whose first direct child match has the given text.
pub fn matches_posts(specs: Option<&[FieldMatch]>, entry: Node<'_, '_>) -> bool {
    let Some(specs) = specs else {
        return false;
    };

    specs.iter().flat_map(|spec| spec.iter()).any(|(name, value)| {
        xml::resolve_name(entry, name)
            .and_then(|(namespace, local)| xml::child(entry, namespace, local))
            .and_then(xml::text)
            .is_some_and(|text| text == value.trim())
    })
}
