//! Output renderers for an aggregation: a combined Atom feed and a static
//! HTML page.

use std::fmt::{self, Write as _};
use std::io::Cursor;

use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::SiteConfig;
use crate::dates::Timestamp;
use crate::domain::{FeedSource, Post};
use crate::errors::{AggregatorError, AggregatorResult};
use crate::sources::xml::ATOM_NS;

fn render_error<E: fmt::Display>(e: E) -> AggregatorError {
    AggregatorError::Render(e.to_string())
}

struct AtomWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl AtomWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> AggregatorResult<()> {
        self.writer.write_event(event).map_err(render_error)
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> AggregatorResult<()> {
        let mut start = BytesStart::new(name);
        for attribute in attributes {
            start.push_attribute(*attribute);
        }
        self.event(Event::Start(start))
    }

    fn end(&mut self, name: &str) -> AggregatorResult<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> AggregatorResult<()> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.event(Event::Empty(element))
    }

    fn text_element(&mut self, name: &str, attributes: &[(&str, &str)], text: &str) -> AggregatorResult<()> {
        self.start(name, attributes)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn finish(self) -> AggregatorResult<String> {
        String::from_utf8(self.writer.into_inner().into_inner()).map_err(render_error)
    }
}

/// Render the merged posts as an Atom 1.0 document.
///
/// `generated_at` becomes the feed's `updated`; each entry carries its
/// originating feed in a `<source>` element.
pub fn render_atom(site: &SiteConfig, posts: &[Post], generated_at: Timestamp) -> AggregatorResult<String> {
    let mut out = AtomWriter::new();
    let updated = generated_at.to_string();

    out.event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    out.start("feed", &[("xmlns", ATOM_NS)])?;

    out.text_element("title", &[], &site.title)?;
    out.text_element("id", &[], site.feed_id())?;
    out.empty("link", &[("href", site.link.as_str())])?;
    if let Some(subtitle) = &site.subtitle {
        out.text_element("subtitle", &[], subtitle)?;
    }
    out.text_element("updated", &[], &updated)?;
    if let Some(author) = &site.author {
        out.start("author", &[])?;
        out.text_element("name", &[], author)?;
        out.end("author")?;
    }

    for post in posts {
        write_entry(&mut out, post)?;
    }

    out.end("feed")?;
    out.finish()
}

fn write_entry(out: &mut AtomWriter, post: &Post) -> AggregatorResult<()> {
    let published = post.published.to_string();

    out.start("entry", &[])?;
    out.text_element("title", &[], &post.title)?;
    out.empty("link", &[("href", post.link.as_str())])?;
    out.text_element("id", &[], &post.id)?;
    out.text_element("published", &[], &published)?;
    out.text_element("updated", &[], &published)?;
    if let Some(summary) = &post.summary {
        out.text_element("summary", &[("type", "html")], summary)?;
    }
    if let Some(content) = &post.content {
        out.text_element("content", &[("type", "html")], content)?;
    }
    out.start("author", &[])?;
    out.text_element("name", &[], post.source.display_name())?;
    out.end("author")?;
    write_source(out, &post.source)?;
    out.end("entry")
}

fn write_source(out: &mut AtomWriter, source: &FeedSource) -> AggregatorResult<()> {
    out.start("source", &[])?;
    out.text_element("id", &[], &source.id)?;
    out.text_element("title", &[], &source.title)?;
    out.empty("link", &[("href", source.link.as_str())])?;
    if let Some(updated) = source.updated {
        out.text_element("updated", &[], &updated.to_string())?;
    }
    out.end("source")
}

/// Render the merged posts as a standalone HTML page. All text is escaped,
/// including summaries.
pub fn render_html(site: &SiteConfig, posts: &[Post], generated_at: Timestamp) -> String {
    let mut html = String::new();
    // Writing into a String cannot fail.
    let _ = write_html(&mut html, site, posts, generated_at);
    html
}

fn write_html(html: &mut String, site: &SiteConfig, posts: &[Post], generated_at: Timestamp) -> fmt::Result {
    let title = escape(site.title.as_str());

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html>")?;
    writeln!(html, "<head>")?;
    writeln!(html, "  <meta charset=\"utf-8\">")?;
    writeln!(html, "  <title>{}</title>", title)?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;
    writeln!(html, "  <header>")?;
    writeln!(html, "    <h1><a href=\"{}\">{}</a></h1>", escape(site.link.as_str()), title)?;
    if let Some(subtitle) = &site.subtitle {
        writeln!(html, "    <p>{}</p>", escape(subtitle.as_str()))?;
    }
    writeln!(html, "  </header>")?;
    writeln!(html, "  <main>")?;

    for post in posts {
        let published = post.published.to_string();
        writeln!(html, "    <article>")?;
        writeln!(
            html,
            "      <h2><a href=\"{}\">{}</a></h2>",
            escape(post.link.as_str()),
            escape(post.title.as_str())
        )?;
        writeln!(
            html,
            "      <p><a href=\"{}\">{}</a> <time datetime=\"{}\">{}</time></p>",
            escape(post.source.link.as_str()),
            escape(post.source.display_name()),
            published,
            published
        )?;
        if let Some(summary) = &post.summary {
            writeln!(html, "      <p>{}</p>", escape(summary.as_str()))?;
        }
        writeln!(html, "    </article>")?;
    }

    writeln!(html, "  </main>")?;
    writeln!(
        html,
        "  <footer><p>Generated <time datetime=\"{}\">{}</time></p></footer>",
        generated_at, generated_at
    )?;
    writeln!(html, "</body>")?;
    writeln!(html, "</html>")
}
