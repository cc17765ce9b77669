//! Rendering of harvested records as sitemap XML or as a plaintext report.
//!
//! XML is produced from a small element tree built explicitly by the callers: every
//! element has a name, attributes and either text, child elements or nothing.
//! Output follows input order exactly; nothing is reordered here.

use quick_xml::escape::escape;

use crate::config::OutputFormat;
use crate::entry::{Entry, Record};

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Empty,
    Text(String),
    Children(Vec<Element>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub body: Body,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            body: Body::Empty,
        }
    }

    /// Leaf element holding escaped text.
    pub fn text(name: &str, text: impl ToString) -> Self {
        Self::new(name).with_body(Body::Text(text.to_string()))
    }

    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        match &mut self.body {
            Body::Children(children) => children.push(child),
            _ => self.body = Body::Children(vec![child]),
        }
        self
    }

    /// Adds one sibling child per list value, all under the same tag.
    pub fn children(self, children: impl IntoIterator<Item = Element>) -> Self {
        children.into_iter().fold(self, Element::child)
    }

    /// Appends this element, followed by a newline, to `out`.
    pub fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        match &self.body {
            Body::Empty => out.push_str(" />"),
            Body::Text(text) => {
                out.push('>');
                out.push_str(&escape(text.as_str()));
                self.close(out);
            }
            Body::Children(children) => {
                out.push_str(">\n");
                for child in children {
                    child.write_to(out);
                }
                self.close(out);
            }
        }
        out.push('\n');
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn close(&self, out: &mut String) {
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// The `url` element of one entry: `loc`, `priority`, `changefreq`, then one
/// `xhtml:link` per alternate.
pub fn url_element(entry: &Entry) -> Element {
    Element::new("url")
        .child(Element::text("loc", &entry.url))
        .child(Element::text("priority", entry.priority))
        .child(Element::text("changefreq", entry.change_frequency))
        .children(entry.alternates.iter().map(|alternate| {
            Element::new("xhtml:link")
                .attribute("rel", "alternate")
                .attribute("hreflang", &alternate.locale)
                .attribute("href", &alternate.url)
        }))
}

/// Serializes records without any envelope.
///
/// XML renders each entry as a `url` element and drops plaintext lines, which have no
/// element form. Plaintext concatenates prepared lines verbatim, with no escaping.
pub fn serialize(records: &[Record], format: OutputFormat) -> String {
    let mut out = String::new();
    for record in records {
        match (format, record) {
            (OutputFormat::Xml, Record::Url(entry)) => url_element(entry).write_to(&mut out),
            (OutputFormat::Xml, Record::Line(line)) => {
                tracing::warn!("Dropping plaintext line '{}' from XML output", line.trim_end());
            }
            (OutputFormat::Text, Record::Line(line)) => out.push_str(line),
            (OutputFormat::Text, Record::Url(entry)) => {
                out.push_str(&entry.url);
                out.push('\n');
            }
        }
    }
    out
}

/// Wraps serialized `url` elements in a complete `urlset` document.
pub fn urlset_document(body: &str) -> String {
    envelope("urlset", body)
}

/// A complete `sitemapindex` document listing each `(location, lastmod)` pair.
pub fn sitemap_index_document(sitemaps: &[(String, String)]) -> String {
    let mut body = String::new();
    for (loc, lastmod) in sitemaps {
        Element::new("sitemap")
            .child(Element::text("loc", loc))
            .child(Element::text("lastmod", lastmod))
            .write_to(&mut body);
    }
    envelope("sitemapindex", &body)
}

fn envelope(root: &str, body: &str) -> String {
    format!(
        "{}\n<{} xmlns=\"{}\" xmlns:xhtml=\"{}\">\n{}</{}>\n",
        XML_DECLARATION, root, SITEMAP_NAMESPACE, XHTML_NAMESPACE, body, root
    )
}
