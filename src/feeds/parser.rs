//! Feed document parsing.
//!
//! Turns RSS 2.0, RSS 1.0 (RDF) and Atom documents into [`RawEntry`] values
//! with `quick-xml`'s serde deserializer. The format is picked from the root
//! element; anything else is rejected.

use crate::models::{PublishedDate, RawEntry};
use quick_xml::Reader;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::error::Error;
use std::fmt;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default, rename = "item")]
    items: Vec<RssItem>,
}

/// RSS 1.0 keeps its items next to the channel, not inside it.
#[derive(Debug, Deserialize)]
struct Rdf {
    #[serde(default, rename = "item")]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<Text>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "dc:date", alias = "date")]
    dc_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(default, rename = "entry")]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<Text>,
    #[serde(default, rename = "link")]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Text content of an element, markup included.
///
/// Titles sometimes carry child elements (Atom `type="xhtml"`, stray HTML).
/// Their text is collected in document order and attributes are dropped.
#[derive(Debug, Default)]
struct Text(String);

impl Text {
    fn push(&mut self, piece: &str) {
        let piece = piece.trim();
        if piece.is_empty() {
            return;
        }
        if !self.0.is_empty() {
            self.0.push(' ');
        }
        self.0.push_str(piece);
    }
}

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TextVisitor;

        impl<'de> Visitor<'de> for TextVisitor {
            type Value = Text;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("element text")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Text, E> {
                Ok(Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Text, E> {
                Ok(Text(v))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Text, E> {
                Ok(Text::default())
            }

            fn visit_none<E: de::Error>(self) -> Result<Text, E> {
                Ok(Text::default())
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Text, D::Error> {
                Text::deserialize(d)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Text, A::Error> {
                let mut out = Text::default();
                while let Some(part) = seq.next_element::<Text>()? {
                    out.push(&part.0);
                }
                Ok(out)
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Text, A::Error> {
                let mut out = Text::default();
                while let Some(key) = map.next_key::<String>()? {
                    if key.starts_with('@') {
                        map.next_value::<IgnoredAny>()?;
                    } else {
                        let part = map.next_value::<Text>()?;
                        out.push(&part.0);
                    }
                }
                Ok(out)
            }
        }

        deserializer.deserialize_any(TextVisitor)
    }
}

/// Treat empty strings as absent and classify what remains.
fn published(raw: Option<String>) -> Option<PublishedDate> {
    raw.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(|s| PublishedDate::from_raw(&s))
}

impl From<RssItem> for RawEntry {
    fn from(item: RssItem) -> Self {
        RawEntry {
            title: item.title.map(|t| t.0),
            link: item.link.map(|l| l.trim().to_string()),
            published: published(item.pub_date.or(item.dc_date)),
        }
    }
}

impl From<AtomEntry> for RawEntry {
    fn from(entry: AtomEntry) -> Self {
        // rel defaults to "alternate" when omitted
        let link = entry
            .links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")) && l.href.is_some())
            .or_else(|| entry.links.iter().find(|l| l.href.is_some()))
            .and_then(|l| l.href.clone());

        RawEntry {
            title: entry.title.map(|t| t.0),
            link,
            published: published(entry.published.or(entry.updated)),
        }
    }
}

/// Local name of the document's root element.
fn root_element(xml: &str) -> Result<String, Box<dyn Error>> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::Eof => return Err("document has no root element".into()),
            _ => {}
        }
    }
}

/// Parse a feed document into its entries, in document order.
///
/// # Errors
///
/// Returns an error if the document is not well-formed XML, or its root is
/// not `<rss>`, `<rdf:RDF>` or `<feed>`.
pub fn parse_feed(xml: &str) -> Result<Vec<RawEntry>, Box<dyn Error>> {
    let xml = xml.trim_start_matches('\u{feff}');
    let root = root_element(xml)?;
    let entries = match root.as_str() {
        "rss" => {
            let rss: Rss = from_str(xml)?;
            rss.channel.items.into_iter().map(RawEntry::from).collect()
        }
        "RDF" => {
            let rdf: Rdf = from_str(xml)?;
            rdf.items.into_iter().map(RawEntry::from).collect()
        }
        "feed" => {
            let atom: AtomFeed = from_str(xml)?;
            atom.entries.into_iter().map(RawEntry::from).collect()
        }
        other => return Err(format!("feed not recognized as RSS or Atom (root <{other}>)").into()),
    };
    Ok(entries)
}
