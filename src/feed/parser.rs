use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::feed::model::{FeedItem, FeedMetadata, ImageInfo};
use crate::util::{html_to_markup, html_to_text, truncate_chars};

/// Cap on the converted description fields, applied after markup/plain-text
/// conversion so a tag or entity is never cut in half.
const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Errors that can occur while parsing a feed document.
///
/// `NoItems` is deliberately separate from the malformed-input cases: a
/// structurally valid document with zero entries is a soft error the caller
/// surfaces via the feed's error state, not a crash.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not well-formed XML.
    #[error("XML parse error: {0}")]
    Xml(String),
    /// The root element is neither `<rss>` nor `<feed>`.
    #[error("Unrecognized feed format: {0}")]
    UnknownFormat(String),
    /// A structured (helper-produced) JSON document failed to decode.
    #[error("Invalid feed JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Structurally valid document, but no items were extracted.
    #[error("Feed contains no items")]
    NoItems,
}

/// A successfully parsed and normalized feed document.
#[derive(Debug)]
pub struct ParsedFeed {
    pub metadata: FeedMetadata,
    pub items: Vec<FeedItem>,
}

/// Parses a raw feed document into normalized metadata and candidate items.
///
/// Accepts three shapes, dispatched on the first non-whitespace byte and
/// then the XML root element:
///
/// - RSS (`<rss><channel><item>…`)
/// - Atom (`<feed><entry>…`)
/// - pre-structured JSON produced by an external fetch helper
///   (`{title, image?, entries: [{id, title, link, description, pubDate}]}`)
///
/// Items come back in source-document order; the "newest first" convention
/// depends entirely on the upstream feed, and nothing here re-sorts by
/// timestamp. Item identity: RSS `guid` if non-empty, else `link`; Atom
/// `id`; a content digest as last resort when a document provides neither.
pub fn parse(raw: &[u8]) -> Result<ParsedFeed, ParseError> {
    let text = String::from_utf8_lossy(raw);
    let body = text.trim_start_matches('\u{feff}').trim_start();

    let parsed = if body.starts_with('{') {
        parse_structured(body)?
    } else if body.starts_with('<') {
        parse_xml(body)?
    } else {
        return Err(ParseError::UnknownFormat(
            "document is neither XML nor JSON".into(),
        ));
    };

    if parsed.items.is_empty() {
        return Err(ParseError::NoItems);
    }
    Ok(parsed)
}

// ============================================================================
// XML (RSS / Atom)
// ============================================================================

fn parse_xml(content: &str) -> Result<ParsedFeed, ParseError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    // Walk past the prolog to the root element, then dispatch on its name.
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                return match e.local_name().as_ref() {
                    b"rss" => parse_rss(&mut reader),
                    b"feed" => parse_atom(&mut reader),
                    other => Err(ParseError::UnknownFormat(format!(
                        "root element <{}>",
                        String::from_utf8_lossy(other)
                    ))),
                };
            }
            Ok(Event::Eof) => {
                return Err(ParseError::Xml("no root element".into()));
            }
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
}

/// Collects the text content of the element whose `Start` event was just
/// consumed, through its matching end tag. Child markup is dropped but its
/// text is kept, so a `<description>` holding escaped or CDATA HTML comes
/// back as one string for the HTML transforms to deal with.
fn read_element_text(reader: &mut Reader<&[u8]>) -> Result<String, ParseError> {
    let mut out = String::new();
    let mut depth = 0usize;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| ParseError::Xml(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::CData(c)) => {
                out.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Ok(Event::Eof) => {
                return Err(ParseError::Xml("unexpected end of document".into()));
            }
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

/// Skips the element whose `Start` event was just consumed.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), ParseError> {
    let mut depth = 0usize;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Ok(Event::Eof) => {
                return Err(ParseError::Xml("unexpected end of document".into()));
            }
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_rss(reader: &mut Reader<&[u8]>) -> Result<ParsedFeed, ParseError> {
    let mut metadata = FeedMetadata::default();
    let mut image = ImageInfo::default();
    let mut has_image = false;
    let mut items = Vec::new();

    // Depth 0 = direct children of <rss>; channel fields live at depth 1.
    let mut depth = 0usize;
    let mut in_image = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"item" if depth == 1 => items.push(parse_rss_item(reader)?),
                b"image" if depth == 1 => {
                    in_image = true;
                    has_image = true;
                    depth += 1;
                }
                b"title" if depth == 1 => metadata.title = clean_title(&read_element_text(reader)?),
                b"description" if depth == 1 => {
                    metadata.description = html_to_text(&read_element_text(reader)?)
                }
                b"link" if depth == 1 => metadata.link = read_element_text(reader)?.trim().into(),
                b"url" if in_image && depth == 2 => {
                    image.url = read_element_text(reader)?.trim().into()
                }
                b"width" if in_image && depth == 2 => {
                    image.width = read_element_text(reader)?.trim().parse().ok()
                }
                b"height" if in_image && depth == 2 => {
                    image.height = read_element_text(reader)?.trim().parse().ok()
                }
                _ => depth += 1,
            },
            Ok(Event::End(e)) => {
                if in_image && e.local_name().as_ref() == b"image" {
                    in_image = false;
                }
                if depth == 0 {
                    break; // </rss>
                }
                depth -= 1;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if has_image && !image.url.is_empty() {
        metadata.image = Some(image);
    }
    Ok(ParsedFeed { metadata, items })
}

fn parse_rss_item(reader: &mut Reader<&[u8]>) -> Result<FeedItem, ParseError> {
    let mut guid = None;
    let mut title = String::new();
    let mut link = String::new();
    let mut description = String::new();
    let mut pub_date = None;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"guid" => guid = Some(read_element_text(reader)?.trim().to_string()),
                b"title" => title = read_element_text(reader)?,
                b"link" => link = read_element_text(reader)?.trim().to_string(),
                b"description" => description = read_element_text(reader)?,
                b"pubDate" => pub_date = Some(read_element_text(reader)?),
                // Consume unknown children whole so nested titles (e.g. in
                // <source>) cannot clobber the item's own fields.
                _ => skip_element(reader)?,
            },
            Ok(Event::End(_)) => break, // </item>
            Ok(Event::Eof) => {
                return Err(ParseError::Xml("unexpected end of document".into()));
            }
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(build_item(guid, title, link, description, pub_date))
}

fn parse_atom(reader: &mut Reader<&[u8]>) -> Result<ParsedFeed, ParseError> {
    let mut metadata = FeedMetadata::default();
    let mut logo = String::new();
    let mut items = Vec::new();
    let mut link_rel = LinkPick::default();

    let mut depth = 0usize;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"entry" if depth == 0 => items.push(parse_atom_entry(reader)?),
                b"title" if depth == 0 => metadata.title = clean_title(&read_element_text(reader)?),
                b"subtitle" if depth == 0 => {
                    metadata.description = html_to_text(&read_element_text(reader)?)
                }
                b"logo" if depth == 0 => logo = read_element_text(reader)?.trim().into(),
                b"link" if depth == 0 => {
                    link_rel.offer(&e, reader);
                    skip_element(reader)?;
                }
                _ => depth += 1,
            },
            Ok(Event::Empty(e)) if depth == 0 && e.local_name().as_ref() == b"link" => {
                link_rel.offer(&e, reader);
            }
            Ok(Event::End(_)) => {
                if depth == 0 {
                    break; // </feed>
                }
                depth -= 1;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    metadata.link = link_rel.take();
    if !logo.is_empty() {
        metadata.image = Some(ImageInfo {
            url: logo,
            width: None,
            height: None,
        });
    }
    Ok(ParsedFeed { metadata, items })
}

fn parse_atom_entry(reader: &mut Reader<&[u8]>) -> Result<FeedItem, ParseError> {
    let mut id = None;
    let mut title = String::new();
    let mut summary = String::new();
    let mut content = String::new();
    let mut published = None;
    let mut updated = None;
    let mut link_rel = LinkPick::default();

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"id" => id = Some(read_element_text(reader)?.trim().to_string()),
                b"title" => title = read_element_text(reader)?,
                b"summary" => summary = read_element_text(reader)?,
                b"content" => content = read_element_text(reader)?,
                b"published" => published = Some(read_element_text(reader)?),
                b"updated" => updated = Some(read_element_text(reader)?),
                b"link" => {
                    link_rel.offer(&e, reader);
                    skip_element(reader)?;
                }
                _ => skip_element(reader)?,
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"link" => {
                link_rel.offer(&e, reader);
            }
            Ok(Event::End(_)) => break, // </entry>
            Ok(Event::Eof) => {
                return Err(ParseError::Xml("unexpected end of document".into()));
            }
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    let description = if summary.is_empty() { content } else { summary };
    // published, else updated (entries without <published> are common)
    let date = published.or(updated);
    Ok(build_item(id, title, link_rel.take(), description, date))
}

/// Atom link selection: `rel="alternate"` wins, the first link otherwise.
#[derive(Default)]
struct LinkPick {
    alternate: Option<String>,
    first: Option<String>,
}

impl LinkPick {
    fn offer(&mut self, e: &BytesStart<'_>, reader: &Reader<&[u8]>) {
        let mut href = None;
        let mut rel = None;
        let decoder = reader.decoder();
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"href" => {
                    href = attr
                        .decode_and_unescape_value(decoder)
                        .ok()
                        .map(|v| v.to_string())
                }
                b"rel" => {
                    rel = attr
                        .decode_and_unescape_value(decoder)
                        .ok()
                        .map(|v| v.to_string())
                }
                _ => {}
            }
        }
        let Some(href) = href else { return };
        match rel.as_deref() {
            Some("alternate") => {
                if self.alternate.is_none() {
                    self.alternate = Some(href);
                }
            }
            _ => {
                if self.first.is_none() {
                    self.first = Some(href);
                }
            }
        }
    }

    fn take(&mut self) -> String {
        self.alternate
            .take()
            .or_else(|| self.first.take())
            .unwrap_or_default()
    }
}

// ============================================================================
// Structured JSON (external fetch helper output)
// ============================================================================

#[derive(Debug, Deserialize)]
struct StructuredFeed {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    link: String,
    image: Option<StructuredImage>,
    #[serde(default)]
    entries: Vec<StructuredEntry>,
}

#[derive(Debug, Deserialize)]
struct StructuredImage {
    url: String,
    // feedparser emits these as either numbers or strings depending on the feed
    width: Option<serde_json::Value>,
    height: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StructuredEntry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

fn dimension(v: Option<&serde_json::Value>) -> Option<u32> {
    match v? {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_structured(content: &str) -> Result<ParsedFeed, ParseError> {
    let feed: StructuredFeed = serde_json::from_str(content)?;

    let metadata = FeedMetadata {
        title: clean_title(&feed.title),
        description: html_to_text(&feed.description),
        link: feed.link,
        image: feed.image.filter(|i| !i.url.is_empty()).map(|i| ImageInfo {
            width: dimension(i.width.as_ref()),
            height: dimension(i.height.as_ref()),
            url: i.url,
        }),
    };

    let items = feed
        .entries
        .into_iter()
        .map(|e| {
            let id = Some(e.id).filter(|s| !s.trim().is_empty());
            build_item(id, e.title, e.link, e.description, e.pub_date)
        })
        .collect();

    Ok(ParsedFeed { metadata, items })
}

// ============================================================================
// Normalization
// ============================================================================

fn clean_title(raw: &str) -> String {
    // Titles occasionally carry entities or stray markup; render to one line.
    html_to_text(raw).replace('\n', " ").trim().to_string()
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Assembles a normalized item from raw extracted fields.
///
/// Identity: the explicit id (RSS guid / Atom id / helper id) verbatim when
/// non-empty, else the link, else a digest of the content — an item must
/// always get *some* stable id or reconciliation would re-notify it forever.
fn build_item(
    explicit_id: Option<String>,
    title: String,
    link: String,
    description: String,
    pub_date: Option<String>,
) -> FeedItem {
    let published = pub_date.as_deref().and_then(parse_date);
    let title = clean_title(&title);

    let id = explicit_id
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback_id(&link, &title, published.as_ref()));

    let markup = truncate_chars(&html_to_markup(&description), MAX_DESCRIPTION_CHARS).into_owned();
    let text = truncate_chars(&html_to_text(&description), MAX_DESCRIPTION_CHARS).into_owned();

    FeedItem {
        id,
        title,
        link,
        description: markup,
        description_text: text,
        published,
        read: false,
        deleted: false,
        missed_cycles: 0,
    }
}

fn fallback_id(link: &str, title: &str, published: Option<&DateTime<Utc>>) -> String {
    if !link.is_empty() {
        return link.to_string();
    }
    let input = format!(
        "{}|{}|{}",
        link,
        title,
        published.map(|p| p.timestamp().to_string()).unwrap_or_default()
    );
    let hash = Sha256::digest(input.as_bytes());
    format!("{:x}", hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <title>Example &amp; Sons</title>
  <link>https://example.com</link>
  <description>News from Example</description>
  <image>
    <url>https://example.com/logo.png</url>
    <width>88</width>
    <height>31</height>
  </image>
  <item>
    <guid isPermaLink="false">urn:one</guid>
    <title>First post</title>
    <link>https://example.com/1</link>
    <description><![CDATA[<p>Hello <b>world</b></p>]]></description>
    <pubDate>Tue, 10 Jun 2025 09:00:00 GMT</pubDate>
  </item>
  <item>
    <title>No guid here</title>
    <link>https://example.com/2</link>
    <description>plain</description>
  </item>
</channel></rss>"#;

    #[test]
    fn test_rss_metadata_and_items() {
        let parsed = parse(RSS.as_bytes()).unwrap();
        assert_eq!(parsed.metadata.title, "Example & Sons");
        assert_eq!(parsed.metadata.link, "https://example.com");
        assert_eq!(parsed.metadata.description, "News from Example");
        let image = parsed.metadata.image.unwrap();
        assert_eq!(image.url, "https://example.com/logo.png");
        assert_eq!(image.width, Some(88));
        assert_eq!(image.height, Some(31));

        assert_eq!(parsed.items.len(), 2);
        let first = &parsed.items[0];
        assert_eq!(first.id, "urn:one");
        assert_eq!(first.title, "First post");
        assert_eq!(first.description, "Hello <b>world</b>\n");
        assert_eq!(first.description_text, "Hello world\n");
        assert!(first.published.is_some());
        assert!(!first.read);
    }

    #[test]
    fn test_rss_guid_fallback_to_link() {
        let parsed = parse(RSS.as_bytes()).unwrap();
        assert_eq!(parsed.items[1].id, "https://example.com/2");
        assert_eq!(parsed.items[1].published, None);
    }

    #[test]
    fn test_rss_guid_verbatim_even_when_link_differs() {
        let doc = r#"<rss version="2.0"><channel><title>t</title>
            <item><guid>tag:custom-id</guid><link>https://other.example/x</link>
            <title>x</title></item>
            </channel></rss>"#;
        let parsed = parse(doc.as_bytes()).unwrap();
        assert_eq!(parsed.items[0].id, "tag:custom-id");
    }

    #[test]
    fn test_rss_empty_guid_falls_back_to_link() {
        let doc = r#"<rss version="2.0"><channel>
            <item><guid></guid><link>https://example.com/a</link><title>x</title></item>
            </channel></rss>"#;
        let parsed = parse(doc.as_bytes()).unwrap();
        assert_eq!(parsed.items[0].id, "https://example.com/a");
    }

    #[test]
    fn test_item_without_guid_or_link_gets_digest_id() {
        let doc = r#"<rss version="2.0"><channel>
            <item><title>orphan</title></item>
            </channel></rss>"#;
        let parsed = parse(doc.as_bytes()).unwrap();
        let id = &parsed.items[0].id;
        assert_eq!(id.len(), 64, "sha256 hex digest");
        // Deterministic across parses
        let again = parse(doc.as_bytes()).unwrap();
        assert_eq!(&again.items[0].id, id);
    }

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Example</title>
  <subtitle>Entries of note</subtitle>
  <link rel="self" href="https://example.com/feed.atom"/>
  <link rel="alternate" href="https://example.com/"/>
  <logo>https://example.com/logo.svg</logo>
  <entry>
    <id>urn:entry:1</id>
    <title>Entry one</title>
    <link rel="alternate" href="https://example.com/e1"/>
    <summary>Short &amp; sweet</summary>
    <published>2025-06-10T09:00:00Z</published>
  </entry>
  <entry>
    <id>urn:entry:2</id>
    <title>Entry two</title>
    <link href="https://example.com/e2"/>
    <content type="html">&lt;p&gt;Body&lt;/p&gt;</content>
    <updated>2025-06-11T10:30:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_atom_metadata_and_items() {
        let parsed = parse(ATOM.as_bytes()).unwrap();
        assert_eq!(parsed.metadata.title, "Atom Example");
        assert_eq!(parsed.metadata.description, "Entries of note");
        assert_eq!(parsed.metadata.link, "https://example.com/");
        assert_eq!(
            parsed.metadata.image.as_ref().unwrap().url,
            "https://example.com/logo.svg"
        );

        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].id, "urn:entry:1");
        assert_eq!(parsed.items[0].link, "https://example.com/e1");
        assert_eq!(parsed.items[0].description_text, "Short & sweet");
        assert!(parsed.items[0].published.is_some());

        // content used when summary is absent; updated used when published is
        assert_eq!(parsed.items[1].description_text, "Body\n");
        assert!(parsed.items[1].published.is_some());
        assert_eq!(parsed.items[1].link, "https://example.com/e2");
    }

    #[test]
    fn test_structured_json() {
        let doc = r#"{
            "title": "Helper Feed",
            "description": "from getfeed",
            "link": "https://example.com",
            "image": {"url": "https://example.com/i.png", "width": "144", "height": 41},
            "entries": [
                {"id": "j1", "title": "One", "link": "https://example.com/1",
                 "description": "d1", "pubDate": "Tue, 10 Jun 2025 09:00:00 GMT"},
                {"id": "", "title": "Two", "link": "https://example.com/2",
                 "description": "d2", "pubDate": null}
            ]
        }"#;
        let parsed = parse(doc.as_bytes()).unwrap();
        assert_eq!(parsed.metadata.title, "Helper Feed");
        let image = parsed.metadata.image.unwrap();
        assert_eq!(image.width, Some(144));
        assert_eq!(image.height, Some(41));

        assert_eq!(parsed.items[0].id, "j1");
        assert!(parsed.items[0].published.is_some());
        // Blank helper id falls back to the link
        assert_eq!(parsed.items[1].id, "https://example.com/2");
        assert_eq!(parsed.items[1].published, None);
    }

    #[test]
    fn test_unknown_root_element() {
        let err = parse(b"<html><body>nope</body></html>").unwrap_err();
        assert!(matches!(err, ParseError::UnknownFormat(_)));
    }

    #[test]
    fn test_malformed_xml() {
        let err = parse(b"<rss><channel><item>").unwrap_err();
        assert!(matches!(err, ParseError::Xml(_)));
    }

    #[test]
    fn test_garbage_input() {
        let err = parse(b"not a feed at all").unwrap_err();
        assert!(matches!(err, ParseError::UnknownFormat(_)));
    }

    #[test]
    fn test_empty_feed_is_soft_error() {
        let doc = r#"<rss version="2.0"><channel><title>empty</title></channel></rss>"#;
        let err = parse(doc.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::NoItems));
    }

    #[test]
    fn test_bad_date_does_not_fail() {
        let doc = r#"<rss version="2.0"><channel>
            <item><guid>g</guid><title>x</title><pubDate>next Tuesday</pubDate></item>
            </channel></rss>"#;
        let parsed = parse(doc.as_bytes()).unwrap();
        assert_eq!(parsed.items[0].published, None);
    }

    #[test]
    fn test_description_capped_after_conversion() {
        let long = format!(
            r#"<rss version="2.0"><channel><item><guid>g</guid><title>x</title>
               <description>{}</description></item></channel></rss>"#,
            "a".repeat(5000)
        );
        let parsed = parse(long.as_bytes()).unwrap();
        assert_eq!(parsed.items[0].description_text.chars().count(), 1000);
        assert_eq!(parsed.items[0].description.chars().count(), 1000);
    }

    #[test]
    fn test_nested_source_title_does_not_clobber_item_title() {
        let doc = r#"<rss version="2.0"><channel>
            <item><guid>g</guid><title>Real title</title>
              <source url="https://agg.example/feed"><title>Aggregator</title></source>
            </item></channel></rss>"#;
        let parsed = parse(doc.as_bytes()).unwrap();
        assert_eq!(parsed.items[0].title, "Real title");
    }

    #[test]
    fn test_bom_and_leading_whitespace() {
        let doc = format!(
            "\u{feff}\n  {}",
            r#"<rss version="2.0"><channel><item><guid>g</guid><title>x</title></item></channel></rss>"#
        );
        assert!(parse(doc.as_bytes()).is_ok());
    }
}
