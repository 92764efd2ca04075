//! RSS/Atom headline retrieval.
//!
//! Parsing streams the document through `quick-xml` and collects `<item>`
//! (RSS) or `<entry>` (Atom) elements. It does not validate the document. A
//! feed that cannot be fetched or contains no recognizable entries contributes
//! nothing.

use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, instrument, warn};

use crate::core::types::Headline;

/// Source of raw feed documents.
pub trait FeedSource {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetches `http(s)://` URLs over HTTP and reads anything else from disk
/// (`file://` prefix optional).
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    timeout: Duration,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl FeedSource for HttpFeedSource {
    fn fetch(&self, url: &str) -> Result<String> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let agent: ureq::Agent = ureq::Agent::config_builder()
                .timeout_global(Some(self.timeout))
                .build()
                .into();
            return agent
                .get(url)
                .header("User-Agent", concat!("blogger/", env!("CARGO_PKG_VERSION")))
                .call()
                .with_context(|| format!("fetch feed {url}"))?
                .body_mut()
                .read_to_string()
                .with_context(|| format!("read feed body {url}"));
        }
        let path = url.strip_prefix("file://").unwrap_or(url);
        fs::read_to_string(path).with_context(|| format!("read feed file {path}"))
    }
}

/// Fetch up to `limit_per_feed` headlines from each feed, in feed order.
#[instrument(skip_all, fields(feeds = urls.len(), limit_per_feed = limit_per_feed))]
pub fn fetch_headlines<S: FeedSource + ?Sized>(
    source: &S,
    urls: &[String],
    limit_per_feed: usize,
) -> Vec<Headline> {
    let mut headlines = Vec::new();
    for url in urls {
        match source.fetch(url) {
            Ok(document) => {
                let entries = parse_feed(&document);
                debug!(url = %url, entries = entries.len(), "feed parsed");
                headlines.extend(entries.into_iter().take(limit_per_feed));
            }
            Err(err) => warn!(url = %url, err = ?err, "skipping feed"),
        }
    }
    headlines
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Item,
    Entry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Summary,
    Content,
}

impl Field {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"description" | b"summary" => Some(Self::Summary),
            b"content" => Some(Self::Content),
            _ => None,
        }
    }
}

/// Fields of the entry being read. The first occurrence of each wins.
#[derive(Debug, Default)]
struct PartialEntry {
    title: Option<String>,
    link: Option<String>,
    summary: Option<String>,
    content: Option<String>,
}

impl PartialEntry {
    fn set(&mut self, field: Field, text: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Summary => &mut self.summary,
            Field::Content => &mut self.content,
        };
        if slot.is_none() {
            *slot = Some(text);
        }
    }

    fn finish(self) -> Headline {
        Headline {
            title: self.title.unwrap_or_default(),
            link: self.link.unwrap_or_default(),
            summary: self.summary.or(self.content).unwrap_or_default(),
        }
    }
}

/// Extract entries from an RSS or Atom document.
///
/// RSS `<item>`s take precedence; Atom `<entry>`s are used only when the
/// document has no items. A malformed document keeps whatever entries were
/// completed before the error.
pub fn parse_feed(document: &str) -> Vec<Headline> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().check_end_names = false;

    let mut items = Vec::new();
    let mut entries = Vec::new();
    let mut current: Option<(EntryKind, PartialEntry)> = None;
    let mut capture: Option<(Field, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => match start.local_name().as_ref() {
                b"item" => current = Some((EntryKind::Item, PartialEntry::default())),
                b"entry" => current = Some((EntryKind::Entry, PartialEntry::default())),
                tag => {
                    if capture.is_none()
                        && let Some((_, entry)) = current.as_mut()
                        && let Some(field) = Field::from_tag(tag)
                    {
                        if field == Field::Link
                            && let Some(href) = href(&start)
                        {
                            entry.set(Field::Link, href);
                        }
                        capture = Some((field, String::new()));
                    }
                }
            },
            Ok(Event::Empty(start)) => {
                if start.local_name().as_ref() == b"link"
                    && let Some((_, entry)) = current.as_mut()
                    && let Some(href) = href(&start)
                {
                    entry.set(Field::Link, href);
                }
            }
            Ok(Event::Text(text)) => {
                if let Some((_, buf)) = capture.as_mut() {
                    match text.unescape_with(html_entity) {
                        Ok(decoded) => buf.push_str(&decoded),
                        Err(_) => buf.push_str(&String::from_utf8_lossy(&text)),
                    }
                }
            }
            Ok(Event::CData(data)) => {
                if let Some((_, buf)) = capture.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Ok(Event::End(end)) => match end.local_name().as_ref() {
                b"item" | b"entry" => {
                    capture = None;
                    if let Some((kind, entry)) = current.take() {
                        match kind {
                            EntryKind::Item => items.push(entry.finish()),
                            EntryKind::Entry => entries.push(entry.finish()),
                        }
                    }
                }
                tag => {
                    let closes = capture
                        .as_ref()
                        .is_some_and(|(field, _)| Field::from_tag(tag) == Some(*field));
                    if closes
                        && let Some((field, text)) = capture.take()
                        && let Some((_, entry)) = current.as_mut()
                    {
                        entry.set(field, text.trim().to_string());
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                debug!(
                    position = reader.error_position(),
                    err = %err,
                    "feed parse stopped"
                );
                break;
            }
            Ok(_) => {}
        }
    }

    if items.is_empty() { entries } else { items }
}

fn href(start: &BytesStart<'_>) -> Option<String> {
    let attr = start.try_get_attribute("href").ok()??;
    attr.unescape_value().ok().map(|value| value.into_owned())
}

/// Named entities accepted in feed text: XML's predefined five plus the HTML
/// ones feeds commonly use. Numeric references are decoded by the reader.
fn html_entity(name: &str) -> Option<&'static str> {
    match name {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        "nbsp" => Some("\u{a0}"),
        "hellip" => Some("\u{2026}"),
        "mdash" => Some("\u{2014}"),
        "ndash" => Some("\u{2013}"),
        "lsquo" => Some("\u{2018}"),
        "rsquo" => Some("\u{2019}"),
        "ldquo" => Some("\u{201c}"),
        "rdquo" => Some("\u{201d}"),
        "copy" => Some("\u{a9}"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashMap;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Channel title</title>
  <item>
    <title>Rust 2024 ships</title>
    <link>https://example.com/rust</link>
    <description><![CDATA[Edition <b>news</b>]]></description>
  </item>
  <item>
    <title>Caches &amp; you</title>
    <link>https://example.com/caches</link>
    <description>Why caches matter</description>
  </item>
  <item><title>Third</title></item>
</channel></rss>"#;

    const ATOM: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Feed</title>
  <entry>
    <title type="text">Atom entry</title>
    <link rel="alternate" href="https://example.com/atom"/>
    <summary>Short summary</summary>
  </entry>
</feed>"#;

    struct MapSource(HashMap<&'static str, &'static str>);

    impl FeedSource for MapSource {
        fn fetch(&self, url: &str) -> Result<String> {
            self.0
                .get(url)
                .map(|doc| doc.to_string())
                .ok_or_else(|| anyhow!("unreachable feed {url}"))
        }
    }

    #[test]
    fn parses_rss_items() {
        let headlines = parse_feed(RSS);
        assert_eq!(headlines.len(), 3);
        assert_eq!(headlines[0].title, "Rust 2024 ships");
        assert_eq!(headlines[0].link, "https://example.com/rust");
        assert_eq!(headlines[0].summary, "Edition <b>news</b>");
        assert_eq!(headlines[1].title, "Caches & you");
        assert_eq!(headlines[2].link, "");
    }

    #[test]
    fn parses_atom_entries() {
        let headlines = parse_feed(ATOM);
        assert_eq!(
            headlines,
            vec![Headline {
                title: "Atom entry".to_string(),
                link: "https://example.com/atom".to_string(),
                summary: "Short summary".to_string(),
            }]
        );
    }

    #[test]
    fn decodes_numeric_and_html_entities() {
        let doc = "<rss><channel><item>\
            <title>Don&#8217;t cache &#x2014; invalidate</title>\
            <link>https://example.com/a?x=1&amp;y=2</link>\
            <description>Wait&hellip;&nbsp;&lt;b&gt;now&lt;/b&gt;</description>\
            </item></channel></rss>";

        let headlines = parse_feed(doc);

        assert_eq!(headlines.len(), 1);
        assert_eq!(headlines[0].title, "Don\u{2019}t cache \u{2014} invalidate");
        assert_eq!(headlines[0].link, "https://example.com/a?x=1&y=2");
        assert_eq!(headlines[0].summary, "Wait\u{2026}\u{a0}<b>now</b>");
    }

    #[test]
    fn channel_title_is_not_an_entry_field() {
        let headlines = parse_feed(RSS);
        assert!(headlines.iter().all(|h| h.title != "Channel title"));
    }

    #[test]
    fn truncated_document_keeps_completed_entries() {
        let doc = "<rss><channel><item><title>Complete</title></item><item><title>Cut";
        let headlines = parse_feed(doc);
        assert_eq!(headlines.len(), 1);
        assert_eq!(headlines[0].title, "Complete");
    }

    #[test]
    fn non_feed_documents_yield_nothing() {
        assert!(parse_feed("<html><body>nope</body></html>").is_empty());
        assert!(parse_feed("").is_empty());
    }

    #[test]
    fn failing_feeds_are_skipped_and_limit_applies() {
        let source = MapSource(HashMap::from([("rss", RSS), ("atom", ATOM)]));
        let urls = vec!["rss".to_string(), "down".to_string(), "atom".to_string()];

        let headlines = fetch_headlines(&source, &urls, 2);

        let titles: Vec<&str> = headlines.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Rust 2024 ships", "Caches & you", "Atom entry"]);
    }

    #[test]
    fn http_source_reads_local_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("feed.xml");
        fs::write(&path, RSS).expect("write");
        let source = HttpFeedSource::new(Duration::from_secs(1));

        let plain = source.fetch(&path.display().to_string()).expect("plain path");
        let prefixed = source
            .fetch(&format!("file://{}", path.display()))
            .expect("file url");

        assert_eq!(plain, RSS);
        assert_eq!(prefixed, RSS);
        assert!(source.fetch("/definitely/not/here.xml").is_err());
    }
}
