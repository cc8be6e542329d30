//! Feed parsing for RSS 2.0, RSS 1.0 (RDF) and Atom.
//!
//! The parser walks raw `quick-xml` events instead of deserializing into a
//! fixed schema, so the three dialects share one pass: every `<item>` or
//! `<entry>` element becomes one candidate headline, built from its direct
//! `title`, `link`, `description` and date children. Channel- and feed-level
//! titles are never reported.
//!
//! Input is text that [`super::charset`] already decoded, so the encoding named
//! in the XML declaration is not consulted again here.

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::ExtractError;
use crate::models::{Headline, Target};
use crate::utils::collapse_whitespace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
    Published,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"description" | b"summary" => Some(Field::Description),
            b"pubDate" | b"published" | b"updated" | b"dc:date" => Some(Field::Published),
            _ => None,
        }
    }
}

/// One `<item>` / `<entry>` being assembled.
#[derive(Debug, Default)]
struct Entry {
    depth: usize,
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    published: Option<String>,
    /// Field currently collecting text and the depth it was opened at.
    open: Option<(Field, usize)>,
    text: String,
}

impl Entry {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    fn close_field(&mut self) {
        let Some((field, _)) = self.open.take() else {
            return;
        };
        let value = collapse_whitespace(&std::mem::take(&mut self.text));
        if value.is_empty() {
            return;
        }
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::Published => &mut self.published,
        };
        slot.get_or_insert(value);
    }

    fn into_headline(self, source: &str) -> Option<Headline> {
        let title = self.title?;
        Headline::new(&title, source).map(|h| {
            h.with_link(self.link)
                .with_description(self.description)
                .with_published(self.published)
        })
    }
}

fn is_entry(name: &[u8]) -> bool {
    matches!(name, b"item" | b"entry")
}

/// Atom links carry the URL in `href`; only `rel="alternate"` (or no rel) counts.
fn atom_href<R>(e: &BytesStart<'_>, reader: &Reader<R>) -> Option<String> {
    let rel = e
        .try_get_attribute("rel")
        .ok()
        .flatten()
        .and_then(|a| a.decode_and_unescape_value(reader.decoder()).ok().map(|v| v.into_owned()));
    if rel.as_deref().is_some_and(|r| r != "alternate") {
        return None;
    }
    e.try_get_attribute("href")
        .ok()
        .flatten()
        .and_then(|a| a.decode_and_unescape_value(reader.decoder()).ok().map(|v| v.into_owned()))
        .filter(|href| !href.trim().is_empty())
}

/// Parse decoded feed text into candidate headlines in document order.
///
/// Fails with a `Malformed` [`ExtractError`] when the text is not
/// well-formed XML: mismatched or unclosed tags, or no element at all.
pub fn parse_items(xml: &str, target: &Target) -> Result<Vec<Headline>, ExtractError> {
    let source = target.to_string();
    let malformed = |message: String| ExtractError::malformed(source.clone(), message);

    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut saw_element = false;
    let mut entry: Option<Entry> = None;
    let mut headlines = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            malformed(format!("XML error at byte {}: {e}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(ref e) => {
                depth += 1;
                saw_element = true;
                let name = e.name();
                if entry.is_none() {
                    if is_entry(name.as_ref()) {
                        entry = Some(Entry::new(depth));
                    }
                } else if let Some(current) = entry
                    .as_mut()
                    .filter(|c| c.open.is_none() && depth == c.depth + 1)
                {
                    if let Some(field) = Field::from_name(name.as_ref()) {
                        if field == Field::Link && current.link.is_none() {
                            current.link = atom_href(e, &reader);
                        }
                        current.open = Some((field, depth));
                        current.text.clear();
                    }
                }
            }
            Event::Empty(ref e) => {
                saw_element = true;
                if let Some(current) = entry.as_mut() {
                    if depth == current.depth && e.name().as_ref() == b"link" && current.link.is_none() {
                        current.link = atom_href(e, &reader);
                    }
                }
            }
            Event::Text(ref e) => {
                if let Some(current) = entry.as_mut().filter(|c| c.open.is_some()) {
                    let text = e.decode().map_err(|err| malformed(err.to_string()))?;
                    current.text.push_str(&text);
                }
            }
            Event::CData(ref e) => {
                if let Some(current) = entry.as_mut().filter(|c| c.open.is_some()) {
                    let text = e.decode().map_err(|err| malformed(err.to_string()))?;
                    current.text.push_str(&text);
                }
            }
            Event::GeneralRef(ref e) => {
                if let Some(current) = entry.as_mut().filter(|c| c.open.is_some()) {
                    if let Some(ch) = e.resolve_char_ref().map_err(|err| malformed(err.to_string()))? {
                        current.text.push(ch);
                    } else {
                        let name = e.decode().map_err(|err| malformed(err.to_string()))?;
                        match resolve_predefined_entity(&name) {
                            Some(resolved) => current.text.push_str(resolved),
                            None if name == "nbsp" => current.text.push(' '),
                            None => {
                                current.text.push('&');
                                current.text.push_str(&name);
                                current.text.push(';');
                            }
                        }
                    }
                }
            }
            Event::End(_) => {
                if let Some(current) = entry.as_mut() {
                    if current.open.is_some_and(|(_, d)| d == depth) {
                        current.close_field();
                    }
                    if current.depth == depth {
                        if let Some(done) = entry.take() {
                            headlines.extend(done.into_headline(&source));
                        }
                    }
                }
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| malformed("closing tag without opening tag".to_string()))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_element {
        return Err(malformed("document contains no XML elements".to_string()));
    }
    if depth != 0 {
        return Err(malformed(format!("document ended with {depth} unclosed element(s)")));
    }
    Ok(headlines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractErrorKind;
    use crate::models::TargetKind;

    fn target() -> Target {
        Target::new("https://example.com/rss.xml", TargetKind::Rss).unwrap()
    }

    fn titles(headlines: &[Headline]) -> Vec<&str> {
        headlines.iter().map(|h| h.title.as_str()).collect()
    }

    #[test]
    fn test_rss2_items_in_document_order() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
    <channel>
        <title>World News</title>
        <link>https://example.com</link>
        <item>
            <title>First story</title>
            <link>https://example.com/1</link>
            <pubDate>Mon, 15 Jan 2024 10:00:00 +0000</pubDate>
            <description>Summary one</description>
        </item>
        <item>
            <title>Second story</title>
            <link>https://example.com/2</link>
        </item>
        <item>
            <title>Third story</title>
        </item>
    </channel>
</rss>"#;
        let headlines = parse_items(&rss, &target()).unwrap();

        assert_eq!(titles(&headlines), vec!["First story", "Second story", "Third story"]);
        assert_eq!(headlines[0].link.as_deref(), Some("https://example.com/1"));
        assert_eq!(
            headlines[0].published.as_deref(),
            Some("Mon, 15 Jan 2024 10:00:00 +0000")
        );
        assert_eq!(headlines[0].description.as_deref(), Some("Summary one"));
        assert_eq!(headlines[1].description, None);
        assert_eq!(headlines[2].link, None);
        assert!(headlines.iter().all(|h| h.source == "https://example.com/rss.xml"));
    }

    #[test]
    fn test_n_items_yield_n_headlines() {
        for n in [0usize, 1, 7, 25] {
            let items: String = (0..n)
                .map(|i| format!("<item><title>Headline {i}</title></item>"))
                .collect();
            let rss = format!("<rss><channel><title>c</title>{items}</channel></rss>");
            let headlines = parse_items(&rss, &target()).unwrap();
            assert_eq!(headlines.len(), n);
            for (i, h) in headlines.iter().enumerate() {
                assert_eq!(h.title, format!("Headline {i}"));
            }
        }
    }

    #[test]
    fn test_whitespace_only_titles_are_skipped() {
        let rss = "<rss><channel>\
            <item><title>   </title></item>\
            <item><title>\n\t</title></item>\
            <item><title>Kept</title></item>\
            <item><description>no title at all</description></item>\
            </channel></rss>";
        let headlines = parse_items(&rss, &target()).unwrap();
        assert_eq!(titles(&headlines), vec!["Kept"]);
    }

    #[test]
    fn test_cdata_and_entities_are_decoded() {
        let rss = r#"<rss><channel>
            <item><title><![CDATA[Stocks <up> again]]></title></item>
            <item><title>Tom &amp; Jerry &#8212; &quot;live&quot;</title></item>
        </channel></rss>"#;
        let headlines = parse_items(&rss, &target()).unwrap();
        assert_eq!(
            titles(&headlines),
            vec!["Stocks <up> again", "Tom & Jerry \u{2014} \"live\""]
        );
    }

    #[test]
    fn test_nested_media_title_does_not_replace_item_title() {
        let rss = r#"<rss xmlns:media="http://search.yahoo.com/mrss/"><channel>
            <item>
                <media:group><media:title>Video caption</media:title></media:group>
                <title>Real headline</title>
            </item>
        </channel></rss>"#;
        let headlines = parse_items(&rss, &target()).unwrap();
        assert_eq!(titles(&headlines), vec!["Real headline"]);
    }

    #[test]
    fn test_atom_entries() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Example Feed</title>
    <link href="https://example.org/"/>
    <entry>
        <title>Atom-Powered Robots Run Amok</title>
        <link rel="self" href="https://example.org/self"/>
        <link href="https://example.org/2003/12/13/atom03"/>
        <updated>2003-12-13T18:30:02Z</updated>
        <summary>Some   text.</summary>
    </entry>
    <entry>
        <title type="html">Second entry</title>
    </entry>
</feed>"#;
        let headlines = parse_items(atom, &target()).unwrap();
        assert_eq!(titles(&headlines), vec!["Atom-Powered Robots Run Amok", "Second entry"]);
        assert_eq!(
            headlines[0].link.as_deref(),
            Some("https://example.org/2003/12/13/atom03")
        );
        assert_eq!(headlines[0].published.as_deref(), Some("2003-12-13T18:30:02Z"));
        assert_eq!(headlines[0].description.as_deref(), Some("Some text."));
    }

    #[test]
    fn test_rdf_items_with_dc_date() {
        let rdf = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
            xmlns="http://purl.org/rss/1.0/" xmlns:dc="http://purl.org/dc/elements/1.1/">
            <channel rdf:about="https://example.com"><title>Channel</title></channel>
            <item rdf:about="https://example.com/a">
                <title>RDF headline</title>
                <link>https://example.com/a</link>
                <dc:date>2024-01-01</dc:date>
            </item>
        </rdf:RDF>"#;
        let headlines = parse_items(rdf, &target()).unwrap();
        assert_eq!(titles(&headlines), vec!["RDF headline"]);
        assert_eq!(headlines[0].published.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_mismatched_tags_are_malformed() {
        let err = parse_items("<rss><channel><item></channel></rss>", &target()).unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::Malformed);
        assert_eq!(err.target, "https://example.com/rss.xml");
    }

    #[test]
    fn test_truncated_document_is_malformed() {
        let err = parse_items(
            "<rss><channel><item><title>Cut off</title>",
            &target(),
        )
        .unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::Malformed);
    }

    #[test]
    fn test_non_xml_is_malformed() {
        let err = parse_items("this is not xml at all", &target()).unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::Malformed);

        let err = parse_items("", &target()).unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::Malformed);
    }
}
