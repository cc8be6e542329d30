//! Payload decoding ahead of parsing.
//!
//! The character encoding is picked in this order: a byte-order mark, the
//! `charset` parameter of the response `Content-Type`, the document's own
//! declaration (`<?xml encoding=...?>` for feeds, `<meta charset>` for pages),
//! and finally UTF-8. Bytes that are invalid in the chosen encoding become
//! U+FFFD rather than failing the Target.

use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::models::TargetKind;

/// Declarations are only looked for this far into the payload.
const SNIFF_LIMIT: usize = 1024;

static XML_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?-u)^\s*<\?xml[^>]*?encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#).expect("valid regex")
});

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i-u)<meta[^>]+charset\s*=\s*["']?([A-Za-z0-9._:-]+)"#).expect("valid regex")
});

/// Extract the `charset` parameter of a Content-Type header value.
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|v| !v.is_empty())
    })
}

fn declared_in_document(payload: &[u8], kind: TargetKind) -> Option<&'static Encoding> {
    let head = &payload[..payload.len().min(SNIFF_LIMIT)];
    let pattern = match kind {
        TargetKind::Rss => &*XML_DECLARATION,
        TargetKind::Html => &*META_CHARSET,
    };
    let label = pattern.captures(head)?.get(1)?;
    // A declaration readable as ASCII cannot be UTF-16.
    Encoding::for_label(label.as_bytes()).map(Encoding::output_encoding)
}

/// Choose the encoding for `payload`.
///
/// # Arguments
///
/// * `payload` - Raw response body
/// * `content_type` - The response `Content-Type` header, if any
/// * `kind` - Decides which in-document declaration is consulted
pub fn detect(payload: &[u8], content_type: Option<&str>, kind: TargetKind) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(payload) {
        return encoding;
    }
    content_type
        .and_then(charset_from_content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| declared_in_document(payload, kind))
        .unwrap_or(UTF_8)
}
