//! Character encoding detection and transcoding.
//!
//! The declared charset of a fetched document is resolved from its headers
//! (explicit charset header, then the `charset=` parameter of the content
//! type). When nothing usable is declared the parser falls back to sniffing
//! `<meta>` tags in the body, then to UTF-8.

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;

use crate::document::{headers, FetchedDocument};

/// Match `<meta charset="...">` tag
#[allow(clippy::expect_used)]
static CHARSET_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s>]+)"#).expect("valid regex")
});

/// Match `<meta http-equiv="Content-Type" content="...; charset=...">` tag
#[allow(clippy::expect_used)]
static CONTENT_TYPE_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+http-equiv\s*=\s*["']?content-type["']?[^>]+content\s*=\s*["']?[^"'>]*;\s*charset\s*=\s*([^"'\s>]+)"#).expect("valid regex")
});

/// Match the `charset` parameter of a content-type header value
#[allow(clippy::expect_used)]
static HEADER_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^"';\s]+)"#).expect("valid regex")
});

/// Normalizes a charset label to the canonical name of a supported encoding.
///
/// Returns `None` for empty or unknown labels.
#[must_use]
pub fn clean_charset(label: Option<&str>) -> Option<&'static str> {
    let label = label?.trim();
    if label.is_empty() {
        return None;
    }
    Encoding::for_label(label.as_bytes()).map(Encoding::name)
}

/// Extracts the `charset` parameter from a content-type value.
#[must_use]
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    HEADER_CHARSET_RE
        .captures(content_type)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Declared charset of a document: explicit header first, then content type.
#[must_use]
pub fn declared_charset(doc: &FetchedDocument) -> Option<&'static str> {
    clean_charset(doc.headers.first(headers::CONTENT_ENCODING))
        .or_else(|| clean_charset(charset_from_content_type(&doc.content_type)))
}

/// Detect character encoding from HTML bytes.
///
/// Looks for charset declarations in the following order:
/// 1. `<meta charset="...">`
/// 2. `<meta http-equiv="Content-Type" content="...; charset=...">`
/// 3. Defaults to UTF-8 if no declaration found
///
/// Only examines the first 1024 bytes.
#[must_use]
pub fn detect_encoding(html: &[u8]) -> &'static Encoding {
    let head = &html[..html.len().min(1024)];
    let head_str = String::from_utf8_lossy(head);

    if let Some(charset) = extract_charset(&head_str) {
        if let Some(encoding) = Encoding::for_label(charset.as_bytes()) {
            return encoding;
        }
    }

    if let Some(charset) = extract_content_type_charset(&head_str) {
        if let Some(encoding) = Encoding::for_label(charset.as_bytes()) {
            return encoding;
        }
    }

    UTF_8
}

fn extract_charset(html: &str) -> Option<String> {
    CHARSET_META_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn extract_content_type_charset(html: &str) -> Option<String> {
    CONTENT_TYPE_CHARSET_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Decodes document bytes to UTF-8.
///
/// Uses the declared charset when it names a supported encoding, otherwise
/// sniffs the body. Invalid sequences become U+FFFD rather than errors.
#[must_use]
pub fn decode(content: &[u8], declared: Option<&str>) -> String {
    let encoding = declared
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or_else(|| detect_encoding(content));

    if encoding == UTF_8 {
        return String::from_utf8_lossy(content).into_owned();
    }

    let (decoded, _encoding_used, _had_errors) = encoding.decode(content);
    decoded.into_owned()
}
