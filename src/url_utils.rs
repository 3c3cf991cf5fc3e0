//! URL utilities for base resolution, link resolution and identity.

use url::Url;

/// Check if a string is a valid absolute http(s) URL.
///
/// # Returns
/// * `(is_absolute, parsed_url)` - Whether URL is absolute and the parsed URL if valid
#[must_use]
pub fn is_absolute_url(s: &str) -> (bool, Option<Url>) {
    let s = s.trim();

    if s.is_empty() {
        return (false, None);
    }

    if !s.starts_with("http://") && !s.starts_with("https://") {
        return (false, None);
    }

    match Url::parse(s) {
        Ok(url) if url.host().is_some() => (true, Some(url)),
        _ => (false, None),
    }
}

/// Convert a relative or absolute URL to absolute form.
///
/// Empty input stays empty; `data:`, `javascript:`, `mailto:` and `tel:`
/// references are preserved unchanged, as is anything that fails to resolve.
#[must_use]
pub fn create_absolute_url(url_str: &str, base: &Url) -> String {
    let url_str = url_str.trim();

    if url_str.is_empty() {
        return String::new();
    }

    if url_str.starts_with("data:")
        || url_str.starts_with("javascript:")
        || url_str.starts_with("mailto:")
        || url_str.starts_with("tel:")
    {
        return url_str.to_string();
    }

    let (is_abs, _) = is_absolute_url(url_str);
    if is_abs {
        return url_str.to_string();
    }

    match base.join(url_str) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => url_str.to_string(),
    }
}

/// Base URL for resolving a document's relative links.
///
/// Starts from the fetched URL; a `Content-Location` value, when present, is
/// resolved against it and takes its place.
pub fn resolve_base_url(fetched_url: &str, content_location: Option<&str>) -> Result<Url, url::ParseError> {
    let base = Url::parse(fetched_url)?;
    match content_location.map(str::trim).filter(|s| !s.is_empty()) {
        Some(location) => base.join(location),
        None => Ok(base),
    }
}

/// Parse a URL string into a Url object.
///
/// # Returns
/// * `Some(Url)` if valid absolute URL, `None` otherwise
#[must_use]
pub fn parse_url(url_str: &str) -> Option<Url> {
    let (is_abs, parsed) = is_absolute_url(url_str);
    if is_abs {
        parsed
    } else {
        None
    }
}

/// Identity form of a URL used for crawl db deduplication.
///
/// Fragments are dropped and the trailing slash of a non-root path removed.
/// Returns `None` for anything that is not an absolute http(s) URL.
#[must_use]
pub fn normalize_url(url_str: &str) -> Option<String> {
    let mut url = parse_url(url_str)?;

    url.set_fragment(None);

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(&path[..path.len() - 1]);
    }

    Some(url.to_string())
}
