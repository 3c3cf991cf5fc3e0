//! Image relationships mined from a parsed document.
//!
//! Not part of the default extraction; callers that mine image pages can
//! build these from the same parse output.

use std::sync::LazyLock;

use regex::Regex;

use crate::parser::ParsedDocument;
use crate::result::{Outlink, PageResult};

/// Matches URLs ending in a common image suffix.
#[allow(clippy::expect_used)]
static IMG_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(gif|jpg|jpeg|bmp|png|ico)$").expect("IMG_SUFFIX_RE regex")
});

/// Whether `url` points at an image by its suffix.
#[must_use]
pub fn is_image_url(url: &str) -> bool {
    IMG_SUFFIX_RE.is_match(url)
}

/// Image page results: outlinks to image files (empty text) followed by every
/// `<img>` element (`src`, `alt`), in document order.
#[must_use]
pub fn extract_image_results(source_url: &str, outlinks: &[Outlink], parsed: &ParsedDocument) -> Vec<PageResult> {
    let linked = outlinks
        .iter()
        .filter(|link| is_image_url(&link.target_url))
        .map(|link| PageResult::new(source_url, link.target_url.clone(), ""));

    let embedded = parsed
        .images
        .iter()
        .map(|img| PageResult::new(source_url, img.src.clone(), img.alt.clone()));

    linked.chain(embedded).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ImageRef;

    #[test]
    fn image_suffix_is_case_insensitive() {
        assert!(is_image_url("https://a.example/x.JPG"));
        assert!(!is_image_url("https://a.example/x.jpg?size=2"));
        assert!(!is_image_url("https://a.example/page.html"));
    }

    #[test]
    fn linked_images_precede_embedded_ones() {
        let outlinks = vec![
            Outlink::new("https://a.example/logo.png", "", ""),
            Outlink::new("https://a.example/about", "", ""),
        ];
        let parsed = ParsedDocument {
            images: vec![ImageRef {
                src: "/hero.gif".to_string(),
                alt: "Hero".to_string(),
            }],
            ..ParsedDocument::default()
        };

        let results = extract_image_results("https://a.example/", &outlinks, &parsed);
        assert_eq!(
            results,
            vec![
                PageResult::new("https://a.example/", "https://a.example/logo.png", ""),
                PageResult::new("https://a.example/", "/hero.gif", "Hero"),
            ]
        );
    }
}
