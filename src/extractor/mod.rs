//! Bounded document extraction.
//!
//! # Module Structure
//!
//! - `state`: Per-worker scratch accumulators with an explicit reset contract
//! - `bounded`: The deadline-bounded extractor and its per-worker factory
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use rs_webminer::{AdmissionFilter, BoundedExtractor, FetchedDocument};
//!
//! let mine_filter = Arc::new(AdmissionFilter::new([".*"])?);
//! let mut extractor = BoundedExtractor::new(mine_filter);
//!
//! let doc = FetchedDocument::new(
//!     "https://a.example/",
//!     "text/html",
//!     r#"<html><body><a href="https://c.example" rel="nofollow">hi</a></body></html>"#,
//! );
//! if let Ok(Some(result)) = extractor.extract(&doc) {
//!     assert_eq!(result.outlinks[0].rel, "nofollow");
//! }
//! # Ok::<(), rs_webminer::Error>(())
//! ```

pub mod bounded;
pub mod state;

pub use bounded::{BoundedExtractor, ExtractorFactory};
pub use state::ExtractionScratch;
