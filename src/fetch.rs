//! Fetch stage seam.
//!
//! The mining workflow pulls documents through a [`Fetcher`]. The HTTP
//! transport itself comes from `reqwest`; [`StaticFetcher`] serves canned
//! documents for tests and offline runs.

use std::collections::HashMap;
use std::io::Read;

use crate::document::{FetchedDocument, HeaderMap};
use crate::options::FetchPolicy;

/// Why a URL could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Failure description.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// No document is available for the URL.
    #[error("no document for {0}")]
    NotFound(String),
}

/// Retrieves one URL under a fetch policy.
pub trait Fetcher: Send + Sync {
    /// Fetches `url`. Bodies longer than `policy.max_content_size` are truncated.
    fn fetch(&self, url: &str, policy: &FetchPolicy) -> Result<FetchedDocument, FetchError>;
}

/// Blocking HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Builds a client with the policy's user agent and timeout.
    pub fn new(policy: &FetchPolicy) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(policy.user_agent.clone())
            .timeout(policy.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, policy: &FetchPolicy) -> Result<FetchedDocument, FetchError> {
        let transport = |e: &dyn std::fmt::Display| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().map_err(|e| transport(&e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let fetched_url = response.url().to_string();
        let mut headers = HeaderMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.append(name.as_str(), value);
            }
        }
        let content_type = headers
            .first(crate::document::headers::CONTENT_TYPE)
            .unwrap_or_default()
            .to_string();

        let mut content = Vec::new();
        let limit = u64::try_from(policy.max_content_size).unwrap_or(u64::MAX);
        response
            .take(limit)
            .read_to_end(&mut content)
            .map_err(|e| transport(&e))?;

        Ok(FetchedDocument {
            base_url: url.to_string(),
            fetched_url,
            content,
            content_type,
            headers,
        })
    }
}

/// Serves documents from memory, keyed by requested URL.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    documents: HashMap<String, FetchedDocument>,
}

impl StaticFetcher {
    /// Creates an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `doc` under its base URL.
    #[must_use]
    pub fn with_document(mut self, doc: FetchedDocument) -> Self {
        self.documents.insert(doc.base_url.clone(), doc);
        self
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, url: &str, policy: &FetchPolicy) -> Result<FetchedDocument, FetchError> {
        let mut doc = self
            .documents
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))?;
        doc.content.truncate(policy.max_content_size);
        Ok(doc)
    }
}
