//! # External Metadata Lookup
//!
//! Bibliographic lookup by ISBN against the Open Library books API.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET {base}/api/books?bibkeys=ISBN:{code}&format=json&jscmd=data       │
//! │                                                                         │
//! │  200 {"ISBN:{code}": {"title": .., "authors": [{"name": ..}],          │
//! │                       "cover": {"medium": ..}}}                         │
//! │      → Some(LookupResult)                                               │
//! │                                                                         │
//! │  200 {}                 → None (unknown code)                          │
//! │  non-2xx / bad body     → Err(LookupFailed)                            │
//! │  no answer in time      → Err(LookupTimeout)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::config::LookupSettings;
use crate::error::{ScanError, ScanResult};
use escs_core::{BookMetadata, UNKNOWN_AUTHOR, UNKNOWN_TITLE};

/// Fields an external lookup may return. Any of them can be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupResult {
    pub title: Option<String>,
    pub author: Option<String>,
    pub cover: Option<String>,
}

impl LookupResult {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.cover.is_none()
    }

    /// Fills missing title/author with the placeholder values.
    pub fn into_metadata(self) -> BookMetadata {
        BookMetadata {
            title: self
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            author: self
                .author
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            cover: self.cover,
        }
    }
}

/// Metadata collaborator.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Looks `code` up. `Ok(None)` means the service does not know it.
    async fn lookup(&self, code: &str, timeout: Duration) -> ScanResult<Option<LookupResult>>;
}

// =============================================================================
// Open Library
// =============================================================================

#[derive(Debug, Deserialize)]
struct OpenLibraryBook {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<OpenLibraryAuthor>,
    cover: Option<OpenLibraryCover>,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryCover {
    medium: Option<String>,
}

/// [`MetadataLookup`] backed by the Open Library books API.
#[derive(Debug, Clone)]
pub struct OpenLibraryLookup {
    client: Client,
    base_url: String,
}

impl OpenLibraryLookup {
    pub fn new(base_url: impl Into<String>) -> ScanResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("escs-scan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScanError::Internal(format!("HTTP client: {}", e)))?;

        Ok(OpenLibraryLookup {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Builds the lookup, or `None` when lookups are disabled.
    pub fn from_settings(settings: &LookupSettings) -> ScanResult<Option<Self>> {
        if !settings.enabled {
            return Ok(None);
        }
        Self::new(settings.base_url.clone()).map(Some)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl MetadataLookup for OpenLibraryLookup {
    async fn lookup(&self, code: &str, timeout: Duration) -> ScanResult<Option<LookupResult>> {
        let key = format!("ISBN:{}", code);
        let url = format!("{}/api/books", self.base_url);

        debug!(code = %code, url = %url, "Querying Open Library");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("bibkeys", key.as_str()),
                ("format", "json"),
                ("jscmd", "data"),
            ])
            .timeout(timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ScanError::LookupFailed(format!(
                "Open Library returned {}",
                response.status()
            )));
        }

        let mut body: HashMap<String, OpenLibraryBook> = response.json().await?;

        Ok(body.remove(&key).map(|book| LookupResult {
            title: book.title,
            author: book.authors.into_iter().find_map(|a| a.name),
            cover: book.cover.and_then(|c| c.medium),
        }))
    }
}
