//! # Metadata Resolver
//!
//! Ordered, first-match-wins chain that turns a book code into metadata.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Resolver Chain                                  │
//! │                                                                         │
//! │  code ──► CatalogSource ──None──► LegacyCatalogSource ──None──►         │
//! │              │ Some                   │ Some                            │
//! │              ▼                        ▼                                 │
//! │           Resolved                 Resolved                             │
//! │                                                                         │
//! │       ──► ExternalSource ──None / Err / timeout──► placeholder         │
//! │              │ Some                                ("Unknown Book")     │
//! │              ▼                                                          │
//! │           Resolved                                                      │
//! │                                                                         │
//! │  A source error is logged and treated as a miss. The chain only        │
//! │  reads; it never writes the catalog.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ScanError, ScanResult};
use crate::lookup::MetadataLookup;
use crate::store::LibraryStore;
use escs_core::{BookMetadata, MetadataSource};

/// One link of the resolver chain.
#[async_trait]
pub trait BookSource: Send + Sync {
    /// Reported as the origin of metadata this link produces.
    fn kind(&self) -> MetadataSource;

    async fn find(&self, code: &str) -> ScanResult<Option<BookMetadata>>;
}

/// Metadata plus the link that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub metadata: BookMetadata,
    pub source: MetadataSource,
}

impl Resolved {
    pub fn placeholder() -> Self {
        Resolved {
            metadata: BookMetadata::placeholder(),
            source: MetadataSource::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == MetadataSource::Placeholder
    }
}

// =============================================================================
// Sources
// =============================================================================

/// The curated catalog.
pub struct CatalogSource {
    store: Arc<dyn LibraryStore>,
}

impl CatalogSource {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        CatalogSource { store }
    }
}

#[async_trait]
impl BookSource for CatalogSource {
    fn kind(&self) -> MetadataSource {
        MetadataSource::Catalog
    }

    async fn find(&self, code: &str) -> ScanResult<Option<BookMetadata>> {
        let entry = self.store.find_in_catalog(code).await?;
        Ok(entry.as_ref().map(BookMetadata::from))
    }
}

/// Entries left behind by older versions. Consulted after the curated catalog.
pub struct LegacyCatalogSource {
    store: Arc<dyn LibraryStore>,
}

impl LegacyCatalogSource {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        LegacyCatalogSource { store }
    }
}

#[async_trait]
impl BookSource for LegacyCatalogSource {
    fn kind(&self) -> MetadataSource {
        MetadataSource::LegacyCatalog
    }

    async fn find(&self, code: &str) -> ScanResult<Option<BookMetadata>> {
        let entry = self.store.find_in_legacy_catalog(code).await?;
        Ok(entry.as_ref().map(BookMetadata::from))
    }
}

/// External lookup, bounded by `timeout` regardless of what the lookup does.
pub struct ExternalSource {
    lookup: Arc<dyn MetadataLookup>,
    timeout: Duration,
}

impl ExternalSource {
    pub fn new(lookup: Arc<dyn MetadataLookup>, timeout: Duration) -> Self {
        ExternalSource { lookup, timeout }
    }
}

#[async_trait]
impl BookSource for ExternalSource {
    fn kind(&self) -> MetadataSource {
        MetadataSource::External
    }

    async fn find(&self, code: &str) -> ScanResult<Option<BookMetadata>> {
        let result = tokio::time::timeout(self.timeout, self.lookup.lookup(code, self.timeout))
            .await
            .map_err(|_| ScanError::LookupTimeout)??;

        Ok(result
            .filter(|r| !r.is_empty())
            .map(|r| r.into_metadata()))
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Ordered list of [`BookSource`]s with a placeholder fallback.
#[derive(Default)]
pub struct MetadataResolver {
    sources: Vec<Box<dyn BookSource>>,
}

impl MetadataResolver {
    /// A resolver with no sources. Everything resolves to the placeholder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog, legacy catalog, then the external lookup if one is given.
    pub fn standard(
        store: Arc<dyn LibraryStore>,
        lookup: Option<Arc<dyn MetadataLookup>>,
        lookup_timeout: Duration,
    ) -> Self {
        let resolver = Self::new()
            .with_source(CatalogSource::new(store.clone()))
            .with_source(LegacyCatalogSource::new(store));

        match lookup {
            Some(lookup) => resolver.with_source(ExternalSource::new(lookup, lookup_timeout)),
            None => resolver,
        }
    }

    /// Appends a link to the end of the chain.
    pub fn with_source(mut self, source: impl BookSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Kinds of the configured links, in order.
    pub fn chain(&self) -> Vec<MetadataSource> {
        self.sources.iter().map(|s| s.kind()).collect()
    }

    /// Walks the chain and returns the first hit, or the placeholder.
    pub async fn resolve(&self, code: &str) -> Resolved {
        for source in &self.sources {
            let kind = source.kind();
            match source.find(code).await {
                Ok(Some(metadata)) => {
                    debug!(code = %code, source = %kind, "Metadata resolved");
                    return Resolved {
                        metadata,
                        source: kind,
                    };
                }
                Ok(None) => {
                    debug!(code = %code, source = %kind, "No match");
                }
                Err(e) => {
                    warn!(code = %code, source = %kind, error = %e, "Metadata source failed");
                }
            }
        }

        debug!(code = %code, "Falling back to placeholder metadata");
        Resolved::placeholder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(MetadataSource, Option<&'static str>);

    #[async_trait]
    impl BookSource for Fixed {
        fn kind(&self) -> MetadataSource {
            self.0
        }

        async fn find(&self, _code: &str) -> ScanResult<Option<BookMetadata>> {
            Ok(self.1.map(|title| BookMetadata {
                title: title.to_string(),
                author: "A".to_string(),
                cover: None,
            }))
        }
    }

    struct Broken;

    #[async_trait]
    impl BookSource for Broken {
        fn kind(&self) -> MetadataSource {
            MetadataSource::Catalog
        }

        async fn find(&self, _code: &str) -> ScanResult<Option<BookMetadata>> {
            Err(ScanError::StoreUnavailable("disk gone".into()))
        }
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let resolver = MetadataResolver::new()
            .with_source(Fixed(MetadataSource::Catalog, Some("T1")))
            .with_source(Fixed(MetadataSource::External, Some("T2")));

        let resolved = resolver.resolve("111").await;
        assert_eq!(resolved.metadata.title, "T1");
        assert_eq!(resolved.source, MetadataSource::Catalog);
    }

    #[tokio::test]
    async fn test_skips_misses_and_errors() {
        let resolver = MetadataResolver::new()
            .with_source(Broken)
            .with_source(Fixed(MetadataSource::LegacyCatalog, None))
            .with_source(Fixed(MetadataSource::External, Some("T2")));

        let resolved = resolver.resolve("111").await;
        assert_eq!(resolved.metadata.title, "T2");
        assert_eq!(resolved.source, MetadataSource::External);
    }

    #[tokio::test]
    async fn test_empty_chain_is_placeholder() {
        let resolved = MetadataResolver::new().resolve("111").await;
        assert!(resolved.is_placeholder());
        assert!(resolved.metadata.is_placeholder());
    }

    #[test]
    fn test_chain_order() {
        let resolver = MetadataResolver::new()
            .with_source(Fixed(MetadataSource::Catalog, None))
            .with_source(Fixed(MetadataSource::External, None));
        assert_eq!(
            resolver.chain(),
            vec![MetadataSource::Catalog, MetadataSource::External]
        );
    }
}
