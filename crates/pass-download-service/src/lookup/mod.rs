//! Discovery of open access manuscripts for a DOI.
//!
//! A [`MetadataSource`] performs the actual lookup with an upstream bibliographic service, while
//! the [`LookupService`] memoizes its results in a [`MemoizingCache`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::caching::{CacheConfig, MemoizingCache};
use crate::types::DoiInfo;

mod unpaywall;

pub use unpaywall::UnpaywallSource;

/// An error looking up a DOI.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The DOI is not known to the metadata source.
    #[error("{0}")]
    BadInput(String),
    /// The request to the metadata source could not be made.
    #[error("metadata request failed")]
    Request(#[source] reqwest::Error),
    /// The metadata source responded with an error status.
    #[error("request failed with code {} and message '{message}'", .status.as_u16())]
    Status { status: StatusCode, message: String },
    /// The response of the metadata source could not be parsed.
    #[error("malformed metadata response")]
    Malformed(#[source] serde_json::Error),
}

impl LookupError {
    /// Whether the lookup failed because of the caller's input rather than an upstream problem.
    pub fn is_bad_input(&self) -> bool {
        matches!(self, Self::BadInput(_))
    }
}

/// An upstream service providing the manuscripts associated with a DOI.
///
/// Implementations make a single attempt per call and do not retry.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Looks up the manuscripts available for `doi`.
    async fn lookup(&self, doi: &str) -> Result<DoiInfo, LookupError>;
}

/// Looks up DOIs with a [`MetadataSource`], memoizing the results.
///
/// Concurrent lookups of the same DOI result in a single upstream request. Failed lookups are
/// not memoized.
pub struct LookupService {
    source: Arc<dyn MetadataSource>,
    cache: MemoizingCache<String, DoiInfo, LookupError>,
}

impl fmt::Debug for LookupService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupService")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl LookupService {
    /// Creates a lookup service that caches according to `config`.
    pub fn new(source: Arc<dyn MetadataSource>, config: CacheConfig) -> Self {
        Self {
            source,
            cache: MemoizingCache::new("lookup", config),
        }
    }

    /// Looks up the manuscripts available for `doi`.
    ///
    /// The DOI is used verbatim as cache key.
    pub async fn lookup(&self, doi: &str) -> Result<Arc<DoiInfo>, Arc<LookupError>> {
        let source = Arc::clone(&self.source);
        let key = doi.to_owned();
        self.cache
            .get_or_add(doi.to_owned(), move || async move {
                tracing::debug!(doi = %key, "Looking up manuscripts");
                source.lookup(&key).await
            })
            .await
    }
}
