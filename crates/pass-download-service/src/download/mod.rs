//! Downloading manuscripts into the repository.
//!
//! A download validates the requested URL against the manuscripts known for a DOI, fetches the
//! content, streams it into the [`BinaryStore`] and hands out the public address of the stored
//! binary. Failures are classified as either bad input by the caller, or as a failure of one of
//! the upstream dependencies.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::address::{AddressTranslator, TranslateError};
use crate::fetch::{ContentFetcher, FetchError};
use crate::lookup::{LookupError, LookupService};
use crate::store::{BinaryStore, StoreError};

/// The step of a download that failed.
#[derive(Debug, Error)]
pub enum DownloadFailure {
    #[error("could not lookup doi {doi}")]
    Lookup {
        doi: String,
        #[source]
        source: Arc<LookupError>,
    },
    #[error("could not validate url {url} for doi {doi}: no matching URL found for DOI")]
    NoMatchingUrl { doi: String, url: String },
    #[error("could not fetch content")]
    Fetch(#[source] FetchError),
    #[error("could not deposit content")]
    Store(#[source] StoreError),
    #[error("could not translate the address of the deposited content")]
    Translate(#[source] TranslateError),
}

/// An error downloading a manuscript.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The request cannot be served because of the caller's input.
    #[error(transparent)]
    BadInput(DownloadFailure),
    /// A dependency of the download failed.
    #[error(transparent)]
    Upstream(DownloadFailure),
}

impl DownloadError {
    /// Whether the caller is to blame for this error.
    pub fn is_bad_input(&self) -> bool {
        matches!(self, Self::BadInput(_))
    }

    /// The step of the download that failed.
    pub fn failure(&self) -> &DownloadFailure {
        match self {
            Self::BadInput(failure) | Self::Upstream(failure) => failure,
        }
    }
}

impl From<DownloadFailure> for DownloadError {
    fn from(failure: DownloadFailure) -> Self {
        let bad_input = match &failure {
            DownloadFailure::Lookup { source, .. } => source.is_bad_input(),
            DownloadFailure::NoMatchingUrl { .. } => true,
            _ => false,
        };

        if bad_input {
            Self::BadInput(failure)
        } else {
            Self::Upstream(failure)
        }
    }
}

/// Downloads manuscripts of a DOI into the repository.
pub struct DownloadService {
    lookup: Arc<LookupService>,
    fetcher: Arc<dyn ContentFetcher>,
    store: Arc<dyn BinaryStore>,
    translator: AddressTranslator,
    dest: String,
}

impl std::fmt::Debug for DownloadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadService")
            .field("lookup", &self.lookup)
            .field("translator", &self.translator)
            .field("dest", &self.dest)
            .finish_non_exhaustive()
    }
}

impl DownloadService {
    /// Creates a download service depositing into the container at `dest`.
    pub fn new(
        lookup: Arc<LookupService>,
        fetcher: Arc<dyn ContentFetcher>,
        store: Arc<dyn BinaryStore>,
        translator: AddressTranslator,
        dest: impl Into<String>,
    ) -> Self {
        Self {
            lookup,
            fetcher,
            store,
            translator,
            dest: dest.into(),
        }
    }

    /// Downloads the manuscript at `url` into the repository, and returns its public address.
    ///
    /// `url` must be the exact location of one of the manuscripts known for `doi`. Nothing is
    /// fetched otherwise.
    ///
    /// This does not create any other repository entities for the binary.
    #[tracing::instrument(skip(self))]
    pub async fn download(&self, doi: &str, url: &str) -> Result<String, DownloadError> {
        let start = Instant::now();
        let result = self.download_inner(doi, url).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(DownloadError::BadInput(_)) => "bad_input",
            Err(DownloadError::Upstream(_)) => "upstream",
        };
        metric!(counter("downloads") += 1, "outcome" => outcome);
        metric!(timer("downloads.duration") = start.elapsed(), "outcome" => outcome);

        if let Err(error) = &result {
            tracing::debug!(
                error = error as &dyn std::error::Error,
                "Download failed"
            );
        }
        result
    }

    async fn download_inner(&self, doi: &str, url: &str) -> Result<String, DownloadError> {
        let info = self
            .lookup
            .lookup(doi)
            .await
            .map_err(|source| DownloadFailure::Lookup {
                doi: doi.to_owned(),
                source,
            })?;

        if info.find_location(url).is_none() {
            return Err(DownloadFailure::NoMatchingUrl {
                doi: doi.to_owned(),
                url: url.to_owned(),
            }
            .into());
        }

        let content = self
            .fetcher
            .fetch(url)
            .await
            .map_err(DownloadFailure::Fetch)?;

        let address = self
            .store
            .post(&self.dest, content.body, &content.content_type)
            .await
            .map_err(DownloadFailure::Store)?;

        let public = self
            .translator
            .to_public(&address)
            .map_err(DownloadFailure::Translate)?;

        tracing::info!(doi, url, location = %public, "Downloaded manuscript");
        Ok(public)
    }
}
