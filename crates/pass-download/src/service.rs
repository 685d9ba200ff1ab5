//! The state shared by all HTTP endpoints.

use std::sync::Arc;

use anyhow::Result;
use pass_download_service::config::Config;
use pass_download_service::download::{DownloadError, DownloadService};
use pass_download_service::lookup::{LookupError, LookupService};
use pass_download_service::services::SharedServices;
use pass_download_service::types::DoiInfo;

/// Access to the lookup and download services from request handlers.
#[derive(Clone, Debug)]
pub struct RequestService {
    lookup: Arc<LookupService>,
    download: Arc<DownloadService>,
}

impl RequestService {
    /// Creates all services according to `config`.
    pub fn create(config: Config) -> Result<Self> {
        let SharedServices {
            lookup, download, ..
        } = SharedServices::new(config)?;

        Ok(Self::new(lookup, download))
    }

    pub fn new(lookup: Arc<LookupService>, download: Arc<DownloadService>) -> Self {
        Self { lookup, download }
    }

    /// Looks up the manuscripts available for `doi`.
    pub async fn lookup(&self, doi: &str) -> Result<Arc<DoiInfo>, Arc<LookupError>> {
        self.lookup.lookup(doi).await
    }

    /// Downloads the manuscript at `url` into the repository.
    pub async fn download(&self, doi: &str, url: &str) -> Result<String, DownloadError> {
        self.download.download(doi, url).await
    }
}
