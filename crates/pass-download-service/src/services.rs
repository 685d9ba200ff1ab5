//! Provides the shared download services and a way to initialize them.
//!
//! [`SharedServices`] wires the Unpaywall metadata source, the HTTP content fetcher and the
//! Fedora binary store into the lookup and download services, according to the provided
//! [`Config`]. All of them share a single HTTP client.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::address::AddressTranslator;
use crate::config::Config;
use crate::download::DownloadService;
use crate::fetch::HttpFetcher;
use crate::lookup::{LookupService, UnpaywallSource};
use crate::store::FedoraStore;
use crate::utils::http::{ClientLimits, create_client};

#[derive(Debug)]
pub struct SharedServices {
    pub config: Config,
    pub lookup: Arc<LookupService>,
    pub download: Arc<DownloadService>,
}

impl SharedServices {
    pub fn new(config: Config) -> Result<Self> {
        anyhow::ensure!(
            !config.fedora.internal_base_url.is_empty() && !config.fedora.public_base_url.is_empty(),
            "internal and public Fedora base URLs must be configured"
        );

        let client = create_client(&ClientLimits::from_config(&config))
            .context("failed to create HTTP client")?;

        if config.download_dest.is_empty() {
            tracing::warn!("No download destination configured, downloads will fail");
        }

        let source = UnpaywallSource::new(client.clone(), &config.unpaywall);
        let lookup = Arc::new(LookupService::new(
            Arc::new(source),
            config.caches.lookup,
        ));

        let translator = AddressTranslator::new(
            config.fedora.public_base_url.clone(),
            config.fedora.internal_base_url.clone(),
        );
        let download = Arc::new(DownloadService::new(
            lookup.clone(),
            Arc::new(HttpFetcher::new(client.clone())),
            Arc::new(FedoraStore::new(client, &config.fedora)),
            translator,
            config.download_dest.clone(),
        ));

        Ok(Self {
            config,
            lookup,
            download,
        })
    }
}
