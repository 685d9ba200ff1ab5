//! Deposit of downloaded content into the repository.

use std::error::Error as StdError;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::fetch::ContentStream;

mod fedora;

pub use fedora::FedoraStore;

/// An error depositing content.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request to the store failed before a response was received.
    #[error("error connecting to {dest}")]
    Request {
        dest: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// The store rejected the content.
    #[error("got error from Fedora: {body}")]
    Rejected { status: StatusCode, body: String },
    /// The store accepted the content, but did not report where it put it.
    #[error("response from {dest} is missing the location of the stored content")]
    MissingLocation { dest: String },
}

/// A place binary content can be posted to.
#[async_trait]
pub trait BinaryStore: Send + Sync {
    /// Streams `body` into the container at `dest`, and returns the address of the new binary.
    ///
    /// The returned address is in the store's own (internal) namespace.
    async fn post(
        &self,
        dest: &str,
        body: ContentStream,
        content_type: &str,
    ) -> Result<String, StoreError>;
}
