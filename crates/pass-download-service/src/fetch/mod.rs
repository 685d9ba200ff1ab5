//! Retrieval of manuscript content from the hosts reported by the metadata source.

use std::error::Error as StdError;
use std::fmt;
use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use reqwest::StatusCode;
use thiserror::Error;

mod http;

pub use http::HttpFetcher;

/// A streamed response body. It is never buffered in memory as a whole.
pub type ContentStream = BoxStream<'static, Result<Bytes, io::Error>>;

/// An error fetching content.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request failed before a response was received, e.g. due to a connection error.
    #[error("could not fetch content URL {url}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// The content host responded with a non-success status.
    #[error("download of '{url}' failed with {} {body}", .status.as_u16())]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
}

/// The successful response to a content request.
pub struct FetchedContent {
    /// The `Content-Type` reported by the content host.
    pub content_type: String,
    /// The response body.
    pub body: ContentStream,
}

impl fmt::Debug for FetchedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedContent")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Retrieves content by URL with a single request.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Requests `url`, returning the streamed body if the host responds with success.
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError>;
}
