use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, header};

use super::{ContentFetcher, FetchError, FetchedContent};

/// The content type reported for responses without a `Content-Type` header.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Fetches content over HTTP, following redirects as configured on the client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError> {
        tracing::debug!("Fetching content from `{}`", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| FetchError::Transport {
                url: url.to_owned(),
                source: error.into(),
            })?;

        let status = response.status();
        metric!(counter("fetch.response") += 1, "status" => status.as_str());

        if !status.is_success() {
            // the body is only used in the error message
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                url: url.to_owned(),
                status,
                body,
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_owned();

        let body = response
            .bytes_stream()
            .map_err(std::io::Error::other)
            .boxed();

        Ok(FetchedContent { content_type, body })
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use pass_download_test::{HitCounter, read_fixture};
    use reqwest::StatusCode;

    use crate::utils::http::{ClientLimits, create_client};

    use super::*;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(create_client(&ClientLimits::default()).unwrap())
    }

    #[tokio::test]
    async fn test_fetch() {
        pass_download_test::setup();
        let server = HitCounter::new();

        let content = fetcher()
            .fetch(server.url("redirect/pdf/manuscript.pdf").as_str())
            .await
            .unwrap();
        assert_eq!(content.content_type, "application/pdf");

        let chunks: Vec<_> = content.body.try_collect().await.unwrap();
        assert_eq!(chunks.concat(), read_fixture("manuscripts/sample.pdf"));
        assert_eq!(
            server.all_hits(),
            [
                ("/pdf/manuscript.pdf".to_owned(), 1),
                ("/redirect/pdf/manuscript.pdf".to_owned(), 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        pass_download_test::setup();
        let server = HitCounter::new();

        let url = server.url("respond_statuscode/404/manuscript.pdf");
        let error = fetcher().fetch(url.as_str()).await.unwrap_err();

        match &error {
            FetchError::Status { status, .. } => assert_eq!(*status, StatusCode::NOT_FOUND),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(error.to_string(), format!("download of '{url}' failed with 404 "));
    }

    #[tokio::test]
    async fn test_fetch_connection_error() {
        pass_download_test::setup();

        let error = fetcher()
            .fetch("http://127.0.0.1:1/manuscript.pdf")
            .await
            .unwrap_err();

        assert!(matches!(error, FetchError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_content_type_passthrough() {
        pass_download_test::setup();
        let server = HitCounter::new();

        let content = fetcher()
            .fetch(server.url("garbage_data/hello").as_str())
            .await
            .unwrap();

        // axum labels string bodies as plain text
        assert_eq!(content.content_type, "text/plain; charset=utf-8");
    }
}
