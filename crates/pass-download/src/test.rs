//! Helpers for testing the HTTP API against in-memory services.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use pass_download_service::address::AddressTranslator;
use pass_download_service::caching::CacheConfig;
use pass_download_service::download::DownloadService;
use pass_download_service::fetch::{ContentFetcher, ContentStream, FetchError, FetchedContent};
use pass_download_service::lookup::{LookupError, LookupService, MetadataSource};
use pass_download_service::store::{BinaryStore, StoreError};
use pass_download_service::types::{DoiInfo, Manuscript};
use tower::ServiceExt;

use crate::endpoints::create_app;
use crate::service::RequestService;

/// Knows a DOI with a manuscript, one whose manuscript is gone, and one that fails to look up.
struct TestSource;

fn manuscript(name: &str) -> Manuscript {
    Manuscript {
        location: format!("http://example.org/{name}"),
        repository_institution: "Example University".into(),
        mime_type: "application/pdf".into(),
        source: "Unpaywall".into(),
        name: name.into(),
        ..Default::default()
    }
}

#[async_trait]
impl MetadataSource for TestSource {
    async fn lookup(&self, doi: &str) -> Result<DoiInfo, LookupError> {
        let manuscripts = match doi {
            "10.1000/oa" => vec![manuscript("oa.pdf")],
            "10.1000/gone" => vec![manuscript("gone.pdf")],
            "10.1000/down" => {
                return Err(LookupError::Status {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    message: "down for maintenance".into(),
                });
            }
            _ => return Err(LookupError::BadInput(format!("unknown DOI {doi}"))),
        };
        Ok(DoiInfo { manuscripts })
    }
}

/// Serves a PDF at `http://example.org/oa.pdf`, and 404 everywhere else.
struct TestFetcher;

#[async_trait]
impl ContentFetcher for TestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError> {
        if url != "http://example.org/oa.pdf" {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status: StatusCode::NOT_FOUND,
                body: "nope".into(),
            });
        }

        let chunks: Vec<Result<Bytes, io::Error>> = vec![Ok(Bytes::from_static(b"%PDF-1.4"))];
        Ok(FetchedContent {
            content_type: "application/pdf".into(),
            body: futures::stream::iter(chunks).boxed(),
        })
    }
}

/// Accepts everything, storing it at the same internal address.
struct TestStore;

#[async_trait]
impl BinaryStore for TestStore {
    async fn post(
        &self,
        _dest: &str,
        body: ContentStream,
        _content_type: &str,
    ) -> Result<String, StoreError> {
        let _: Vec<Bytes> = body.try_collect().await.unwrap();
        Ok("http://fcrepo:8080/fcrepo/rest/bin/ab/cd".into())
    }
}

/// A [`RequestService`] backed by in-memory services.
pub fn service() -> RequestService {
    let lookup = Arc::new(LookupService::new(
        Arc::new(TestSource),
        CacheConfig::default(),
    ));
    let download = Arc::new(DownloadService::new(
        lookup.clone(),
        Arc::new(TestFetcher),
        Arc::new(TestStore),
        AddressTranslator::new(
            "https://pass.example.org/fcrepo/rest",
            "http://fcrepo:8080/fcrepo/rest",
        ),
        "http://fcrepo:8080/fcrepo/rest/bin",
    ));

    RequestService::new(lookup, download)
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Sends a request without body to the app, backed by a fresh [`service`].
pub async fn send(method: Method, uri: &str) -> TestResponse {
    pass_download_test::setup();

    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = create_app(service()).oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    TestResponse {
        status,
        headers,
        body: String::from_utf8(body.to_vec()).unwrap(),
    }
}
