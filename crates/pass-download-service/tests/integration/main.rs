use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use pass_download_service::config::{Config, FedoraConfig, UnpaywallConfig};
use pass_download_service::services::SharedServices;
use pass_download_test::{HitCounter, Server};

mod download;
mod lookup;

pub const PUBLIC_BASE_URL: &str = "https://pass.example.org/fcrepo/rest";

/// A binary posted to the Fedora mock.
#[derive(Debug, Clone)]
pub struct Deposit {
    pub content_type: String,
    pub user_agent: String,
    pub body: Bytes,
}

/// The download services, backed by mocks of all upstream dependencies.
pub struct Environment {
    pub services: SharedServices,
    /// Serves the manuscripts.
    pub content: HitCounter,
    pub unpaywall_hits: Arc<AtomicUsize>,
    pub deposits: Arc<Mutex<Vec<Deposit>>>,
    _unpaywall: Server,
    _fedora: Server,
}

impl Environment {
    pub fn unpaywall_hits(&self) -> usize {
        self.unpaywall_hits.load(Ordering::SeqCst)
    }

    pub fn deposits(&self) -> Vec<Deposit> {
        self.deposits.lock().unwrap().clone()
    }

    /// The location Unpaywall reports for the open access DOI `10.1000/oa`.
    pub fn open_access_url(&self) -> String {
        self.content.url("pdf/Open%20Access.pdf").to_string()
    }
}

/// An Unpaywall mock knowing a few DOIs, with manuscripts on `content`.
///
///  - `10.1000/oa` has a PDF,
///  - `10.1000/gone` has a PDF that responds with 404,
///  - `10.1000/closed` has no open access location,
///  - all other DOIs are unknown.
fn unpaywall_server(content: &HitCounter, hits: Arc<AtomicUsize>) -> Server {
    let pdf = content.url("pdf/Open%20Access.pdf").to_string();
    let gone = content.url("respond_statuscode/404/gone.pdf").to_string();

    let router = Router::new().route(
        "/v2/*doi",
        get(move |Path(doi): Path<String>| {
            hits.fetch_add(1, Ordering::SeqCst);
            let location = |url: &str| {
                serde_json::json!({
                    "best_oa_location": {
                        "url_for_pdf": url,
                        "version": "acceptedVersion",
                        "repository_institution": "Example University"
                    }
                })
            };
            let response = match doi.as_str() {
                "10.1000/oa" => Json(location(&pdf)).into_response(),
                "10.1000/gone" => Json(location(&gone)).into_response(),
                "10.1000/closed" => {
                    Json(serde_json::json!({ "best_oa_location": null })).into_response()
                }
                _ => (
                    StatusCode::NOT_FOUND,
                    Json(serde_json::json!({ "error": true, "message": "invalid doi" })),
                )
                    .into_response(),
            };
            async move { response }
        }),
    );

    Server::new(router)
}

/// A Fedora mock accepting binaries in `/fcrepo/rest/bin` with `status`.
fn fedora_server(status: StatusCode, deposits: Arc<Mutex<Vec<Deposit>>>) -> Server {
    let router = Router::new().route(
        "/fcrepo/rest/bin",
        post(move |headers: HeaderMap, body: Bytes| {
            let value_of = |name: header::HeaderName| {
                headers
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
                    .to_owned()
            };
            deposits.lock().unwrap().push(Deposit {
                content_type: value_of(header::CONTENT_TYPE),
                user_agent: value_of(header::USER_AGENT),
                body,
            });

            let location = format!("http://{}/fcrepo/rest/bin/ab/cd", value_of(header::HOST));
            async move { (status, [(header::LOCATION, location)], "created") }
        }),
    );

    Server::new(router)
}

/// Starts mocks of all dependencies, with Fedora answering posts with `fedora_status`.
pub fn setup_environment(fedora_status: StatusCode) -> Environment {
    pass_download_test::setup();

    let content = HitCounter::new();
    let unpaywall_hits = Arc::new(AtomicUsize::new(0));
    let unpaywall = unpaywall_server(&content, unpaywall_hits.clone());
    let deposits = Arc::new(Mutex::new(Vec::new()));
    let fedora = fedora_server(fedora_status, deposits.clone());

    let config = Config {
        unpaywall: UnpaywallConfig {
            base_uri: unpaywall.url("v2").to_string(),
            email: "pass@example.org".into(),
        },
        fedora: FedoraConfig {
            internal_base_url: fedora.url("fcrepo/rest").to_string(),
            public_base_url: PUBLIC_BASE_URL.into(),
            username: Some("fedoraAdmin".into()),
            password: Some("moo".into()),
        },
        download_dest: fedora.url("fcrepo/rest/bin").to_string(),
        ..Default::default()
    };

    Environment {
        services: SharedServices::new(config).unwrap(),
        content,
        unpaywall_hits,
        deposits,
        _unpaywall: unpaywall,
        _fedora: fedora,
    }
}
