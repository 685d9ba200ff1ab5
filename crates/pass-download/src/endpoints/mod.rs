use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use pass_download_service::metric;
use sentry::integrations::tower::{NewSentryLayer, SentryHttpLayer};
use tower::ServiceBuilder;

use crate::service::RequestService;

mod download;
mod error;
mod lookup;
mod metrics;

pub use error::ResponseError;

use download::download_manuscript as download;
use lookup::lookup_doi as lookup;

pub async fn healthcheck() -> &'static str {
    metric!(counter("healthcheck") += 1);
    "ok"
}

pub fn create_app(service: RequestService) -> Router {
    // The layers here go "top to bottom" according to the reading order here.
    let layer = ServiceBuilder::new()
        .layer(NewSentryLayer::new_from_top())
        .layer(SentryHttpLayer::new().enable_transaction())
        .layer(middleware::from_fn(metrics::record_metrics));

    Router::new()
        .route("/lookup", get(lookup))
        .route("/download", post(download))
        .with_state(service)
        .layer(layer)
        // the healthcheck is last, as it will bypass all the middlewares
        .route("/healthcheck", get(healthcheck))
}
