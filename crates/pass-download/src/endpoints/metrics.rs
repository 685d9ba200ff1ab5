use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use pass_download_service::metric;

/// Records the duration and status code of every request to a known route.
pub async fn record_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unknown".to_owned());

    let response = next.run(request).await;

    metric!(timer("requests.duration") = start.elapsed(), "route" => &route);
    metric!(
        counter("responses.status_code") += 1,
        "route" => &route,
        "status" => response.status().as_str(),
    );

    response
}
