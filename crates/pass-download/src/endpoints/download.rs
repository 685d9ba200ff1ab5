use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::service::RequestService;

use super::ResponseError;

/// Query parameters of the download request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DownloadParams {
    pub doi: String,
    pub url: String,
}

/// Downloads a manuscript into the repository.
///
/// Responds with `201 Created` and the public address of the stored binary, both as `Location`
/// and as body.
pub async fn download_manuscript(
    State(service): State<RequestService>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, ResponseError> {
    sentry::configure_scope(|scope| {
        scope.set_tag("request.doi", &params.doi);
    });

    if params.doi.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No DOI parameter provided").into());
    }
    if params.url.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No URL parameter provided").into());
    }

    let location = service.download(&params.doi, &params.url).await?;

    Ok((
        StatusCode::CREATED,
        [
            (header::CONTENT_TYPE, "text/plain".to_owned()),
            (header::LOCATION, location.clone()),
        ],
        location,
    )
        .into_response())
}
