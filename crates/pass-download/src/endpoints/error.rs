use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pass_download_service::download::DownloadError;
use pass_download_service::lookup::LookupError;
use sentry::integrations::anyhow::capture_anyhow;

/// An error response of the HTTP API.
///
/// The response body is the error with all of its causes as plain text. Server errors are
/// reported to Sentry.
#[derive(Debug)]
pub struct ResponseError {
    status: StatusCode,
    err: anyhow::Error,
}

impl From<(StatusCode, &'static str)> for ResponseError {
    fn from((code, msg): (StatusCode, &'static str)) -> Self {
        Self {
            status: code,
            err: anyhow::anyhow!(msg),
        }
    }
}

impl From<Arc<LookupError>> for ResponseError {
    fn from(err: Arc<LookupError>) -> Self {
        let status = match err.is_bad_input() {
            true => StatusCode::BAD_REQUEST,
            false => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            err: err.into(),
        }
    }
}

impl From<DownloadError> for ResponseError {
    fn from(err: DownloadError) -> Self {
        let status = match err.is_bad_input() {
            true => StatusCode::BAD_REQUEST,
            false => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            err: err.into(),
        }
    }
}

impl From<serde_json::Error> for ResponseError {
    fn from(err: serde_json::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            err: err.into(),
        }
    }
}

impl IntoResponse for ResponseError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            capture_anyhow(&self.err);
        }
        (self.status, format!("{:#}", self.err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain_in_body() {
        let lookup = Arc::new(LookupError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: "upstream down".into(),
        });
        let err = ResponseError::from(lookup);

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        insta::assert_snapshot!(format!("{:#}", err.err), @"request failed with code 502 and message 'upstream down'");
    }

    #[test]
    fn test_bad_input_status() {
        let lookup = Arc::new(LookupError::BadInput("unknown DOI 10.1000/x".into()));
        let err = ResponseError::from(lookup);

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
