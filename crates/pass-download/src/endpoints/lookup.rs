use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::service::RequestService;

use super::ResponseError;

/// Query parameters of the lookup request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LookupParams {
    pub doi: String,
}

/// Responds with the manuscripts available for a DOI, as pretty-printed JSON.
pub async fn lookup_doi(
    State(service): State<RequestService>,
    Query(params): Query<LookupParams>,
) -> Result<Response, ResponseError> {
    if params.doi.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No DOI parameter provided").into());
    }

    let info = service.lookup(&params.doi).await?;

    let mut json = serde_json::to_string_pretty(&*info)?;
    json.push('\n');

    Ok((
        [(header::CONTENT_TYPE, "application/json;charset=utf-8")],
        json,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode, header};

    use crate::test;

    #[tokio::test]
    async fn test_response() {
        let response = test::send(Method::GET, "/lookup?doi=10.1000/oa").await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.headers[header::CONTENT_TYPE],
            "application/json;charset=utf-8"
        );
        insta::assert_snapshot!(response.body.trim_end(), @r#"
        {
          "manuscripts": [
            {
              "location": "http://example.org/oa.pdf",
              "repositoryInstitution": "Example University",
              "type": "application/pdf",
              "source": "Unpaywall",
              "name": "oa.pdf"
            }
          ]
        }
        "#);
    }

    #[tokio::test]
    async fn test_no_doi() {
        for uri in ["/lookup", "/lookup?doi=", "/lookup?url=http://example.org/oa.pdf"] {
            let response = test::send(Method::GET, uri).await;

            assert_eq!(response.status, StatusCode::BAD_REQUEST);
            assert_eq!(response.body, "No DOI parameter provided");
        }
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            let response = test::send(method, "/lookup?doi=10.1000/oa").await;

            assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
        }
    }

    #[tokio::test]
    async fn test_upstream_error() {
        let response = test::send(Method::GET, "/lookup?doi=10.1000/down").await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.body,
            "request failed with code 503 and message 'down for maintenance'"
        );
    }

    #[tokio::test]
    async fn test_unknown_doi() {
        let response = test::send(Method::GET, "/lookup?doi=10.1000/unknown").await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body, "unknown DOI 10.1000/unknown");
    }
}
