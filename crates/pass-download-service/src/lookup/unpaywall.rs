use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::UnpaywallConfig;
use crate::types::{DoiInfo, Manuscript};

use super::{LookupError, MetadataSource};

/// Response of the Unpaywall DOI endpoint, reduced to the fields we use.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UnpaywallResponse {
    best_oa_location: Option<UnpaywallLocation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UnpaywallLocation {
    url_for_pdf: Option<String>,
    repository_institution: Option<String>,
}

/// Looks up DOIs with the [Unpaywall API](https://unpaywall.org/products/api).
///
/// Only the best open access location is reported, and only if it links to a PDF.
#[derive(Debug, Clone)]
pub struct UnpaywallSource {
    client: reqwest::Client,
    base_uri: String,
    email: String,
}

impl UnpaywallSource {
    pub fn new(client: reqwest::Client, config: &UnpaywallConfig) -> Self {
        Self {
            client,
            base_uri: config.base_uri.trim_end_matches('/').to_owned(),
            email: config.email.clone(),
        }
    }

    fn request_uri(&self, doi: &str) -> String {
        format!("{}/{}?email={}", self.base_uri, doi, self.email)
    }

    async fn fetch(&self, doi: &str) -> Result<UnpaywallResponse, LookupError> {
        let response = self
            .client
            .get(self.request_uri(doi))
            .send()
            .await
            .map_err(LookupError::Request)?;

        let status = response.status();
        let body = response.bytes().await.map_err(LookupError::Request)?;

        if !status.is_success() {
            let message = String::from_utf8_lossy(&body).into_owned();
            tracing::debug!(doi, %status, "Unpaywall lookup failed");
            return Err(match status {
                StatusCode::NOT_FOUND => LookupError::BadInput(format!(
                    "unknown DOI {doi}: request failed with code {} and message '{message}'",
                    status.as_u16()
                )),
                _ => LookupError::Status { status, message },
            });
        }

        serde_json::from_slice(&body).map_err(LookupError::Malformed)
    }
}

#[async_trait]
impl MetadataSource for UnpaywallSource {
    async fn lookup(&self, doi: &str) -> Result<DoiInfo, LookupError> {
        let response = self.fetch(doi).await?;

        let location = response.best_oa_location.unwrap_or_default();
        let url_for_pdf = location.url_for_pdf.unwrap_or_default();

        let mut info = DoiInfo::default();
        if !url_for_pdf.is_empty() {
            info.manuscripts.push(Manuscript {
                name: file_name(&url_for_pdf).unwrap_or_default(),
                location: url_for_pdf,
                repository_institution: location.repository_institution.unwrap_or_default(),
                mime_type: "application/pdf".into(),
                source: "Unpaywall".into(),
                ..Default::default()
            });
        }

        Ok(info)
    }
}

/// Extracts the file name from the last path segment of a manuscript URL.
///
/// The URL is decoded like a query component, so `+` turns into a space.
fn file_name(url: &str) -> Option<String> {
    let url = url.replace('+', " ");
    match percent_decode_str(&url).decode_utf8() {
        Ok(decoded) => decoded.rsplit('/').next().map(str::to_owned),
        Err(error) => {
            tracing::warn!(url, %error, "file name decoding failed");
            None
        }
    }
}
