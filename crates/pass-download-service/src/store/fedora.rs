use async_trait::async_trait;
use reqwest::{Body, Client, header};

use crate::config::FedoraConfig;
use crate::fetch::ContentStream;
use crate::utils::http::USER_AGENT;

use super::{BinaryStore, StoreError};

#[derive(Debug, Clone)]
struct Credentials {
    username: String,
    password: String,
}

/// Posts binaries to a Fedora repository on the private network.
#[derive(Debug, Clone)]
pub struct FedoraStore {
    client: Client,
    credentials: Option<Credentials>,
}

impl FedoraStore {
    /// Creates a store that authenticates with basic auth if `config` has a username.
    pub fn new(client: Client, config: &FedoraConfig) -> Self {
        let credentials = config
            .username
            .as_ref()
            .filter(|username| !username.is_empty())
            .map(|username| Credentials {
                username: username.clone(),
                password: config.password.clone().unwrap_or_default(),
            });

        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl BinaryStore for FedoraStore {
    async fn post(
        &self,
        dest: &str,
        body: ContentStream,
        content_type: &str,
    ) -> Result<String, StoreError> {
        let mut request = self
            .client
            .post(dest)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::wrap_stream(body));

        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let response = request.send().await.map_err(|error| StoreError::Request {
            dest: dest.to_owned(),
            source: error.into(),
        })?;

        let status = response.status();
        if status.as_u16() > 299 {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(dest, %status, "Fedora rejected binary");
            return Err(StoreError::Rejected { status, body });
        }

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        // consume and discard the body
        if let Err(error) = response.bytes().await {
            tracing::debug!(dest, %error, "Failed to drain Fedora response");
        }

        let location = location.ok_or_else(|| StoreError::MissingLocation {
            dest: dest.to_owned(),
        })?;
        tracing::debug!(dest, location, "Stored binary");

        Ok(location)
    }
}
