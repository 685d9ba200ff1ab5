use std::time::Duration;

use reqwest::redirect;

use crate::config::Config;

/// The `User-Agent` sent with all outgoing requests.
pub const USER_AGENT: &str = "pass-download-service";

/// Limits of outgoing HTTP requests.
#[derive(Copy, Clone, Debug)]
pub struct ClientLimits {
    /// Global timeout for one request, including reading the response body.
    pub timeout: Duration,
    /// The number of requests after which redirects are no longer followed.
    pub max_redirects: usize,
}

impl ClientLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.request_timeout,
            max_redirects: config.max_redirects,
        }
    }
}

impl Default for ClientLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            max_redirects: 10,
        }
    }
}

/// Creates the [`reqwest::Client`] shared by all outgoing requests.
///
/// The client keeps cookies across requests, since some repositories hand out session cookies
/// on their landing pages and expect them on the subsequent redirect to the manuscript.
///
/// Redirects fail once `max_redirects` requests have been made for a single fetch.
pub fn create_client(limits: &ClientLimits) -> reqwest::Result<reqwest::Client> {
    let max_redirects = limits.max_redirects;

    reqwest::ClientBuilder::new()
        .user_agent(USER_AGENT)
        .timeout(limits.timeout)
        .pool_idle_timeout(Duration::from_secs(30))
        .cookie_store(true)
        .redirect(redirect::Policy::custom(move |attempt: redirect::Attempt| {
            if attempt.previous().len() >= max_redirects {
                let error = format!(
                    "maximum number of redirects reached ({max_redirects}) for {}",
                    attempt.url()
                );
                return attempt.error(error);
            }
            attempt.follow()
        }))
        .build()
}
