//! HTTP client for the Overpass API interpreter.

mod endpoints;

use std::time::Duration;

use mmdir_core::AppConfig;
use reqwest::{Client, StatusCode, Url};
use tokio_util::sync::CancellationToken;

use crate::error::OverpassError;
use crate::rate_limit::{retry_with_backoff, BackoffPolicy, Cooldown};
use crate::types::OverpassResponse;

use endpoints::EndpointPool;

/// Characters of a non-JSON body kept for diagnostics.
const SNIPPET_CHARS: usize = 80;

/// Resilient Overpass client over a pool of mirrors.
///
/// Every attempt, retries included, goes to the next mirror in round-robin
/// order. HTTP 429 trips a cooldown shared by all requests made through this
/// client, skips an extra mirror and retries with back-off. Any other non-2xx
/// status, and any 2xx body that is not JSON, fails immediately.
#[derive(Debug)]
pub struct OverpassClient {
    client: Client,
    pool: EndpointPool,
    policy: BackoffPolicy,
    cooldown: Cooldown,
}

/// `<endpoint>?data=<url-encoded query>`.
pub(crate) fn request_url(endpoint: &Url, query: &str) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut().append_pair("data", query);
    url
}

fn snippet(body: &str) -> String {
    body.chars().take(SNIPPET_CHARS).collect()
}

impl OverpassClient {
    /// Creates a client over `endpoints`.
    ///
    /// # Errors
    ///
    /// - [`OverpassError::NoEndpoints`] if `endpoints` is empty.
    /// - [`OverpassError::InvalidEndpoint`] if any entry is not an http(s) URL.
    /// - [`OverpassError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new<S: AsRef<str>>(
        endpoints: &[S],
        timeout_secs: u64,
        user_agent: &str,
        policy: BackoffPolicy,
    ) -> Result<Self, OverpassError> {
        let pool = EndpointPool::new(endpoints)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            pool,
            policy,
            cooldown: Cooldown::new(),
        })
    }

    /// Creates a client from the `MMDIR_*` configuration.
    ///
    /// # Errors
    ///
    /// See [`OverpassClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, OverpassError> {
        Self::new(
            &config.overpass_endpoints,
            config.request_timeout_secs,
            &config.user_agent,
            BackoffPolicy::from_app_config(config),
        )
    }

    /// Remaining process-wide cooldown after a 429, if any.
    #[must_use]
    pub fn rate_limited_for(&self) -> Option<Duration> {
        self.cooldown.remaining()
    }

    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.pool.len()
    }

    /// Runs `query` and returns the parsed response.
    ///
    /// `cancel` is checked while waiting for the cooldown, between retries,
    /// during the request and once more after the body is parsed, so a
    /// superseded query never yields a result.
    ///
    /// # Errors
    ///
    /// - [`OverpassError::Superseded`] if `cancel` fires at any point.
    /// - [`OverpassError::UnexpectedStatus`] for a non-2xx status other than 429.
    /// - [`OverpassError::NonJson`] for a 2xx body without a JSON content type.
    /// - [`OverpassError::Deserialize`] if the JSON does not match the response shape.
    /// - [`OverpassError::Http`] on network or TLS failure.
    /// - [`OverpassError::RateLimited`] only when the policy caps retries.
    pub async fn fetch(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<OverpassResponse, OverpassError> {
        let response = retry_with_backoff(&self.policy, &self.cooldown, cancel, move || {
            self.attempt(query, cancel)
        })
        .await?;

        if cancel.is_cancelled() {
            return Err(OverpassError::Superseded);
        }
        Ok(response)
    }

    async fn attempt(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<OverpassResponse, OverpassError> {
        let endpoint = self.pool.next();
        tracing::debug!(%endpoint, query_len = query.len(), "sending Overpass query");

        let request = self.client.get(request_url(endpoint, query)).send();
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(OverpassError::Superseded),
            response = request => response?,
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            self.pool.rotate();
            return Err(OverpassError::RateLimited {
                endpoint: endpoint.to_string(),
            });
        }
        if !status.is_success() {
            return Err(OverpassError::UnexpectedStatus {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(OverpassError::Superseded),
            body = response.text() => body?,
        };

        if !content_type.to_ascii_lowercase().contains("application/json") {
            return Err(OverpassError::NonJson {
                content_type,
                snippet: snippet(&body),
            });
        }

        serde_json::from_str::<OverpassResponse>(&body).map_err(|e| OverpassError::Deserialize {
            context: format!("Overpass response from {endpoint}"),
            source: e,
        })
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
