//! Round-robin pool of equivalent Overpass interpreter URLs.

use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::Url;

use crate::error::OverpassError;

#[derive(Debug)]
pub(crate) struct EndpointPool {
    endpoints: Vec<Url>,
    cursor: AtomicUsize,
}

impl EndpointPool {
    pub(crate) fn new<S: AsRef<str>>(endpoints: &[S]) -> Result<Self, OverpassError> {
        if endpoints.is_empty() {
            return Err(OverpassError::NoEndpoints);
        }
        let endpoints = endpoints
            .iter()
            .map(|raw| {
                let raw = raw.as_ref().trim();
                let url = Url::parse(raw).map_err(|e| OverpassError::InvalidEndpoint {
                    endpoint: raw.to_owned(),
                    reason: e.to_string(),
                })?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(OverpassError::InvalidEndpoint {
                        endpoint: raw.to_owned(),
                        reason: format!("unsupported scheme {}", url.scheme()),
                    });
                }
                Ok(url)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            endpoints,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Endpoint for the next attempt. Advances the cursor.
    pub(crate) fn next(&self) -> &Url {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.endpoints.len();
        &self.endpoints[i]
    }

    /// Skips one endpoint. Called on 429 on top of the per-attempt advance.
    pub(crate) fn rotate(&self) {
        self.cursor.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn len(&self) -> usize {
        self.endpoints.len()
    }
}
