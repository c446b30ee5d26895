//! JSON-over-HTTP fetching with failure classification.

use std::time::Duration;

use kgfed_core::BuildError;
use serde_json::Value;
use url::Url;

/// Fetches JSON documents and maps every failure to a [`BuildError`].
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// GET `url` and decode the body as JSON.
    ///
    /// `timeout` bounds the whole request including the body read.
    pub async fn fetch_json(
        &self,
        provider: &str,
        url: &str,
        timeout: Duration,
    ) -> Result<Value, BuildError> {
        let parsed = Url::parse(url)
            .map_err(|e| BuildError::fetch(provider, url, format!("invalid URL: {e}")))?;

        let response = self
            .client
            .get(parsed)
            .header("Accept", "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(provider, url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BuildError::fetch(provider, url, format!("HTTP status {}", status.as_u16())));
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                BuildError::malformed(provider, format!("invalid JSON at \"{url}\": {e}"))
            } else {
                classify(provider, url, &e)
            }
        })
    }
}

fn classify(provider: &str, url: &str, err: &reqwest::Error) -> BuildError {
    if err.is_timeout() {
        BuildError::timeout(provider, url, err.to_string())
    } else if err.is_connect() {
        BuildError::connection(provider, url, err.to_string())
    } else {
        BuildError::fetch(provider, url, err.to_string())
    }
}
