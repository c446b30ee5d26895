//! Registry-discovered providers.
//!
//! A registry is a single endpoint that lists several providers sharing one
//! deployment. Each listed provider becomes its own schema layer.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use futures_util::future::join_all;
use kgfed_core::{BuildError, FederationError};
use serde_json::Value;
use tracing::debug;

use super::LoadOutcome;
use super::http::HttpFetcher;
use crate::provider::ProviderSchema;

/// Registry adapters this crate knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    /// `GET {base}/registry` lists paths, `GET {base}/{path}/predicates` is each schema.
    Automat,
}

impl RegistryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryKind::Automat => "automat",
        }
    }

    /// Provider id assigned to a discovered path.
    pub fn provider_id(&self, path: &str) -> String {
        format!("{}_{path}", self.as_str())
    }

    /// Access URL assigned to a discovered path.
    pub fn access_url(&self, path: &str) -> String {
        format!("/graph/{}/{path}", self.as_str())
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistryKind {
    type Err = FederationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "automat" => Ok(RegistryKind::Automat),
            other => Err(FederationError::unregistered_adapter(other)),
        }
    }
}

/// A configured registry endpoint.
#[derive(Debug, Clone)]
pub struct RegistrySource {
    /// Name of the configuration entry the registry came from.
    pub name: String,
    pub kind: RegistryKind,
    pub base_url: String,
    pub exclude: Vec<String>,
}

impl RegistrySource {
    /// List the registry and fetch every non-excluded provider concurrently.
    pub async fn discover(&self, fetcher: &HttpFetcher, timeout: Duration) -> LoadOutcome {
        let base = self.base_url.trim_end_matches('/');
        let index_url = format!("{base}/registry");

        let index = match fetcher.fetch_json(&self.name, &index_url, timeout).await {
            Ok(index) => index,
            Err(e) => return LoadOutcome::failed(e),
        };
        let paths = match parse_index(&index) {
            Some(paths) => paths,
            None => {
                return LoadOutcome::failed(BuildError::malformed(
                    &self.name,
                    format!("registry at \"{index_url}\" is not a list of paths"),
                ));
            }
        };

        let listed: Vec<&str> = paths
            .iter()
            .map(String::as_str)
            .filter(|path| !self.exclude.iter().any(|ex| ex == path))
            .collect();
        debug!(
            registry = %self.name,
            listed = paths.len(),
            selected = listed.len(),
            "Discovered registry providers"
        );

        let fetches = listed.iter().map(|path| async move {
            let id = self.kind.provider_id(path);
            let url = format!("{base}/{path}/predicates");
            let document = fetcher.fetch_json(&id, &url, timeout).await;
            (id, self.kind.access_url(path), document)
        });

        let mut outcome = LoadOutcome::default();
        for (id, access_url, document) in join_all(fetches).await {
            match document {
                Ok(document) => outcome.absorb(ProviderSchema::parse(id, access_url, &document)),
                Err(e) => outcome.errors.push(e),
            }
        }
        outcome
    }
}

fn parse_index(index: &Value) -> Option<Vec<String>> {
    index
        .as_array()?
        .iter()
        .map(|p| p.as_str().map(str::to_string))
        .collect()
}
