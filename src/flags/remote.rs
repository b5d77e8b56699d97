use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::{FeatureFlagProvider, FileFlags, FlagSnapshot, bools_only};

/// Flags held in an external key-value store spoken to over HTTP.
///
/// `GET {base}/{key}` answers `{"value": bool}` (404 means off) and `GET {base}`
/// answers a JSON object of every flag. Any failure falls back to `fallback`.
pub struct RemoteFlags {
    client: reqwest::Client,
    base_url: Url,
    fallback: Option<FileFlags>,
}

#[derive(Deserialize)]
struct FlagValue {
    value: bool,
}

impl RemoteFlags {
    pub fn new(base_url: &str, fallback: Option<FileFlags>) -> Result<Self, String> {
        let base_url =
            Url::parse(base_url).map_err(|e| format!("Invalid flag store URL '{base_url}': {e}"))?;
        if base_url.cannot_be_a_base() {
            return Err(format!("Flag store URL '{base_url}' cannot be a base"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| format!("Failed to build flag store client: {e}"))?;

        Ok(Self {
            client,
            base_url,
            fallback,
        })
    }

    fn key_url(&self, key: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(key);
        }
        url
    }

    async fn fetch(&self, key: &str) -> Result<bool, String> {
        let resp = self
            .client
            .get(self.key_url(key))
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        let resp = resp
            .error_for_status()
            .map_err(|e| format!("store answered {e}"))?;
        let body: FlagValue = resp
            .json()
            .await
            .map_err(|e| format!("bad flag body: {e}"))?;
        Ok(body.value)
    }

    async fn fetch_all(&self) -> Result<FlagSnapshot, String> {
        let map: serde_json::Map<String, serde_json::Value> = self
            .client
            .get(self.base_url.clone())
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?
            .error_for_status()
            .map_err(|e| format!("store answered {e}"))?
            .json()
            .await
            .map_err(|e| format!("bad snapshot body: {e}"))?;
        Ok(bools_only(map))
    }
}

#[async_trait]
impl FeatureFlagProvider for RemoteFlags {
    fn name(&self) -> &str {
        "remote"
    }

    async fn check(&self, key: &str) -> bool {
        match self.fetch(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Flag store lookup for '{key}' failed, using fallback: {e}");
                match &self.fallback {
                    Some(file) => file.check(key).await,
                    None => false,
                }
            }
        }
    }

    async fn snapshot(&self) -> FlagSnapshot {
        match self.fetch_all().await {
            Ok(flags) => flags,
            Err(e) => {
                tracing::warn!("Flag store snapshot failed, using fallback: {e}");
                match &self.fallback {
                    Some(file) => file.snapshot().await,
                    None => FlagSnapshot::new(),
                }
            }
        }
    }
}
