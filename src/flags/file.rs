use std::path::PathBuf;

use async_trait::async_trait;

use super::{FeatureFlagProvider, FlagSnapshot, bools_only};

/// Flags read from a local JSON object, e.g. `{"appointments.reminders.enabled": true}`.
///
/// The file is re-read on every call so edits apply without a restart.
#[derive(Debug, Clone)]
pub struct FileFlags {
    path: Option<PathBuf>,
}

impl FileFlags {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    async fn load(&self) -> FlagSnapshot {
        let Some(path) = &self.path else {
            return FlagSnapshot::new();
        };

        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("Flag file {} unavailable: {e}", path.display());
                return FlagSnapshot::new();
            }
        };

        match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&raw) {
            Ok(map) => bools_only(map),
            Err(e) => {
                tracing::warn!("Flag file {} is not a JSON object: {e}", path.display());
                FlagSnapshot::new()
            }
        }
    }
}

#[async_trait]
impl FeatureFlagProvider for FileFlags {
    fn name(&self) -> &str {
        "file"
    }

    async fn check(&self, key: &str) -> bool {
        self.load().await.get(key).copied().unwrap_or(false)
    }

    async fn snapshot(&self) -> FlagSnapshot {
        self.load().await
    }
}
