pub mod file;
pub mod remote;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::FlagsConfig;

pub use file::FileFlags;
pub use remote::RemoteFlags;

/// Flag consulted after a successful booking.
pub const REMINDERS_ENABLED: &str = "appointments.reminders.enabled";

pub type FlagSnapshot = BTreeMap<String, bool>;

/// Named boolean toggles. Lookups never fail: an unknown or unreachable flag is off.
#[async_trait]
pub trait FeatureFlagProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn check(&self, key: &str) -> bool;
    async fn snapshot(&self) -> FlagSnapshot;
}

/// Remote store when a URL is configured (with the file as fallback), otherwise the file alone.
pub fn from_config(config: &FlagsConfig) -> Result<Arc<dyn FeatureFlagProvider>, String> {
    let file = FileFlags::new(config.fallback_path.clone());

    let provider: Arc<dyn FeatureFlagProvider> = match &config.remote_url {
        Some(url) => Arc::new(RemoteFlags::new(url, Some(file))?),
        None => Arc::new(file),
    };

    tracing::info!("Feature flags served by the {} provider", provider.name());
    Ok(provider)
}

/// Keep only boolean entries of a JSON object.
pub(crate) fn bools_only(map: serde_json::Map<String, serde_json::Value>) -> FlagSnapshot {
    map.into_iter()
        .filter_map(|(k, v)| v.as_bool().map(|b| (k, b)))
        .collect()
}
