// src/release/mod.rs - Current release cycle lookup

pub mod cache;
pub mod http;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::infra::config::ReleaseConfig;
use crate::infra::errors::KarmaResult;
use crate::ledger::ReleaseId;

pub use cache::CachedReleaseProvider;
pub use http::HttpReleaseProvider;

/// Supplies the partition key for votes cast right now.
#[async_trait]
pub trait ReleaseProvider: Send + Sync {
    async fn current_release(&self) -> KarmaResult<ReleaseId>;
}

/// Always answers with the same release.
#[derive(Debug, Clone)]
pub struct StaticRelease(pub ReleaseId);

impl StaticRelease {
    pub fn new(id: impl Into<String>) -> Self {
        Self(ReleaseId::new(id))
    }
}

#[async_trait]
impl ReleaseProvider for StaticRelease {
    async fn current_release(&self) -> KarmaResult<ReleaseId> {
        Ok(self.0.clone())
    }
}

/// Build the provider described by `[release]`: a pinned id when `current`
/// is set, otherwise the HTTP listing behind a TTL cache.
pub fn from_config(config: &ReleaseConfig) -> Arc<dyn ReleaseProvider> {
    if let Some(ref current) = config.current {
        return Arc::new(StaticRelease::new(current.clone()));
    }
    Arc::new(CachedReleaseProvider::new(
        HttpReleaseProvider::new(config.url.clone()),
        Duration::from_secs(config.cache_ttl_secs),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_release() {
        let p = StaticRelease::new("f40");
        assert_eq!(p.current_release().await.unwrap().as_str(), "f40");
    }

    #[tokio::test]
    async fn test_from_config_prefers_pinned_release() {
        let config = ReleaseConfig {
            current: Some("f41".into()),
            ..ReleaseConfig::default()
        };
        let p = from_config(&config);
        assert_eq!(p.current_release().await.unwrap().as_str(), "f41");
    }
}
