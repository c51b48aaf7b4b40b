// src/release/cache.rs - TTL cache in front of a release provider

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::ReleaseProvider;
use crate::infra::errors::KarmaResult;
use crate::ledger::ReleaseId;

/// Remembers the last answer of `inner` for `ttl`.
///
/// If a refresh fails while a stale answer is held, the stale answer is
/// served and the failure logged, so a flaky listing does not block votes.
pub struct CachedReleaseProvider<P> {
    inner: P,
    ttl: Duration,
    cached: Mutex<Option<(ReleaseId, Instant)>>,
}

impl<P: ReleaseProvider> CachedReleaseProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: Mutex::new(None),
        }
    }

    fn lookup(&self) -> (Option<ReleaseId>, bool) {
        let cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        match cached.as_ref() {
            Some((id, at)) => (Some(id.clone()), at.elapsed() < self.ttl),
            None => (None, false),
        }
    }
}

#[async_trait]
impl<P: ReleaseProvider> ReleaseProvider for CachedReleaseProvider<P> {
    async fn current_release(&self) -> KarmaResult<ReleaseId> {
        let (cached, fresh) = self.lookup();
        if let (Some(id), true) = (&cached, fresh) {
            return Ok(id.clone());
        }

        match self.inner.current_release().await {
            Ok(id) => {
                let mut slot = self.cached.lock().unwrap_or_else(|e| e.into_inner());
                *slot = Some((id.clone(), Instant::now()));
                Ok(id)
            }
            Err(e) => match cached {
                Some(stale) => {
                    tracing::warn!("Release lookup failed, keeping {}: {}", stale, e);
                    Ok(stale)
                }
                None => Err(e),
            },
        }
    }
}
