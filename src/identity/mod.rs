// src/identity/mod.rs - Chat handle -> account resolution
//
// The karma core never mutates the directory. It asks `SharedDirectory`
// for the latest snapshot on every event and resolves against that `Arc`;
// a refresh swaps in a whole new snapshot.

pub mod directory;
pub mod source;

pub use directory::{normalize_nick, Account, Directory, DirectoryRecord};
pub use source::{DirectorySource, FileDirectorySource, StaticDirectorySource};

use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::infra::errors::KarmaResult;

/// Latest directory snapshot, shared between the refresher and event handlers.
#[derive(Clone, Default)]
pub struct SharedDirectory {
    current: Arc<RwLock<Arc<Directory>>>,
}

impl SharedDirectory {
    pub fn new(directory: Directory) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(directory))),
        }
    }

    pub fn snapshot(&self) -> Arc<Directory> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn replace(&self, directory: Directory) {
        let mut slot = self.current.write().unwrap_or_else(|e| e.into_inner());
        *slot = Arc::new(directory);
    }
}

/// Fetch a fresh snapshot from `source` and publish it.
///
/// On failure the previous snapshot stays in place.
pub async fn refresh_directory(
    shared: &SharedDirectory,
    source: &dyn DirectorySource,
) -> KarmaResult<usize> {
    tracing::info!("Downloading user data from {} directory", source.name());
    let records = source.fetch_records().await?;
    let directory = Directory::from_records(records);
    let count = directory.len();
    tracing::info!(
        "Caching {} accounts ({} nicks)",
        count,
        directory.alias_count()
    );
    shared.replace(directory);
    Ok(count)
}

/// Refresh `shared` from `source` every `interval` until the task is aborted.
pub fn spawn_directory_refresh(
    shared: SharedDirectory,
    source: Arc<dyn DirectorySource>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Consume the immediate first tick; startup refresh is the caller's call.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = refresh_directory(&shared, source.as_ref()).await {
                tracing::warn!("Directory refresh failed, keeping previous snapshot: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::errors::KarmaError;
    use async_trait::async_trait;

    struct Broken;

    #[async_trait]
    impl DirectorySource for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        async fn fetch_records(&self) -> KarmaResult<Vec<DirectoryRecord>> {
            Err(KarmaError::directory("unreachable"))
        }
    }

    fn record(username: &str) -> DirectoryRecord {
        DirectoryRecord {
            username: username.into(),
            ircnicks: vec![],
        }
    }

    #[tokio::test]
    async fn test_refresh_publishes_new_snapshot() {
        let shared = SharedDirectory::default();
        let before = shared.snapshot();
        assert!(before.resolve("test").is_none());

        let source = StaticDirectorySource::new(vec![record("test")]);
        assert_eq!(refresh_directory(&shared, &source).await.unwrap(), 1);

        assert!(shared.snapshot().resolve("test").is_some());
        // Snapshots handed out earlier are unaffected.
        assert!(before.resolve("test").is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous() {
        let mut dir = Directory::default();
        dir.insert("test", ["tester"]);
        let shared = SharedDirectory::new(dir);

        assert!(refresh_directory(&shared, &Broken).await.is_err());
        assert_eq!(shared.snapshot().resolve("tester").unwrap().username, "test");
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_refresh() {
        let shared = SharedDirectory::default();
        let source: Arc<dyn DirectorySource> =
            Arc::new(StaticDirectorySource::new(vec![record("dummy")]));
        let handle = spawn_directory_refresh(shared.clone(), source, Duration::from_secs(60));

        // No refresh before the first full interval has elapsed.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(shared.snapshot().resolve("dummy").is_none());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(shared.snapshot().resolve("dummy").is_some());
        handle.abort();
    }
}
