//! Time-bounded metadata cache shared across requests.
//!
//! Maps an absolute file path to its probed [`MediaMetadata`]. Entries
//! expire after [`METADATA_TTL`] and are recomputed lazily on the next
//! access. Probe failures are never cached, so a transient failure is
//! retried rather than pinned.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::error::Result;
use crate::probe::{MediaMetadata, MediaProber};

/// How long a cached metadata entry stays valid.
pub const METADATA_TTL: Duration = Duration::from_secs(60 * 60);

struct CacheEntry {
    metadata: MediaMetadata,
    stored_at: Instant,
}

/// Shared, TTL-bounded cache in front of a [`MediaProber`].
///
/// Constructed once at process start and handed to request handlers by
/// reference. Concurrent misses for the same key may each invoke the
/// probe; last write wins, which is harmless because probe results are
/// deterministic for a given file.
pub struct MetadataCache {
    prober: Arc<dyn MediaProber>,
    ttl: Duration,
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl MetadataCache {
    /// Create a cache with the default [`METADATA_TTL`].
    pub fn new(prober: Arc<dyn MediaProber>) -> Self {
        Self::with_ttl(prober, METADATA_TTL)
    }

    /// Create a cache with an explicit TTL (tests use short ones).
    pub fn with_ttl(prober: Arc<dyn MediaProber>, ttl: Duration) -> Self {
        Self {
            prober,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get metadata for `path`, probing on miss or expiry.
    pub async fn get(&self, path: &Path) -> Result<MediaMetadata> {
        {
            let entries = self.entries.read();
            if let Some(entry) = entries.get(path) {
                if entry.stored_at.elapsed() < self.ttl {
                    return Ok(entry.metadata.clone());
                }
            }
        }

        let metadata = self.prober.probe(path).await?;

        self.entries.write().insert(
            path.to_path_buf(),
            CacheEntry {
                metadata: metadata.clone(),
                stored_at: Instant::now(),
            },
        );

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::Error;

    struct CountingProber {
        calls: AtomicUsize,
        fail_first: AtomicUsize,
    }

    impl CountingProber {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first: AtomicUsize::new(0),
            }
        }

        fn failing_once() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first: AtomicUsize::new(1),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MediaProber for CountingProber {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn probe(&self, _path: &Path) -> Result<MediaMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first.load(Ordering::SeqCst) > 0 {
                self.fail_first.fetch_sub(1, Ordering::SeqCst);
                return Err(Error::Probe("scripted failure".into()));
            }
            Ok(MediaMetadata {
                duration: 12.0,
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn second_get_within_ttl_hits_cache() {
        let prober = Arc::new(CountingProber::new());
        let cache = MetadataCache::new(prober.clone());
        let path = Path::new("/videos/a.mp4");

        let first = cache.get(path).await.unwrap();
        let second = cache.get(path).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(prober.calls(), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_reprobed() {
        let prober = Arc::new(CountingProber::new());
        let cache = MetadataCache::with_ttl(prober.clone(), Duration::ZERO);
        let path = Path::new("/videos/a.mp4");

        cache.get(path).await.unwrap();
        cache.get(path).await.unwrap();

        assert_eq!(prober.calls(), 2);
    }

    #[tokio::test]
    async fn distinct_keys_are_cached_independently() {
        let prober = Arc::new(CountingProber::new());
        let cache = MetadataCache::new(prober.clone());

        cache.get(Path::new("/videos/a.mp4")).await.unwrap();
        cache.get(Path::new("/videos/b.mp4")).await.unwrap();
        cache.get(Path::new("/videos/a.mp4")).await.unwrap();

        assert_eq!(prober.calls(), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let prober = Arc::new(CountingProber::failing_once());
        let cache = MetadataCache::new(prober.clone());
        let path = Path::new("/videos/a.mp4");

        assert!(cache.get(path).await.is_err());
        // The failure was not pinned; the retry probes again and succeeds.
        assert!(cache.get(path).await.is_ok());
        assert_eq!(prober.calls(), 2);
    }
}
