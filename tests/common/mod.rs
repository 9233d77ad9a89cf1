//! Shared test harness: a router wired to a temp library with fake
//! probing and extraction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use parking_lot::Mutex;
use tempfile::TempDir;

use reelshelf::artifacts::ArtifactExtractor;
use reelshelf::config::Config;
use reelshelf::probe::{MediaMetadata, MediaProber};
use reelshelf::server::{create_router, AppContext};
use reelshelf::{Error, Result};

/// Prober with per-file-name scripted results.
#[derive(Default)]
pub struct FakeProber {
    results: Mutex<HashMap<String, MediaMetadata>>,
    failing: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl FakeProber {
    pub fn script(&self, file_name: &str, metadata: MediaMetadata) {
        self.results.lock().insert(file_name.into(), metadata);
    }

    pub fn fail_for(&self, file_name: &str) {
        self.failing.lock().push(file_name.into());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaProber for FakeProber {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn probe(&self, path: &Path) -> Result<MediaMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.failing.lock().contains(&name) {
            return Err(Error::Probe("scripted probe failure".into()));
        }
        Ok(self
            .results
            .lock()
            .get(&name)
            .cloned()
            .unwrap_or_else(|| MediaMetadata {
                duration: 60.0,
                ..Default::default()
            }))
    }
}

/// Extractor that writes fixed bytes, or fails on demand.
pub struct FakeExtractor {
    pub thumbnail_calls: AtomicUsize,
    pub subtitle_calls: AtomicUsize,
    output: Vec<u8>,
    fail: bool,
}

impl FakeExtractor {
    pub fn writing(output: &[u8]) -> Self {
        Self {
            thumbnail_calls: AtomicUsize::new(0),
            subtitle_calls: AtomicUsize::new(0),
            output: output.to_vec(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::writing(b"")
        }
    }
}

#[async_trait]
impl ArtifactExtractor for FakeExtractor {
    async fn thumbnail(&self, _video: &Path, output: &Path) -> Result<()> {
        self.thumbnail_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::tool("ffmpeg", "scripted failure"));
        }
        std::fs::write(output, &self.output)?;
        Ok(())
    }

    async fn subtitle(&self, _video: &Path, _index: i64, output: &Path) -> Result<()> {
        self.subtitle_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::tool("ffmpeg", "scripted failure"));
        }
        std::fs::write(output, &self.output)?;
        Ok(())
    }
}

pub struct TestHarness {
    pub root: PathBuf,
    pub prober: Arc<FakeProber>,
    pub extractor: Arc<FakeExtractor>,
    pub router: Router,
    _tempdir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_extractor(FakeExtractor::writing(b"artifact"))
    }

    pub fn with_extractor(extractor: FakeExtractor) -> Self {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let root = tempdir.path().join("videos");
        let data = tempdir.path().join("data");
        std::fs::create_dir_all(&root).expect("create root");

        let config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            root: root.clone(),
            data_dir: data,
            static_dir: tempdir.path().join("static"),
        };
        config.ensure_directories().expect("artifact dirs");

        let prober = Arc::new(FakeProber::default());
        let extractor = Arc::new(extractor);
        let ctx = AppContext::new(config, prober.clone(), extractor.clone());

        Self {
            root,
            prober,
            extractor,
            router: create_router(ctx),
            _tempdir: tempdir,
        }
    }

    /// Create a video file with the given contents under the library root,
    /// creating intermediate directories.
    pub fn add_video(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(&path, contents).expect("write video");
        path
    }

    pub fn add_dir(&self, rel: &str) {
        std::fs::create_dir_all(self.root.join(rel)).expect("create dir");
    }
}
