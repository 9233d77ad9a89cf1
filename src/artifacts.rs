//! On-demand derived artifacts: thumbnails and extracted subtitles.
//!
//! The filesystem is the cache. An artifact is generated at most once per
//! source file, written to a temp file in the destination directory and
//! renamed into place so readers never observe a partial artifact.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::command::ToolCommand;
use crate::error::{Error, Result};
use crate::metadata::MetadataCache;

/// Seek offset for the thumbnail frame, in seconds.
pub const THUMBNAIL_SEEK_SECS: u32 = 10;
/// Thumbnail width in pixels; height scales to keep aspect.
pub const THUMBNAIL_WIDTH: u32 = 320;
/// Served when thumbnail generation fails or the source is missing.
pub const PLACEHOLDER_THUMBNAIL: &str = "/static/img/no-preview.jpg";

/// Capability interface for producing derived artifacts from a video file.
#[async_trait]
pub trait ArtifactExtractor: Send + Sync {
    /// Write a single-frame thumbnail of `video` to `output`.
    async fn thumbnail(&self, video: &Path, output: &Path) -> Result<()>;

    /// Extract the subtitle stream at `stream_index` from `video` to
    /// `output` as WebVTT.
    async fn subtitle(&self, video: &Path, stream_index: i64, output: &Path) -> Result<()>;
}

/// Extractor backed by the `ffmpeg` CLI.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    ffmpeg_path: PathBuf,
}

impl FfmpegExtractor {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    /// Create an extractor that finds ffmpeg on `PATH`.
    pub fn from_path() -> Option<Self> {
        which::which("ffmpeg").ok().map(|p| Self { ffmpeg_path: p })
    }
}

#[async_trait]
impl ArtifactExtractor for FfmpegExtractor {
    async fn thumbnail(&self, video: &Path, output: &Path) -> Result<()> {
        ToolCommand::new(self.ffmpeg_path.clone())
            .args(["-v", "error"])
            .args(["-ss", &THUMBNAIL_SEEK_SECS.to_string()])
            .arg("-i")
            .arg(video.to_string_lossy())
            .args(["-frames:v", "1"])
            .args(["-q:v", "2"])
            .args(["-vf", &format!("scale={THUMBNAIL_WIDTH}:-1")])
            .arg("-y")
            .arg(output.to_string_lossy())
            .execute()
            .await?;
        Ok(())
    }

    async fn subtitle(&self, video: &Path, stream_index: i64, output: &Path) -> Result<()> {
        ToolCommand::new(self.ffmpeg_path.clone())
            .arg("-i")
            .arg(video.to_string_lossy())
            .args(["-map", &format!("0:{stream_index}")])
            .args(["-f", "webvtt"])
            .args(["-c:s", "webvtt"])
            .arg("-y")
            .arg(output.to_string_lossy())
            .execute()
            .await?;
        Ok(())
    }
}

/// Filesystem-backed store of generated thumbnails and subtitles.
pub struct ArtifactStore {
    thumbnails_dir: PathBuf,
    subtitles_dir: PathBuf,
    extractor: Arc<dyn ArtifactExtractor>,
}

impl ArtifactStore {
    pub fn new(
        thumbnails_dir: PathBuf,
        subtitles_dir: PathBuf,
        extractor: Arc<dyn ArtifactExtractor>,
    ) -> Self {
        Self {
            thumbnails_dir,
            subtitles_dir,
            extractor,
        }
    }

    /// Cache path for the thumbnail of `video`. The key is the full file
    /// name (extension included) so `a.mp4` and `a.mkv` get distinct
    /// thumbnails.
    pub fn thumbnail_path(&self, video: &Path) -> PathBuf {
        let file_name = video
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.thumbnails_dir.join(format!("{file_name}.jpg"))
    }

    /// Cache path for the `lang` subtitle of `video`.
    pub fn subtitle_path(&self, video: &Path, lang: &str) -> PathBuf {
        let stem = video
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.subtitles_dir.join(format!("{stem}_{lang}.vtt"))
    }

    /// Ensure a thumbnail exists for `video`, generating it on first use.
    ///
    /// Returns `None` when the source is missing or generation fails; the
    /// caller falls back to [`PLACEHOLDER_THUMBNAIL`]. Failures are logged
    /// but never surface as request errors.
    pub async fn ensure_thumbnail(&self, video: &Path) -> Option<PathBuf> {
        if tokio::fs::metadata(video).await.is_err() {
            tracing::warn!(video = %video.display(), "thumbnail source missing");
            return None;
        }

        let target = self.thumbnail_path(video);
        if tokio::fs::metadata(&target).await.is_ok() {
            return Some(target);
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.thumbnails_dir).await {
            tracing::warn!(error = %e, "cannot create thumbnails directory");
            return None;
        }

        match self.generate(video, &target, None).await {
            Ok(()) => Some(target),
            Err(e) => {
                tracing::warn!(
                    video = %video.display(),
                    error = %e,
                    "thumbnail generation failed, serving placeholder"
                );
                None
            }
        }
    }

    /// Ensure a `lang` subtitle file exists for `video`.
    ///
    /// Unlike thumbnails there is no placeholder to degrade to, so failures
    /// propagate: no matching track is [`Error::NotFound`], extraction
    /// problems are [`Error::Tool`].
    pub async fn ensure_subtitle(
        &self,
        video: &Path,
        lang: &str,
        cache: &MetadataCache,
    ) -> Result<PathBuf> {
        let target = self.subtitle_path(video, lang);
        if let Ok(meta) = tokio::fs::metadata(&target).await {
            if meta.len() > 0 {
                return Ok(target);
            }
        }

        let metadata = cache.get(video).await?;
        let track = metadata
            .subtitle_for_language(lang)
            .ok_or_else(|| Error::not_found("subtitle track", lang))?;

        tokio::fs::create_dir_all(&self.subtitles_dir).await?;
        self.generate(video, &target, Some(track.stream_index))
            .await?;
        Ok(target)
    }

    /// Run the extractor against a temp file, then rename into place.
    /// `stream_index` selects subtitle extraction; `None` means thumbnail.
    async fn generate(
        &self,
        video: &Path,
        target: &Path,
        stream_index: Option<i64>,
    ) -> Result<()> {
        let dir = target
            .parent()
            .ok_or_else(|| Error::Internal("artifact target has no parent".into()))?;
        let suffix = target
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let tmp = tempfile::Builder::new()
            .prefix(".artifact-")
            .suffix(&suffix)
            .tempfile_in(dir)?;

        match stream_index {
            Some(index) => {
                self.extractor
                    .subtitle(video, index, tmp.path())
                    .await?
            }
            None => self.extractor.thumbnail(video, tmp.path()).await?,
        }

        // A tool can exit zero and still write nothing useful (e.g. a
        // stream with no cues). Treat an empty output as failure; the temp
        // file is cleaned up on drop.
        let written = tokio::fs::metadata(tmp.path()).await?;
        if written.len() == 0 {
            return Err(Error::tool(
                "ffmpeg",
                format!("produced empty output for {}", video.display()),
            ));
        }

        tmp.persist(target).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::metadata::MetadataCache;
    use crate::probe::{MediaMetadata, MediaProber, SubtitleTrack};

    /// Extractor that writes scripted bytes and counts invocations.
    struct FakeExtractor {
        thumbnail_calls: AtomicUsize,
        subtitle_calls: AtomicUsize,
        output: Vec<u8>,
        fail: bool,
    }

    impl FakeExtractor {
        fn writing(output: &[u8]) -> Self {
            Self {
                thumbnail_calls: AtomicUsize::new(0),
                subtitle_calls: AtomicUsize::new(0),
                output: output.to_vec(),
                fail: false,
            }
        }

        fn failing() -> Self {
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

    struct OneTrackProber;

    #[async_trait]
    impl MediaProber for OneTrackProber {
        fn name(&self) -> &'static str {
            "one-track"
        }

        async fn probe(&self, _path: &Path) -> Result<MediaMetadata> {
            Ok(MediaMetadata {
                duration: 10.0,
                subtitles: vec![SubtitleTrack {
                    language: "eng".into(),
                    title: None,
                    stream_index: 2,
                    codec: "subrip".into(),
                }],
                ..Default::default()
            })
        }
    }

    fn store(data: &Path, extractor: Arc<dyn ArtifactExtractor>) -> ArtifactStore {
        ArtifactStore::new(data.join("thumbnails"), data.join("subtitles"), extractor)
    }

    fn cache() -> MetadataCache {
        MetadataCache::with_ttl(Arc::new(OneTrackProber), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn thumbnail_generated_once_then_reused() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("movie.mp4");
        std::fs::write(&video, b"video").unwrap();

        let extractor = Arc::new(FakeExtractor::writing(b"jpegdata"));
        let store = store(dir.path(), extractor.clone());

        let first = store.ensure_thumbnail(&video).await.unwrap();
        let second = store.ensure_thumbnail(&video).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.file_name().unwrap(), "movie.mp4.jpg");
        assert_eq!(std::fs::read(&first).unwrap(), b"jpegdata");
        assert_eq!(extractor.thumbnail_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn thumbnail_failure_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("movie.mp4");
        std::fs::write(&video, b"video").unwrap();

        let store = store(dir.path(), Arc::new(FakeExtractor::failing()));
        assert!(store.ensure_thumbnail(&video).await.is_none());
        // No artifact and no leftover temp file.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("thumbnails"))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn missing_source_yields_none_without_invoking_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = Arc::new(FakeExtractor::writing(b"jpegdata"));
        let store = store(dir.path(), extractor.clone());

        let result = store.ensure_thumbnail(&dir.path().join("gone.mp4")).await;
        assert!(result.is_none());
        assert_eq!(extractor.thumbnail_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn subtitle_extracted_for_known_track() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("movie.mp4");
        std::fs::write(&video, b"video").unwrap();

        let extractor = Arc::new(FakeExtractor::writing(b"WEBVTT\n"));
        let store = store(dir.path(), extractor.clone());
        let cache = cache();

        let path = store.ensure_subtitle(&video, "eng", &cache).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "movie_eng.vtt");
        assert_eq!(std::fs::read(&path).unwrap(), b"WEBVTT\n");

        // Second request is served from disk.
        store.ensure_subtitle(&video, "eng", &cache).await.unwrap();
        assert_eq!(extractor.subtitle_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn subtitle_unknown_language_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("movie.mp4");
        std::fs::write(&video, b"video").unwrap();

        let store = store(dir.path(), Arc::new(FakeExtractor::writing(b"WEBVTT\n")));
        let err = store
            .ensure_subtitle(&video, "jpn", &cache())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn subtitle_empty_output_is_an_error_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("movie.mp4");
        std::fs::write(&video, b"video").unwrap();

        let store = store(dir.path(), Arc::new(FakeExtractor::writing(b"")));
        let err = store
            .ensure_subtitle(&video, "eng", &cache())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Tool { .. }));
        assert!(!store.subtitle_path(&video, "eng").exists());
    }
}
