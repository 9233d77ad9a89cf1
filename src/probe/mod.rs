//! Media metadata extraction.
//!
//! [`MediaProber`] is the seam between the library and the external
//! probing tool; [`FfprobeProber`] is the production implementation and
//! tests inject fakes with scripted results.

pub mod ffprobe;

pub use ffprobe::FfprobeProber;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A subtitle stream discovered inside a video file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleTrack {
    /// ISO-639-ish language tag, `"und"` when the stream carries none.
    pub language: String,
    /// Optional human-readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Position within the source file's stream table, used to address
    /// extraction.
    pub stream_index: i64,
    /// Codec name as reported by the probe.
    pub codec: String,
}

/// Metadata extracted from a video file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Duration in seconds, 0 if unknown.
    pub duration: f64,
    /// Video width in pixels, 0 if unknown.
    pub width: u32,
    /// Video height in pixels, 0 if unknown.
    pub height: u32,
    /// Overall bitrate in bits per second, 0 if unknown.
    pub bitrate: i64,
    /// Container format name.
    pub format: String,
    /// Subtitle streams in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtitles: Vec<SubtitleTrack>,
}

impl MediaMetadata {
    /// Find the first subtitle track matching the given language tag.
    pub fn subtitle_for_language(&self, language: &str) -> Option<&SubtitleTrack> {
        self.subtitles.iter().find(|t| t.language == language)
    }
}

/// Capability interface for extracting [`MediaMetadata`] from a file.
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Human-readable prober name, for logs.
    fn name(&self) -> &'static str;

    /// Probe the file at `path`.
    async fn probe(&self, path: &Path) -> Result<MediaMetadata>;
}
