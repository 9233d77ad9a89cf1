//! FFprobe-based [`MediaProber`] implementation.
//!
//! Shells out to `ffprobe -v quiet -print_format json -show_format
//! -show_streams` and maps the JSON output into [`MediaMetadata`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::command::ToolCommand;
use crate::error::{Error, Result};
use crate::probe::{MediaMetadata, MediaProber, SubtitleTrack};

/// Per-invocation probe timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    /// Path to the ffprobe binary.
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self { ffprobe_path }
    }

    /// Create a prober that finds ffprobe on `PATH`.
    pub fn from_path() -> Option<Self> {
        which::which("ffprobe")
            .ok()
            .map(|p| Self { ffprobe_path: p })
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    async fn probe(&self, path: &Path) -> Result<MediaMetadata> {
        let output = ToolCommand::new(self.ffprobe_path.clone())
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path.to_string_lossy())
            .timeout(PROBE_TIMEOUT)
            .execute()
            .await
            .map_err(|e| Error::Probe(e.to_string()))?;

        let ff: FfprobeOutput = serde_json::from_str(&output.stdout)
            .map_err(|e| Error::Probe(format!("ffprobe JSON parse error: {e}")))?;

        Ok(parse_ffprobe_output(ff))
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    index: i64,
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    language: Option<String>,
    title: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn parse_ffprobe_output(output: FfprobeOutput) -> MediaMetadata {
    let duration = output
        .format
        .duration
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    let bitrate = output
        .format
        .bit_rate
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0);

    let format = output.format.format_name.unwrap_or_default();

    let mut metadata = MediaMetadata {
        duration,
        bitrate,
        format,
        ..Default::default()
    };

    for stream in output.streams {
        match stream.codec_type.as_deref() {
            Some("video") => {
                metadata.width = stream.width.unwrap_or(0);
                metadata.height = stream.height.unwrap_or(0);
            }
            Some("subtitle") => {
                metadata.subtitles.push(SubtitleTrack {
                    language: stream
                        .tags
                        .language
                        .filter(|l| !l.is_empty())
                        .unwrap_or_else(|| "und".into()),
                    title: stream.tags.title,
                    stream_index: stream.index,
                    codec: stream.codec_name.unwrap_or_default(),
                });
            }
            _ => {}
        }
    }

    metadata
}
