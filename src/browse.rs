//! Directory listing with concurrent metadata enrichment.
//!
//! [`DirectoryLister`] enumerates the direct children of a validated
//! directory, fans out metadata probes for the video entries, and returns
//! a deterministically sorted listing (directories first, then videos,
//! case-insensitive by name within each group).

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tokio::task::JoinSet;

use crate::error::{Error, Result};
use crate::metadata::MetadataCache;
use crate::paths::{is_video_file, PathGuard};

/// Kind of a listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    Video,
}

/// One record in a directory listing. Constructed fresh per request,
/// immutable once returned.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// File or directory name.
    pub name: String,
    /// Path relative to the library root, for use in follow-up requests.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Byte size; zero (and omitted) for directories.
    #[serde(skip_serializing_if = "is_zero_u64")]
    pub size: u64,
    /// Duration in seconds; zero (and omitted) when unknown.
    #[serde(skip_serializing_if = "is_zero_f64")]
    pub duration: f64,
    /// Last-modified timestamp, RFC 3339.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero_u64(n: &u64) -> bool {
    *n == 0
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero_f64(n: &f64) -> bool {
    *n == 0.0
}

fn modified_rfc3339(metadata: &std::fs::Metadata) -> Option<String> {
    metadata
        .modified()
        .ok()
        .map(|t| DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Secs, true))
}

struct VideoCandidate {
    name: String,
    full_path: PathBuf,
    rel_path: String,
    size: u64,
    updated_at: Option<String>,
}

/// Lists directories under the library root, enriching video entries with
/// cached metadata.
pub struct DirectoryLister {
    guard: Arc<PathGuard>,
    cache: Arc<MetadataCache>,
}

impl DirectoryLister {
    pub fn new(guard: Arc<PathGuard>, cache: Arc<MetadataCache>) -> Self {
        Self { guard, cache }
    }

    /// List the direct children of `requested` (a root-relative path).
    ///
    /// Hidden entries and non-video files are skipped. Metadata retrieval
    /// for video entries runs concurrently; a probe failure degrades that
    /// entry's duration to zero instead of failing the listing. May
    /// populate the metadata cache as a side effect.
    pub async fn list(&self, requested: &str) -> Result<Vec<Entry>> {
        let dir = self.guard.resolve(requested)?;

        let dir_meta = tokio::fs::metadata(&dir)
            .await
            .map_err(|_| Error::not_found("directory", requested))?;
        if !dir_meta.is_dir() {
            return Err(Error::Validation(format!(
                "not a directory: {requested}"
            )));
        }

        let mut read_dir = tokio::fs::read_dir(&dir)
            .await
            .map_err(|_| Error::not_found("directory", requested))?;

        let mut entries: Vec<Entry> = Vec::new();
        let mut videos: Vec<VideoCandidate> = Vec::new();

        while let Some(child) = read_dir.next_entry().await? {
            let name = child.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let Ok(meta) = child.metadata().await else {
                continue;
            };

            let full_path = child.path();
            let rel_path = match self.guard.relativize(&full_path) {
                Ok(rel) => rel.to_string_lossy().into_owned(),
                Err(_) => continue,
            };

            if meta.is_dir() {
                entries.push(Entry {
                    name,
                    path: rel_path,
                    kind: EntryKind::Directory,
                    size: 0,
                    duration: 0.0,
                    updated_at: modified_rfc3339(&meta),
                });
            } else if is_video_file(&full_path) {
                videos.push(VideoCandidate {
                    name,
                    full_path,
                    rel_path,
                    size: meta.len(),
                    updated_at: modified_rfc3339(&meta),
                });
            }
        }

        // Fan out metadata retrieval across all video entries; the listing
        // waits for every probe before sorting.
        let mut tasks = JoinSet::new();
        for candidate in videos {
            let cache = Arc::clone(&self.cache);
            tasks.spawn(async move {
                let duration = match cache.get(&candidate.full_path).await {
                    Ok(meta) => meta.duration,
                    Err(e) => {
                        tracing::debug!(
                            path = %candidate.full_path.display(),
                            error = %e,
                            "metadata probe failed, degrading duration to 0"
                        );
                        0.0
                    }
                };
                Entry {
                    name: candidate.name,
                    path: candidate.rel_path,
                    kind: EntryKind::Video,
                    size: candidate.size,
                    duration,
                    updated_at: candidate.updated_at,
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let entry = joined
                .map_err(|e| Error::Internal(format!("listing task failed: {e}")))?;
            entries.push(entry);
        }

        // Deterministic order regardless of fan-out completion:
        // directories first, then case-insensitive by name.
        entries.sort_by(|a, b| {
            let a_is_file = a.kind != EntryKind::Directory;
            let b_is_file = b.kind != EntryKind::Directory;
            a_is_file
                .cmp(&b_is_file)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });

        Ok(entries)
    }
}
