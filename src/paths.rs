//! Path containment and file-type tables.
//!
//! [`PathGuard`] resolves user-supplied relative paths against the fixed
//! library root and rejects anything that would escape it. The extension
//! and MIME tables below are used by the lister and the streamer.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// File extensions served as videos, lowercase.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv", "avi", "mov", "m4v"];

/// Check if a path has a recognized video file extension (case-insensitive).
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Guess the MIME type from the file extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// Resolves user-supplied paths against a fixed root directory.
///
/// Every path handed to the lister or the streamer goes through
/// [`PathGuard::resolve`] first; a path that would escape the root fails
/// with [`Error::InvalidPath`] and callers must treat that as fatal to the
/// request.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Create a guard for the given absolute root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The library root all resolved paths live under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a user-supplied path to an absolute path under the root.
    ///
    /// Empty input or `/` maps to the root itself. `.` and `..` segments
    /// are collapsed lexically; a `..` that would climb above the root is
    /// rejected. Containment is checked component-wise, so a sibling
    /// directory sharing a string prefix with the root (e.g. `/videos2`
    /// next to `/videos`) can never pass.
    pub fn resolve(&self, user_path: &str) -> Result<PathBuf> {
        if user_path.is_empty() || user_path == "/" {
            return Ok(self.root.clone());
        }

        let mut stack: Vec<&OsStr> = Vec::new();
        for component in Path::new(user_path).components() {
            match component {
                Component::Normal(segment) => stack.push(segment),
                Component::ParentDir => {
                    if stack.pop().is_none() {
                        return Err(Error::InvalidPath);
                    }
                }
                Component::CurDir | Component::RootDir => {}
                Component::Prefix(_) => return Err(Error::InvalidPath),
            }
        }

        let mut resolved = self.root.clone();
        resolved.extend(&stack);

        if !resolved.starts_with(&self.root) {
            return Err(Error::InvalidPath);
        }
        Ok(resolved)
    }

    /// The root-relative form of an already-resolved path, for API output.
    pub fn relativize<'a>(&self, absolute: &'a Path) -> Result<&'a Path> {
        absolute
            .strip_prefix(&self.root)
            .map_err(|_| Error::InvalidPath)
    }
}
