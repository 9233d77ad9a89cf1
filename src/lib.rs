//! reelshelf: a personal video library server.
//!
//! Serves a directory tree of video files over HTTP: JSON and HTML
//! directory listings enriched with probed metadata, byte-range streaming,
//! and on-demand thumbnail/subtitle generation backed by ffmpeg.

pub mod artifacts;
pub mod browse;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod metadata;
pub mod paths;
pub mod probe;
pub mod server;

pub use error::{Error, Result};
