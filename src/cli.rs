//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "reelshelf", about = "Personal video library server", version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Bind address (default 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (default $PORT or 9999)
        #[arg(short, long)]
        port: Option<u16>,

        /// Library root (default $VIDEOS_DIR or ./videos)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Directory for generated thumbnails and subtitles
        /// (default $DATA_DIR or ./data)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Probe a media file and print its metadata
    Probe {
        /// File to inspect
        file: PathBuf,

        /// Print raw JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}
