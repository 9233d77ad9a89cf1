use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use reelshelf::artifacts::FfmpegExtractor;
use reelshelf::cli::{Cli, Commands};
use reelshelf::config::Config;
use reelshelf::probe::{FfprobeProber, MediaProber};
use reelshelf::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if std::env::var("RUST_LOG").is_err() {
        let filter = if cli.verbose {
            "reelshelf=debug,tower_http=debug"
        } else {
            "reelshelf=info"
        };
        std::env::set_var("RUST_LOG", filter);
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match cli.command {
        Commands::Serve {
            host,
            port,
            root,
            data_dir,
        } => {
            let config = Config::resolve(root, port, host, data_dir)?;
            let prober = FfprobeProber::from_path()
                .context("ffprobe not found on PATH (install ffmpeg)")?;
            let extractor = FfmpegExtractor::from_path()
                .context("ffmpeg not found on PATH (install ffmpeg)")?;
            server::start(config, Arc::new(prober), Arc::new(extractor)).await
        }
        Commands::Probe { file, json } => {
            let prober = FfprobeProber::from_path()
                .context("ffprobe not found on PATH (install ffmpeg)")?;
            let metadata = prober
                .probe(&file)
                .await
                .with_context(|| format!("probing {}", file.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&metadata)?);
            } else {
                println!("format:   {}", metadata.format);
                println!("duration: {:.1}s", metadata.duration);
                println!("size:     {}x{}", metadata.width, metadata.height);
                println!("bitrate:  {} b/s", metadata.bitrate);
                if metadata.subtitles.is_empty() {
                    println!("subtitles: none");
                } else {
                    println!("subtitles:");
                    for track in &metadata.subtitles {
                        println!(
                            "  [{}] {} ({}){}",
                            track.stream_index,
                            track.language,
                            track.codec,
                            track
                                .title
                                .as_deref()
                                .map(|t| format!(" - {t}"))
                                .unwrap_or_default()
                        );
                    }
                }
            }
            Ok(())
        }
    }
}
