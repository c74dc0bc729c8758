use clap::{Parser, Subcommand};
use lf_core::MuxerVariant;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "liveforged")]
#[command(author, version, about = "Live HLS and Low-Latency HLS playlist server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the playlist server and ingest endpoints
    Serve {
        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Delivery variant: mpeg_ts, fmp4 or low_latency
        #[arg(long)]
        variant: Option<MuxerVariant>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
