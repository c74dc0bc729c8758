mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use lf_core::config::Config;
use lf_core::MuxerVariant;
use std::path::Path;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    variant: Option<MuxerVariant>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = Config::load_or_default(config_path);

    // Override config values from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(variant) = variant {
        config.muxer.variant = variant;
    }

    tracing::info!("Starting liveforged");
    tracing::info!(
        "Serving {} ({}) on {}:{}",
        config.muxer.playlist_name,
        config.muxer.variant,
        config.server.host,
        config.server.port
    );

    lf_server::start(config).await?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "liveforged=trace,lf_server=trace,lf_media=trace,lf_core=debug,tower_http=debug"
                .to_string()
        } else {
            "liveforged=debug,lf_server=debug,lf_media=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Serve {
            host,
            port,
            variant,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, variant, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("liveforged {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(path) => {
            println!("Validating {}", path.display());
            Config::load(path)?
        }
        None => {
            println!("No config file given; validating defaults");
            Config::default()
        }
    };

    println!("Variant: {}", config.muxer.variant);
    println!("Playlist: {}", config.muxer.playlist_name);
    println!("Segment count: {}", config.muxer.segment_count);
    println!(
        "Ingest: {}",
        if config.ingest.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("\nConfiguration is valid.");
    } else {
        println!("\nWarnings:");
        for warning in &warnings {
            println!("  - {warning}");
        }
    }

    if let Some(path) = path {
        tracing::debug!("Effective config for {}:", path.display());
        tracing::debug!("{}", serde_json::to_string_pretty(&config)?);
    }

    Ok(())
}
