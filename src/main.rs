//! ArcGIS Services-Directory façade
//!
//! Serves crawled directory views, layer downloads, and mirrored clone routes.

use anyhow::{Context, Result};
use arcgis_facade::{
    arcgis::{ArcGisClient, LayerType},
    clone::build_clone_router,
    config::{CloneConfig, Config, LogFormat, LogLevel, LoggingConfig},
    discovery::crawl_catalogue,
    http::{AppState, HttpServer},
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arcgis-facade")]
#[command(about = "REST façade and mirror for ArcGIS Services Directories")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "facade.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen address
        #[arg(short, long)]
        listen: Option<String>,

        /// Extra clone to mount, as PREFIX=URL
        #[arg(long = "clone", value_name = "PREFIX=URL")]
        clones: Vec<String>,
    },

    /// Crawl a services directory and print its layer catalogue
    Crawl {
        /// Services directory URL
        url: String,

        /// ArcGIS token
        #[arg(short, long)]
        token: Option<String>,

        /// Only list layers of this type
        #[arg(long = "type", value_enum)]
        layer_type: Option<CliLayerType>,
    },

    /// Write an example configuration
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliLayerType {
    /// Feature Layer
    Feature,
    /// Raster Layer
    Raster,
}

impl CliLayerType {
    fn type_name(self) -> &'static str {
        match self {
            Self::Feature => LayerType::FEATURE_LAYER,
            Self::Raster => LayerType::RASTER_LAYER,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    init_logging(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Serve { listen, clones } => serve(config, listen, clones).await,
        Commands::Crawl {
            url,
            token,
            layer_type,
        } => crawl_directory(config, url, token, layer_type).await,
        Commands::Init { path } => init_config(path),
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig, verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => logging.level,
        1 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.filter_directive()))
        .context("Invalid log filter")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match logging.format {
        LogFormat::Text => builder.with_target(false).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))
}

async fn serve(mut config: Config, listen: Option<String>, extra: Vec<String>) -> Result<()> {
    if let Some(addr) = listen {
        config.http.listen_addr = addr;
    }
    for spec in extra {
        let clone = CloneConfig::parse_spec(&spec)
            .with_context(|| format!("Invalid --clone '{}', expected PREFIX=URL", spec))?;
        config.clones.push(clone);
    }
    config.validate()?;

    let client = Arc::new(ArcGisClient::new(config.arcgis.client_config())?);
    let crawl = config.arcgis.crawl_options();

    let mut tables = Vec::with_capacity(config.clones.len());
    for clone in &config.clones {
        info!("Building clone of {} at {}", clone.url, clone.prefix);
        let table = build_clone_router(client.clone(), client.clone(), clone.options(crawl))
            .await
            .with_context(|| format!("Failed to build clone of {}", clone.url))?;
        if !table.skipped().is_empty() {
            warn!(
                "Clone at {} skipped {} layer(s)",
                table.prefix(),
                table.skipped().len()
            );
        }
        info!("Clone at {} serves {} layer(s)", table.prefix(), table.routes().len());
        tables.push(table);
    }

    let app_state = AppState {
        directory: client.clone(),
        layers: client,
        crawl,
    };

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let server = HttpServer::new(config.http.clone(), app_state, tables);
    let server_handle = tokio::spawn(server.run(shutdown_rx));

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = wait_for_sigterm() => {
            info!("Received SIGTERM, shutting down");
        }
    }
    let _ = shutdown_tx.send(());

    match server_handle.await {
        Ok(Ok(())) => info!("HTTP server shut down cleanly"),
        Ok(Err(e)) => {
            error!("HTTP server failed: {}", e);
            return Err(e);
        }
        Err(e) => anyhow::bail!("HTTP server task panicked: {}", e),
    }

    Ok(())
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}

async fn crawl_directory(
    config: Config,
    url: String,
    token: Option<String>,
    layer_type: Option<CliLayerType>,
) -> Result<()> {
    let client = ArcGisClient::new(config.arcgis.client_config())?;
    let catalogue = crawl_catalogue(
        &client,
        &url,
        token.as_deref(),
        config.arcgis.crawl_options(),
        layer_type.map(CliLayerType::type_name),
    )
    .await?;

    info!("Found {} layer(s) under {}", catalogue.len(), url);
    println!("{}", serde_json::to_string_pretty(&catalogue)?);
    Ok(())
}

fn init_config(path: PathBuf) -> Result<()> {
    let config_path = path.join("facade.toml");
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    let config = Config::default();
    let toml_content = format!(
        r#"# ArcGIS façade configuration

[http]
listen_addr = "{}"
cors_enabled = {}

[arcgis]
timeout_secs = {}
connect_timeout_secs = {}
max_redirects = {}
max_crawl_depth = {}

[[clones]]
url = "https://maps1.vcgov.org/arcgis/rest/services"
prefix = "/vcgov"

[logging]
format = "text"
level = "info"
"#,
        config.http.listen_addr,
        config.http.cors_enabled,
        config.arcgis.timeout_secs,
        config.arcgis.connect_timeout_secs,
        config.arcgis.max_redirects,
        config.arcgis.max_crawl_depth,
    );

    std::fs::create_dir_all(&path)?;
    std::fs::write(&config_path, toml_content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created configuration at: {}", config_path.display());
    Ok(())
}
