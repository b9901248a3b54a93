//! proxy-trust service and command line.
//!
//! ```text
//! proxy-trust --config trust.toml serve
//! proxy-trust --config trust.toml resolve --peer 192.168.10.10 \
//!     --header "Forwarded: for=12.34.56.78;secret=abc"
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use axum::extract::ConnectInfo;
use axum::http::Request;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use proxy_trust::config::loader::load_config;
use proxy_trust::config::watcher::ConfigWatcher;
use proxy_trust::config::ServiceConfig;
use proxy_trust::http::{HttpServer, TrustReport};
use proxy_trust::observability::{logging, metrics};
use proxy_trust::trust;
use proxy_trust::trust::request::normalize_header_name;

#[derive(Parser)]
#[command(name = "proxy-trust")]
#[command(about = "Resolve which proxies and forwarded headers a request can be trusted through", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the trust inspection endpoint
    Serve,
    /// Resolve a single request given on the command line
    Resolve {
        /// Address of the directly connected peer
        #[arg(long)]
        peer: IpAddr,

        /// Request header as "Name: value" (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    match cli.command {
        Commands::Serve => serve(config, cli.config).await,
        Commands::Resolve { peer, headers } => resolve(&config, peer, &headers),
    }
}

async fn serve(config: ServiceConfig, path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging(&config.observability.log_level);
    tracing::info!("proxy-trust v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        proxies = config.trusted_proxies.proxies.len(),
        presets = config.trusted_proxies.presets.len(),
        trust_last_proxies = config.trusted_proxies.trust_last_proxies,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // the watcher stops when dropped, so it lives until the server returns
    let (_watcher, config_updates) = match path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(&path, &config);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    HttpServer::new(config).run(listener, config_updates).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn resolve(config: &ServiceConfig, peer: IpAddr, headers: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = Request::builder();
    for header in headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| format!("header '{header}' is not in 'Name: value' form"))?;
        builder = builder.header(normalize_header_name(name), value.trim());
    }

    let mut request = builder.body(())?;
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::new(peer, 0)));

    let (policy, resolved) = trust::evaluate(&config.trusted_proxies, &mut request);
    let report = TrustReport::new(&request, policy, resolved);

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
