//! FlashLink - An In-Memory Link Shortener with TTL Expiry
//!
//! This is the main entry point for the FlashLink server.
//! It sets up the registry, the TCP listener, and handles incoming connections.

use flashlink::commands::CommandHandler;
use flashlink::connection::{handle_connection, ConnectionStats};
use flashlink::{Registry, RegistryConfig, DEFAULT_HOST, DEFAULT_PORT};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
    /// Prefix of handed out short links (default: http://<host>:<port>)
    base_url: Option<String>,
    /// Registry tunables
    registry: RegistryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            base_url: None,
            registry: RegistryConfig::default(),
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let mut args = std::env::args().skip(1);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" | "-h" => config.host = required(&arg, args.next()),
                "--port" | "-p" => config.port = parse_number(&arg, args.next()),
                "--base-url" => config.base_url = Some(required(&arg, args.next())),
                "--default-ttl" => {
                    let secs: u64 = parse_number(&arg, args.next());
                    config.registry = config
                        .registry
                        .with_default_ttl(Duration::from_secs(secs));
                }
                "--alias-length" => {
                    let len: usize = parse_number(&arg, args.next());
                    config.registry = config.registry.with_alias_length(len);
                }
                "--sweep-interval-ms" => {
                    let ms: u64 = parse_number(&arg, args.next());
                    config.registry = config
                        .registry
                        .with_sweep_interval(Duration::from_millis(ms));
                }
                "--history-size" => {
                    let size: usize = parse_number(&arg, args.next());
                    config.registry = config.registry.with_history_size(size);
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("FlashLink version {}", flashlink::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", arg);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}", self.bind_address()))
    }
}

fn required(flag: &str, value: Option<String>) -> String {
    value.unwrap_or_else(|| {
        eprintln!("Error: {} requires a value", flag);
        std::process::exit(1);
    })
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<String>) -> T {
    let value = required(flag, value);
    value.parse().unwrap_or_else(|_| {
        eprintln!("Error: invalid number for {}: {}", flag, value);
        std::process::exit(1);
    })
}

fn print_help() {
    println!(
        r#"
FlashLink - An In-Memory Link Shortener with TTL Expiry

USAGE:
    flashlink [OPTIONS]

OPTIONS:
    -h, --host <HOST>              Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>              Port to listen on (default: 6380)
        --base-url <URL>           Prefix of short links (default: http://<host>:<port>)
        --default-ttl <SECS>       TTL when SHORTEN gives none (default: 120)
        --alias-length <N>         Length of generated aliases (default: 6)
        --sweep-interval-ms <MS>   Expiry sweep period (default: 1000)
        --history-size <N>         Access times kept per link (default: 10)
    -v, --version                  Print version information
        --help                     Print this help message

CONNECTING:
    Use redis-cli or any Redis client to connect:
    $ redis-cli -p 6380
    127.0.0.1:6380> SHORTEN https://example.com TTL 300
    "http://127.0.0.1:6380/aB3xYz"
    127.0.0.1:6380> RESOLVE aB3xYz
    "https://example.com"
    127.0.0.1:6380> ANALYTICS aB3xYz
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    // Set up logging; RUST_LOG overrides the INFO default
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // Create the registry (shared across all connections); starts the sweeper
    let registry = Registry::start(config.registry.clone());
    info!(
        default_ttl_secs = config.registry.default_ttl_secs(),
        alias_length = config.registry.alias_length,
        sweep_interval_ms = config.registry.sweep_interval.as_millis() as u64,
        "Registry initialized"
    );

    let stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(
        "FlashLink v{} listening on {}, short links under {}",
        flashlink::VERSION,
        config.bind_address(),
        config.base_url()
    );

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    // Main accept loop
    tokio::select! {
        _ = accept_loop(listener, Arc::clone(&registry), config.base_url(), stats) => {}
        _ = shutdown => {}
    }

    registry.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(
    listener: TcpListener,
    registry: Arc<Registry>,
    base_url: String,
    stats: Arc<ConnectionStats>,
) {
    let handler = CommandHandler::new(registry, base_url);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = handler.clone();
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
