//! snapkv - An In-Memory Cache with Copy-on-Write Snapshots
//!
//! Main entry point for the snapkv server: parses flags, sets up logging,
//! binds the TCP listener and runs the semaphore-gated accept loop.

use snapkv::commands::Cache;
use snapkv::connection::{handle_connection, ConnectionStats};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Semaphore;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: snapkv::DEFAULT_HOST.to_string(),
            port: snapkv::DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    if i + 1 < args.len() {
                        config.host = args[i + 1].clone();
                        i += 2;
                    } else {
                        eprintln!("Error: --host requires a value");
                        std::process::exit(1);
                    }
                }
                "--port" | "-p" => {
                    if i + 1 < args.len() {
                        config.port = args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid port number");
                            std::process::exit(1);
                        });
                        i += 2;
                    } else {
                        eprintln!("Error: --port requires a value");
                        std::process::exit(1);
                    }
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("snapkv version {}", snapkv::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
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
}

fn print_help() {
    println!(
        r#"
snapkv - An In-Memory Cache with Copy-on-Write Snapshots

USAGE:
    snapkv [OPTIONS]

OPTIONS:
    -h, --host <HOST>    Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>    Port to listen on (default: 6379)
    -v, --version        Print version information
        --help           Print this help message

EXAMPLES:
    snapkv                        # Start on 127.0.0.1:6379
    snapkv --port 6380            # Start on port 6380
    snapkv --host 0.0.0.0         # Listen on all interfaces

CONNECTING:
    The protocol is plain text, one command per line:
    $ nc 127.0.0.1 6379
    SET name alice
    OK
    GET name
    alice
    SAVE
    OK
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // The cache shared across all connections; one mutex serializes
    // every command execution.
    let cache = Arc::new(Mutex::new(Cache::new()));
    info!("Cache initialized (64 buckets, LRU eviction enabled)");

    // Admission limiter: at most POOL_SIZE connections served at once.
    let limiter = Arc::new(Semaphore::new(snapkv::POOL_SIZE));

    // Create connection statistics
    let stats = Arc::new(ConnectionStats::new());

    // Bind the TCP listener
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {}", config.bind_address());

    // Set up graceful shutdown
    let shutdown = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received, stopping server...");
    };

    // Main accept loop
    tokio::select! {
        _ = accept_loop(listener, cache, limiter, stats) => {}
        _ = shutdown => {}
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Accepts incoming connections behind the admission semaphore.
///
/// A permit is taken before each accept, so a saturated pool pauses
/// new-connection intake rather than in-flight command processing.
async fn accept_loop(
    listener: TcpListener,
    cache: Arc<Mutex<Cache>>,
    limiter: Arc<Semaphore>,
    stats: Arc<ConnectionStats>,
) {
    loop {
        let permit = limiter
            .clone()
            .acquire_owned()
            .await
            .expect("admission semaphore closed");

        match listener.accept().await {
            Ok((stream, addr)) => {
                let cache = Arc::clone(&cache);
                let stats = Arc::clone(&stats);

                // The task keeps the permit until the client disconnects.
                tokio::spawn(async move {
                    handle_connection(stream, addr, cache, stats, permit).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
