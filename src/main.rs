//! linekv server entry point.
//!
//! Parses the command line, sets up logging, binds the listener and hands it
//! to the accept loop.

use linekv::connection::ConnectionStats;
use linekv::storage::Store;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

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
            host: linekv::DEFAULT_HOST.to_string(),
            port: linekv::DEFAULT_PORT,
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
                "--host" | "-h" => match args.get(i + 1) {
                    Some(host) => {
                        config.host = host.clone();
                        i += 2;
                    }
                    None => {
                        eprintln!("Error: --host requires a value");
                        std::process::exit(1);
                    }
                },
                "--port" | "-p" => match args.get(i + 1) {
                    Some(port) => {
                        config.port = port.parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid port number");
                            std::process::exit(1);
                        });
                        i += 2;
                    }
                    None => {
                        eprintln!("Error: --port requires a value");
                        std::process::exit(1);
                    }
                },
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("linekv version {}", linekv::VERSION);
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
linekv - A Minimal Network Key-Value Store

USAGE:
    linekv [OPTIONS]

OPTIONS:
    -h, --host <HOST>    Host to bind to (default: {host})
    -p, --port <PORT>    Port to listen on (default: {port})
    -v, --version        Print version information
        --help           Print this help message

LOGGING:
    Set RUST_LOG to change verbosity (default: info), e.g. RUST_LOG=debug

CONNECTING:
    $ redis-cli -p {port}
    127.0.0.1:{port}> SET color blue
    OK
    127.0.0.1:{port}> GET color
    "blue"
"#,
        host = linekv::DEFAULT_HOST,
        port = linekv::DEFAULT_PORT,
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    info!("Server started (linekv v{})", linekv::VERSION);

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Accepting connections at: {}", listener.local_addr()?);

    // Shared by every connection for the life of the process
    let store = Arc::new(Store::new());
    let stats = Arc::new(ConnectionStats::new());

    linekv::server::serve(listener, store, stats).await;
    Ok(())
}
