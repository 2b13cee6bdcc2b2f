//! Chat hub round trip.
//!
//! Demonstrates:
//! - Building a client with the builder
//! - Running the handshake with `init`
//! - Invoking a hub method with `send`
//! - Reading server messages until Ctrl+C
//!
//! Usage:
//!   cargo run --example chat -- localhost:8080
//!   cargo run --example chat -- localhost:8080 --http --debug

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use signalr_client::{Client, HubMessage, Scheme};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_HOST: &str = "localhost:8080";
const ENDPOINT: &str = "/signalr";
const PROTOCOL: &str = "1.5";
const HUB: &str = "chathub";

// ============================================================================
// Args
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    host: String,
    http: bool,
    debug: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self {
            host: args
                .iter()
                .find(|a| !a.starts_with("--"))
                .cloned()
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            http: args.iter().any(|a| a == "--http"),
            debug: args.iter().any(|a| a == "--debug"),
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "signalr_client=debug"
    } else {
        "signalr_client=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== SignalR chat ===\n");

    let scheme = if args.http { Scheme::Http } else { Scheme::Https };
    let connection_data = format!(r#"[{{"name":"{HUB}"}}]"#);

    let client = Client::builder(&args.host, PROTOCOL, ENDPOINT, connection_data)
        .scheme(scheme)
        .max_negotiate_retries(3)
        .retry_wait_duration(Duration::from_secs(5))
        .build()?;

    println!("[1] Connecting to {scheme}://{}{ENDPOINT}...", args.host);
    client.init().await?;
    println!("    ✓ Connection id: {}\n", client.connection_id());

    println!("[2] Sending greeting...");
    client
        .send(&HubMessage::new(HUB, "send").with_args(["hello from rust"]))
        .await?;
    println!("    ✓ Sent\n");

    println!("[3] Listening (Ctrl+C to exit)...");
    let messages = client.messages();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            item = messages.recv() => match item {
                Some(Ok(message)) => {
                    for hub in message.hub_messages().flatten() {
                        println!("    {}.{} {:?}", hub.hub, hub.method, hub.args);
                    }
                }
                Some(Err(e)) => {
                    eprintln!("    ! {e}");
                    if e.is_transport_error() {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    client.close().await?;
    println!("\n    ✓ Closed");
    Ok(())
}
