//! Command round trips.
//!
//! Demonstrates:
//! - Connecting a client
//! - Concurrent commands answered independently
//! - Protocol errors vs. results
//! - Typed results with `call`
//!
//! Usage:
//!   cargo run --example echo_roundtrip [ws://host:port/path] [--debug]

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Instant;

use serde::Deserialize;
use serde_json::json;

use bidi_client::{Client, Error};

use common::Args;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SessionStatus {
    ready: bool,
    message: String,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    common::init_logging(args.debug);

    let url = match args.url {
        Some(url) => url,
        None => common::spawn_local_remote().await?,
    };

    println!("Connecting to {url}");
    let client = Client::connect(&url).await?;

    // Typed result
    let status: SessionStatus = client.call("session.status", json!({})).await?;
    println!("session.status: ready={} message={:?}", status.ready, status.message);

    // Concurrent commands
    let start = Instant::now();
    let calls: Vec<_> = (0..10).map(|n| client.send("echo", json!({"n": n}))).collect();
    for call in calls {
        let id = call.id();
        let result = call.await?;
        println!("  id={id} -> {result}");
    }
    println!("10 echoes in {:?}", start.elapsed());

    // Protocol error
    match client.send("no.such.method", json!({})).await {
        Err(Error::Protocol { code, message }) => println!("Rejected: {code}: {message}"),
        other => println!("Unexpected outcome: {other:?}"),
    }

    client.close().await?;
    println!("Closed");

    Ok(())
}
