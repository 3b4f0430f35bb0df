//! Event subscription.
//!
//! Demonstrates:
//! - Installing the event handler before subscribing
//! - Receiving events on a channel
//! - Closing while events are still flowing
//!
//! Usage:
//!   cargo run --example event_stream [ws://host:port/path] [--debug]

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use bidi_client::Client;

use common::Args;

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

    let client = Client::connect(&url).await?;

    client.on_diagnostic(|error| eprintln!("diagnostic: {error}"));

    // Handler first, so no event emitted after subscribing is lost
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.on_event(move |event| {
        let _ = tx.send(event);
    });

    client
        .send("session.subscribe", json!({"events": ["log.entryAdded"]}))
        .await?;
    println!("Subscribed, waiting for 5 events");

    for _ in 0..5 {
        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(event)) => {
                let params = serde_json::Value::Object(event.params.clone());
                println!("  {}.{} {params}", event.module(), event.event_name());
            }
            Ok(None) => break,
            Err(_) => {
                println!("No event within 5s");
                break;
            }
        }
    }

    client.close().await?;
    println!("Closed");

    Ok(())
}
