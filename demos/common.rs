//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization
//! - A local remote end to talk to when no endpoint is given

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tracing_subscriber::EnvFilter;

use bidi_client::{Command, Response};

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    /// Endpoint to connect to instead of the local remote end.
    pub url: Option<String>,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            url: args.iter().find(|a| a.starts_with("ws")).cloned(),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing with the appropriate log level.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "bidi_client=trace,info"
    } else {
        "bidi_client=info,warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();
}

/// Starts a minimal remote end on localhost and returns its URL.
///
/// Answers `echo` with its params, `session.status` with a ready status,
/// and emits a `log.entryAdded` event every 100ms after `session.subscribe`.
pub async fn spawn_local_remote() -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("ws://{}", listener.local_addr()?);

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
            return;
        };
        let (mut write, mut read) = ws.split();
        let mut ticker = tokio::time::interval(Duration::from_millis(100));
        let mut subscribed = false;
        let mut sequence = 0u64;

        loop {
            tokio::select! {
                message = read.next() => {
                    let Some(Ok(Message::Text(text))) = message else { break };
                    let Ok(command) = serde_json::from_str::<Command>(text.as_str()) else { continue };

                    let reply = match command.method.as_str() {
                        "echo" => Response::success(command.id, Value::Object(command.params)),
                        "session.status" => Response::success(
                            command.id,
                            json!({"ready": true, "message": "local remote end"}),
                        ),
                        "session.subscribe" => {
                            subscribed = true;
                            Response::success(command.id, json!({}))
                        }
                        other => Response::error(
                            command.id,
                            "unknown command",
                            format!("{other} is not supported"),
                        ),
                    };

                    let Ok(text) = serde_json::to_string(&reply) else { break };
                    if write.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }

                _ = ticker.tick(), if subscribed => {
                    sequence += 1;
                    let event = json!({
                        "method": "log.entryAdded",
                        "params": {"level": "info", "text": format!("tick {sequence}")}
                    });
                    if write.send(Message::Text(event.to_string().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    Ok(url)
}
