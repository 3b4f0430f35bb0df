//! WebSocket transport and I/O loop.
//!
//! # I/O Loop
//!
//! Each transport spawns a tokio task that owns the socket and handles:
//!
//! - Incoming text frames, forwarded to [`Inbound`] in arrival order
//! - Outgoing messages queued by [`Transport::send`]
//! - The close request from [`Transport::close`]
//!
//! The loop ends on remote close, read or write failure, close request,
//! or when every transport handle is dropped. Ending the loop ends
//! [`Inbound`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{WebSocketStream, connect_async};
use tracing::{debug, error, info, trace};
use url::Url;

use crate::error::{Error, Result};

use super::{Inbound, Transport};

// ============================================================================
// TransportCommand
// ============================================================================

/// Requests from transport handles to the I/O loop.
enum TransportCommand {
    /// Write one text frame.
    Send(String),
    /// Close the socket and report the outcome.
    Close(oneshot::Sender<Result<()>>),
}

// ============================================================================
// WebSocketTransport
// ============================================================================

/// [`Transport`] over a WebSocket connection.
///
/// Only `ws://` is supported out of the box; `wss://` needs one of
/// `tokio-tungstenite`'s TLS features enabled by the final binary.
pub struct WebSocketTransport {
    /// Channel to the I/O loop.
    command_tx: mpsc::UnboundedSender<TransportCommand>,
    /// Remote address, for diagnostics.
    peer: String,
}

impl fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("peer", &self.peer)
            .field("open", &self.is_open())
            .finish()
    }
}

impl WebSocketTransport {
    /// Connects to a WebSocket endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the address is not a `ws://`/`wss://` URL,
    ///   or the endpoint refuses the connection or the handshake
    /// - [`Error::ConnectionTimeout`] if the handshake does not complete
    ///   within `connect_timeout`
    pub async fn connect(address: &str, connect_timeout: Duration) -> Result<(Self, Inbound)> {
        let url = Url::parse(address)
            .map_err(|e| Error::connection(format!("invalid address {address}: {e}")))?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::connection(format!(
                "unsupported scheme {}: expected ws or wss",
                url.scheme()
            )));
        }

        debug!(%url, "Connecting");

        let (ws_stream, _) = timeout(connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| {
                let timeout_ms = u64::try_from(connect_timeout.as_millis()).unwrap_or(u64::MAX);
                Error::connection_timeout(timeout_ms)
            })?
            .map_err(|e| Error::connection(format!("WebSocket handshake with {url} failed: {e}")))?;

        info!(%url, "WebSocket connection established");

        Ok(Self::from_stream(ws_stream, url.to_string()))
    }

    /// Wraps an established WebSocket stream.
    ///
    /// Spawns the I/O loop task internally, so this must be called from
    /// within a tokio runtime.
    pub fn from_stream<S>(ws_stream: WebSocketStream<S>, peer: impl Into<String>) -> (Self, Inbound)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_io_loop(ws_stream, command_rx, inbound_tx));

        let transport = Self {
            command_tx,
            peer: peer.into(),
        };

        (transport, inbound_rx)
    }

    /// Returns `true` while the I/O loop is running.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.command_tx.is_closed()
    }

    /// Returns the remote address.
    #[inline]
    #[must_use]
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    fn send(&self, text: String) -> Result<()> {
        self.command_tx
            .send(TransportCommand::Send(text))
            .map_err(|_| Error::ConnectionClosed)
    }

    async fn close(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();

        if self.command_tx.send(TransportCommand::Close(ack_tx)).is_err() {
            debug!(peer = %self.peer, "Transport already closed");
            return Ok(());
        }

        // The loop always answers before exiting; a dropped ack means it is gone.
        ack_rx.await.unwrap_or(Ok(()))
    }
}

// ============================================================================
// I/O Loop
// ============================================================================

async fn run_io_loop<S>(
    ws_stream: WebSocketStream<S>,
    mut command_rx: mpsc::UnboundedReceiver<TransportCommand>,
    inbound_tx: mpsc::UnboundedSender<String>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut ws_write, mut ws_read) = ws_stream.split();
    let mut close_ack = None;

    loop {
        tokio::select! {
            // Incoming frames from remote end
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        trace!(bytes = text.len(), "Frame received");
                        if inbound_tx.send(text.as_str().to_owned()).is_err() {
                            debug!("Inbound receiver dropped, discarding frame");
                        }
                    }

                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "WebSocket closed by remote");
                        break;
                    }

                    Some(Err(e)) => {
                        error!(error = %e, "WebSocket error");
                        break;
                    }

                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }

                    // Ignore Binary, Ping, Pong, Frame
                    _ => {}
                }
            }

            // Requests from transport handles
            command = command_rx.recv() => {
                match command {
                    Some(TransportCommand::Send(text)) => {
                        if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                            error!(error = %e, "Failed to write frame");
                            break;
                        }
                        trace!("Frame written");
                    }

                    Some(TransportCommand::Close(ack)) => {
                        debug!("Close requested");
                        let result = match ws_write.close().await {
                            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
                            Err(e) => Err(Error::WebSocket(e)),
                        };
                        close_ack = Some((ack, result));
                        break;
                    }

                    None => {
                        debug!("All transport handles dropped");
                        let _ = ws_write.close().await;
                        break;
                    }
                }
            }
        }
    }

    // End Inbound before acknowledging close.
    drop(inbound_tx);

    command_rx.close();
    while let Ok(command) = command_rx.try_recv() {
        if let TransportCommand::Close(ack) = command {
            let _ = ack.send(Ok(()));
        }
    }

    if let Some((ack, result)) = close_ack {
        let _ = ack.send(result);
    }

    debug!("I/O loop terminated");
}

// ============================================================================
// Tests
// ============================================================================
