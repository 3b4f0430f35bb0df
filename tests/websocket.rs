//! Client behavior against a real WebSocket remote end.

use std::time::Duration;

use bidi_client::{Client, ClientOptions, Command, Error, Response};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

// ============================================================================
// Remote End
// ============================================================================

/// Serves one connection.
///
/// - `echo`: success with the params as result
/// - `fail`: error response
/// - `subscribe`: an event, then the success response
/// - `hang`: never answered
/// - `drop`: closes the socket without answering
async fn spawn_remote() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream)
            .await
            .expect("upgrade");

        while let Some(Ok(message)) = ws.next().await {
            let Message::Text(text) = message else {
                continue;
            };
            let command: Command = serde_json::from_str(text.as_str()).expect("command");

            let replies = match command.method.as_str() {
                "echo" => vec![json!(Response::success(
                    command.id,
                    Value::Object(command.params)
                ))],
                "fail" => vec![json!(Response::error(command.id, "InvalidArgument", "bad x"))],
                "subscribe" => vec![
                    json!({"method": "log.entryAdded", "params": {"text": "subscribed"}}),
                    json!(Response::success(command.id, json!(null))),
                ],
                "hang" => vec![],
                "drop" => break,
                other => vec![json!(Response::error(
                    command.id,
                    "unknown command",
                    format!("no such method {other}")
                ))],
            };

            for reply in replies {
                if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
                    return;
                }
            }
        }
    });

    format!("ws://127.0.0.1:{port}")
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn connect_send_and_close() {
    let url = spawn_remote().await;
    let client = Client::connect(&url).await.expect("connect");

    let echo = client.send("echo", json!({"x": 1}));
    assert_eq!(echo.id().as_u64(), 1);
    assert_eq!(echo.await.expect("echo"), json!({"x": 1}));

    let err = client.send("fail", json!({})).await.unwrap_err();
    assert!(err.to_string().contains("InvalidArgument: bad x"));

    client.close().await.expect("close");
    assert!(client.is_closed());
}

#[tokio::test]
async fn event_arrives_before_its_response() {
    let url = spawn_remote().await;
    let client = Client::connect(&url).await.expect("connect");

    let (tx, mut rx) = mpsc::unbounded_channel();
    client.on_event(move |event| {
        let _ = tx.send(event);
    });

    client
        .send("subscribe", json!({"events": ["log.entryAdded"]}))
        .await
        .expect("subscribe");

    let event = rx.try_recv().expect("event dispatched before response");
    assert_eq!(event.method, "log.entryAdded");
    assert_eq!(event.params.get("text"), Some(&json!("subscribed")));

    client.close().await.expect("close");
}

#[tokio::test]
async fn close_rejects_unanswered_command() {
    let url = spawn_remote().await;
    let client = Client::connect(&url).await.expect("connect");

    let hanging = client.send("hang", json!({}));
    let closer = client.clone();
    let (outcome, closed) = tokio::join!(hanging, async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        closer.close().await
    });

    closed.expect("close");
    assert!(outcome.unwrap_err().is_closed());
}

#[tokio::test]
async fn remote_drop_rejects_pending_with_connection_closed() {
    let url = spawn_remote().await;
    let client = Client::connect(&url).await.expect("connect");

    let hanging = client.send("hang", json!({}));
    let dropped = client.send("drop", json!({}));

    assert!(matches!(hanging.await, Err(Error::ConnectionClosed)));
    assert!(matches!(dropped.await, Err(Error::ConnectionClosed)));
    assert!(client.is_closed());
}

#[tokio::test]
async fn connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let options = ClientOptions::new().with_connect_timeout(Duration::from_secs(5));
    let err = Client::connect_with(&format!("ws://127.0.0.1:{port}"), options)
        .await
        .unwrap_err();
    assert!(err.is_connection_error());
}

#[tokio::test]
async fn connect_invalid_address() {
    let err = Client::connect("127.0.0.1:9222").await.unwrap_err();
    assert!(matches!(err, Error::Connection { .. }));
}
