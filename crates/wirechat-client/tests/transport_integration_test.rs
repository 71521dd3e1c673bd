//! Integration tests for the WebSocket transport.
//!
//! These tests verify the real transport layer by connecting a [`Link`] to a
//! loopback WebSocket server that speaks the chat convention: the first line
//! is the display name, names starting with `taken` are rejected, every later
//! line is echoed back prefixed with the name.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::{net::TcpListener, sync::mpsc, time::timeout};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use wirechat_client::{
    CloseCause, Endpoint, HandleId, LinkEvent,
    transport::{Link, TransportConfig, TransportError},
};

const WAIT: Duration = Duration::from_secs(5);

/// Start a loopback chat server and return its `ws://` endpoint.
async fn start_server() -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(stream).await else { return };

                let name = match ws.next().await {
                    Some(Ok(Message::Text(name))) => name.as_str().to_owned(),
                    _ => return,
                };

                if name.starts_with("taken") {
                    let _ = ws.send(Message::Text("ERROR: name taken".into())).await;
                    return;
                }
                let _ = ws.send(Message::Text(format!("hi {name}").into())).await;

                while let Some(Ok(message)) = ws.next().await {
                    match message {
                        Message::Text(text) if text.as_str() == "bye" => {
                            let _ = ws.close(None).await;
                            return;
                        },
                        Message::Text(text) => {
                            let reply = format!("{name}: {}", text.as_str());
                            if ws.send(Message::Text(reply.into())).await.is_err() {
                                return;
                            }
                        },
                        Message::Close(_) => return,
                        _ => {},
                    }
                }
            });
        }
    });

    Endpoint::parse(&format!("ws://{addr}/ws")).unwrap()
}

async fn next_event(rx: &mut mpsc::Receiver<LinkEvent>) -> LinkEvent {
    timeout(WAIT, rx.recv()).await.expect("timed out waiting for link event").unwrap()
}

#[tokio::test]
async fn link_opens_and_exchanges_lines_in_order() {
    let endpoint = start_server().await;
    let (tx, mut rx) = mpsc::channel(32);
    let handle = HandleId::new(1);
    let link = Link::open(handle, &endpoint, &TransportConfig::default(), tx).unwrap();

    assert_eq!(next_event(&mut rx).await, LinkEvent::Opened { handle });

    link.send("Ana".into()).await.unwrap();
    assert_eq!(next_event(&mut rx).await, LinkEvent::Received { handle, text: "hi Ana".into() });

    for line in ["one", "two", "three"] {
        link.send(line.into()).await.unwrap();
    }
    for line in ["one", "two", "three"] {
        assert_eq!(next_event(&mut rx).await, LinkEvent::Received {
            handle,
            text: format!("Ana: {line}"),
        });
    }
    assert!(link.is_live());
}

#[tokio::test]
async fn rejection_line_is_delivered_verbatim() {
    let endpoint = start_server().await;
    let (tx, mut rx) = mpsc::channel(32);
    let handle = HandleId::new(7);
    let link = Link::open(handle, &endpoint, &TransportConfig::default(), tx).unwrap();

    assert_eq!(next_event(&mut rx).await, LinkEvent::Opened { handle });
    link.send("taken-name".into()).await.unwrap();

    assert_eq!(next_event(&mut rx).await, LinkEvent::Received {
        handle,
        text: "ERROR: name taken".into()
    });
}

#[tokio::test]
async fn server_close_is_reported_once_as_remote() {
    let endpoint = start_server().await;
    let (tx, mut rx) = mpsc::channel(32);
    let handle = HandleId::new(2);
    let link = Link::open(handle, &endpoint, &TransportConfig::default(), tx).unwrap();

    assert_eq!(next_event(&mut rx).await, LinkEvent::Opened { handle });
    link.send("Ana".into()).await.unwrap();
    let _accept = next_event(&mut rx).await;
    link.send("bye".into()).await.unwrap();

    assert_eq!(next_event(&mut rx).await, LinkEvent::Closed { handle, cause: CloseCause::Remote });

    // Closed is terminal: the task drops its sender and the channel drains.
    drop(link);
    assert!(timeout(WAIT, rx.recv()).await.unwrap().is_none());
}

#[tokio::test]
async fn local_close_is_idempotent_and_silent() {
    let endpoint = start_server().await;
    let (tx, mut rx) = mpsc::channel(32);
    let handle = HandleId::new(3);
    let mut link = Link::open(handle, &endpoint, &TransportConfig::default(), tx).unwrap();

    assert_eq!(next_event(&mut rx).await, LinkEvent::Opened { handle });

    link.close();
    link.close();
    assert!(!link.is_live());
    assert!(matches!(link.send("late".into()).await, Err(TransportError::Closed(h)) if h == handle));

    assert!(timeout(WAIT, rx.recv()).await.unwrap().is_none());
}

#[tokio::test]
async fn refused_connection_reports_error_close() {
    // Bind and drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let endpoint = Endpoint::parse(&format!("ws://{addr}/ws")).unwrap();
    let (tx, mut rx) = mpsc::channel(32);
    let handle = HandleId::new(4);
    let _link = Link::open(handle, &endpoint, &TransportConfig::default(), tx).unwrap();

    match next_event(&mut rx).await {
        LinkEvent::Closed { handle: h, cause: CloseCause::Error(_) } => assert_eq!(h, handle),
        other => panic!("expected error close, got {other:?}"),
    }
}

#[tokio::test]
async fn non_websocket_scheme_fails_construction() {
    let endpoint = Endpoint::parse("https://chat.example/ws").unwrap();
    let (tx, _rx) = mpsc::channel(32);

    let result = Link::open(HandleId::new(5), &endpoint, &TransportConfig::default(), tx);

    assert!(matches!(result, Err(TransportError::UnsupportedScheme { scheme }) if scheme == "https"));
}

#[test]
fn open_outside_runtime_fails_construction() {
    let endpoint = Endpoint::parse("ws://127.0.0.1:9/ws").unwrap();
    let (tx, _rx) = mpsc::channel(32);

    let result = Link::open(HandleId::new(6), &endpoint, &TransportConfig::default(), tx);

    assert!(matches!(result, Err(TransportError::NoRuntime(_))));
}
