//! Wire protocol tests over simulated TCP using turmoil.
//!
//! The scripted server logic is served over real WebSocket framing on a
//! deterministic network, and the client side classifies replies with the
//! same parser the App uses.

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::{WebSocketStream, accept_async, client_async, tungstenite::Message};
use turmoil::net::{TcpListener, TcpStream};
use wirechat_client::ServerLine;
use wirechat_harness::{PeerOutput, SimPeer};

const SERVER_ADDR: &str = "server:9000";
const SERVER_URL: &str = "ws://server:9000/ws";

/// Serve `connections` WebSocket connections, one after another.
fn serve(sim: &mut turmoil::Sim<'_>, reserved: &'static [&'static str], connections: usize) {
    sim.host("server", move || async move {
        let listener = TcpListener::bind("0.0.0.0:9000").await?;
        let mut peer = SimPeer::with_reserved_names(reserved.iter().copied());

        for _ in 0..connections {
            let (stream, _) = listener.accept().await?;
            let mut ws = accept_async(stream).await?;
            let id = peer.connect();

            'connection: while let Some(message) = ws.next().await {
                let Message::Text(text) = message? else {
                    continue;
                };

                for output in peer.receive(id, text.as_str()) {
                    match output {
                        PeerOutput::Deliver { to, text } if to == id => {
                            ws.send(Message::text(text)).await?;
                        },
                        PeerOutput::Deliver { .. } => {},
                        PeerOutput::Close { .. } => {
                            ws.close(None).await?;
                            break 'connection;
                        },
                    }
                }
            }

            peer.disconnect(id);
        }

        Ok(())
    });
}

/// Next text frame, or `None` once the server closed.
async fn next_text<S>(ws: &mut WebSocketStream<S>) -> Option<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(Ok(message)) = ws.next().await {
        match message {
            Message::Text(text) => return Some(text.as_str().to_owned()),
            Message::Close(_) => return None,
            _ => {},
        }
    }
    None
}

#[test]
fn name_is_answered_with_acceptance() {
    let mut sim = turmoil::Builder::new().build();
    serve(&mut sim, &[], 1);

    sim.client("client", async {
        let stream = TcpStream::connect(SERVER_ADDR).await?;
        let (mut ws, _) = client_async(SERVER_URL, stream).await?;

        ws.send(Message::text("Ana")).await?;
        let reply = next_text(&mut ws).await.expect("greeting");

        assert_eq!(ServerLine::parse(&reply), ServerLine::Text("hi Ana".into()));

        ws.close(None).await?;
        Ok(())
    });

    sim.run().expect("simulation failed");
}

#[test]
fn taken_name_is_rejected_and_closed() {
    let mut sim = turmoil::Builder::new().build();
    serve(&mut sim, &["admin"], 1);

    sim.client("client", async {
        let stream = TcpStream::connect(SERVER_ADDR).await?;
        let (mut ws, _) = client_async(SERVER_URL, stream).await?;

        ws.send(Message::text("admin")).await?;
        let reply = next_text(&mut ws).await.expect("rejection");

        assert_eq!(ServerLine::parse(&reply), ServerLine::Rejected { reason: "name taken".into() });
        assert_eq!(next_text(&mut ws).await, None, "server closes after rejecting");
        Ok(())
    });

    sim.run().expect("simulation failed");
}

#[test]
fn lone_client_gets_no_echo() {
    let mut sim = turmoil::Builder::new().build();
    serve(&mut sim, &[], 2);

    sim.client("client", async {
        let stream = TcpStream::connect(SERVER_ADDR).await?;
        let (mut ws, _) = client_async(SERVER_URL, stream).await?;
        ws.send(Message::text("Ana")).await?;
        assert!(next_text(&mut ws).await.is_some());

        ws.send(Message::text("hola")).await?;
        ws.close(None).await?;

        // Nothing was relayed back, and the name is free again afterwards.
        while let Some(Ok(message)) = ws.next().await {
            assert!(!message.is_text(), "unexpected relay: {message:?}");
        }

        let stream = TcpStream::connect(SERVER_ADDR).await?;
        let (mut ws, _) = client_async(SERVER_URL, stream).await?;
        ws.send(Message::text("Ana")).await?;
        let reply = next_text(&mut ws).await.expect("greeting");
        assert_eq!(ServerLine::parse(&reply), ServerLine::Text("hi Ana".into()));

        ws.close(None).await?;
        Ok(())
    });

    sim.run().expect("simulation failed");
}
