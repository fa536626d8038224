//! Local WebSocket server for stream tests.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

pub type ServerSocket = WebSocketStream<TcpStream>;

/// Upper bound for any single await in the stream tests.
pub const STEP: Duration = Duration::from_secs(5);

pub struct MockWsServer {
    /// `ws://127.0.0.1:{port}`
    pub url: String,
    /// Request path (with query) of every accepted connection, in order.
    pub paths: mpsc::UnboundedReceiver<String>,
}

impl MockWsServer {
    /// Accept connections forever; `handler` receives the connection index and the socket.
    pub async fn start<F, Fut>(handler: F) -> Self
    where
        F: Fn(usize, ServerSocket) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let (path_tx, paths) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut index = 0;
            while let Ok((stream, _)) = listener.accept().await {
                let path_tx = path_tx.clone();
                let callback = move |request: &Request,
                                     response: Response|
                      -> Result<Response, ErrorResponse> {
                    let _ = path_tx.send(request.uri().to_string());
                    Ok(response)
                };
                let Ok(socket) = accept_hdr_async(stream, callback).await else {
                    continue;
                };
                tokio::spawn(handler(index, socket));
                index += 1;
            }
        });

        Self { url, paths }
    }

    pub async fn next_path(&mut self) -> String {
        tokio::time::timeout(STEP, self.paths.recv())
            .await
            .expect("no connection within timeout")
            .expect("server stopped")
    }
}

/// Send `frames`, then report everything the client sends until it closes.
pub async fn send_then_drain(
    mut socket: ServerSocket,
    frames: Vec<Message>,
    inbound: mpsc::UnboundedSender<Message>,
) {
    for frame in frames {
        if socket.send(frame).await.is_err() {
            return;
        }
    }
    drain(socket, inbound).await;
}

pub async fn drain(mut socket: ServerSocket, inbound: mpsc::UnboundedSender<Message>) {
    while let Some(Ok(message)) = socket.next().await {
        let closing = message.is_close();
        let _ = inbound.send(message);
        if closing {
            break;
        }
    }
}

pub fn text(value: Value) -> Message {
    Message::Text(value.to_string())
}
