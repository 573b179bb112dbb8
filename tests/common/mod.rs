//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use tcp_bridge::bridge::SessionTracker;
use tcp_bridge::config::BridgeConfig;
use tcp_bridge::http::HttpServer;
use tcp_bridge::lifecycle::Shutdown;
use tcp_bridge::net::listener;

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A bridge server running on an ephemeral loopback port.
pub struct TestBridge {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub sessions: SessionTracker,
}

impl TestBridge {
    pub fn ws_url(&self, target: SocketAddr) -> String {
        format!(
            "ws://{}/tcp?host={}&port={}",
            self.addr,
            target.ip(),
            target.port()
        )
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Open a bridged WebSocket to `target`.
    pub async fn connect(&self, target: SocketAddr) -> Client {
        let (ws, response) = tokio_tungstenite::connect_async(self.ws_url(target))
            .await
            .expect("bridge handshake failed");
        assert_eq!(response.status().as_u16(), 101);
        ws
    }

    /// Wait until the bridge reports no active sessions.
    pub async fn wait_idle(&self) {
        assert!(
            self.sessions.wait_idle(Duration::from_secs(5)).await,
            "sessions did not drain"
        );
    }
}

impl Drop for TestBridge {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the bridge with `config`, bound to 127.0.0.1 on a free port.
pub async fn start_bridge(mut config: BridgeConfig) -> TestBridge {
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;

    let listener = listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, shutdown.clone());
    let sessions = server.sessions();

    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    TestBridge {
        addr,
        shutdown,
        sessions,
    }
}

/// HTTP client that ignores proxy settings from the environment.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Start a TCP backend that echoes every byte back.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let (mut reader, mut writer) = socket.split();
                        let _ = tokio::io::copy(&mut reader, &mut writer).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a backend that reads each connection to EOF and reports what it
/// received. EOF is the signal that the bridge closed its side.
pub async fn start_sink_backend() -> (SocketAddr, mpsc::UnboundedReceiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let mut received = Vec::new();
                        let _ = socket.read_to_end(&mut received).await;
                        let _ = tx.send(received);
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, rx)
}

/// Start a backend that writes `greeting` and then closes the connection.
pub async fn start_closing_backend(greeting: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let _ = socket.write_all(greeting).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a backend that only counts accepted connections.
pub async fn start_counting_backend() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });

    (addr, accepted)
}

/// A loopback address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Read binary payloads until `len` bytes have arrived.
pub async fn read_bytes(ws: &mut Client, len: usize) -> Vec<u8> {
    let mut received = Vec::with_capacity(len);
    while received.len() < len {
        let message = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for data")
            .expect("websocket ended early")
            .expect("websocket error");
        match message {
            Message::Binary(data) => received.extend_from_slice(&data),
            Message::Ping(_) | Message::Pong(_) => {}
            other => panic!("unexpected message: {:?}", other),
        }
    }
    received
}

/// Drain the socket until it closes, returning any binary data seen first.
pub async fn read_until_closed(ws: &mut Client) -> Vec<u8> {
    let mut received = Vec::new();
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("websocket was not closed");
        match next {
            Some(Ok(Message::Binary(data))) => received.extend_from_slice(&data),
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return received,
            Some(Ok(_)) => {}
        }
    }
}
