//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::http::StatusCode;
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{self, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use http_backend::config::SessionConfig;
use http_backend::http::{Exchange, Request, ReplyHead};
use http_backend::session::{SessionFactory, SessionKind, Transport};
use http_backend::{BackendError, TransportError};

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        404 => "404 Not Found",
        429 => "429 Too Many Requests",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

/// Read one request head off `socket`.
async fn read_head(socket: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                head.extend_from_slice(&buf[..n]);
                if head.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}

/// Start a programmable mock origin on an ephemeral port.
///
/// `f` receives the raw request head and returns status and body.
pub async fn start_programmable_origin<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let head = read_head(&mut socket).await;
                let (status, body) = f(head).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line(status),
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// Start a mock origin that always answers 200 with `body`.
pub async fn start_origin(body: &'static str) -> SocketAddr {
    start_programmable_origin(move |_| async move { (200, body.to_string()) }).await
}

/// Start a mock origin that sends `chunks` with chunked encoding, pausing
/// `pause` between them.
pub async fn start_chunked_origin(chunks: Vec<&'static str>, pause: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let chunks = chunks.clone();
            tokio::spawn(async move {
                read_head(&mut socket).await;
                let head = "HTTP/1.1 200 OK\r\n\
                            Transfer-Encoding: chunked\r\n\
                            Connection: close\r\n\r\n";
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                for chunk in chunks {
                    let frame = format!("{:x}\r\n{}\r\n", chunk.len(), chunk);
                    if socket.write_all(frame.as_bytes()).await.is_err() {
                        return;
                    }
                    let _ = socket.flush().await;
                    tokio::time::sleep(pause).await;
                }
                let _ = socket.write_all(b"0\r\n\r\n").await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// In-memory transport with a scripted answer.
#[derive(Clone)]
pub struct StubTransport {
    status: StatusCode,
    chunks: Vec<&'static str>,
    delay: Duration,
    error: Option<TransportError>,
    body_error: Option<TransportError>,
    seen: Arc<Mutex<Vec<Arc<Request>>>>,
}

impl StubTransport {
    pub fn new(status: u16, chunks: Vec<&'static str>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            chunks,
            delay: Duration::ZERO,
            error: None,
            body_error: None,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn ok(body: &'static str) -> Self {
        Self::new(200, vec![body])
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(200, Vec::new())
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the body after all chunks were sent.
    pub fn with_body_error(mut self, error: TransportError) -> Self {
        self.body_error = Some(error);
        self
    }

    /// Requests that reached the transport, in order.
    pub fn seen(&self) -> Vec<Arc<Request>> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for StubTransport {
    fn send(&self, request: Arc<Request>) -> BoxFuture<'static, Result<Exchange, TransportError>> {
        self.seen.lock().unwrap().push(request);
        let stub = self.clone();
        async move {
            if !stub.delay.is_zero() {
                tokio::time::sleep(stub.delay).await;
            }
            if let Some(error) = stub.error {
                return Err(error);
            }
            let mut chunks: Vec<Result<Bytes, TransportError>> =
                stub.chunks.iter().copied().map(|c| Ok(Bytes::from_static(c.as_bytes()))).collect();
            if let Some(error) = stub.body_error {
                chunks.push(Err(error));
            }
            Ok(Exchange::new(ReplyHead::new(stub.status), stream::iter(chunks).boxed()))
        }
        .boxed()
    }
}

/// Session factory handing out a shared `StubTransport`.
#[derive(Clone)]
pub struct StubFactory {
    pub transport: StubTransport,
    fail_on: Option<SessionKind>,
    created: Arc<Mutex<Vec<(SessionKind, String)>>>,
}

impl StubFactory {
    pub fn new(transport: StubTransport) -> Self {
        Self {
            transport,
            fail_on: None,
            created: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_on(mut self, kind: SessionKind) -> Self {
        self.fail_on = Some(kind);
        self
    }

    /// Sessions created so far with their user agents.
    pub fn created(&self) -> Vec<(SessionKind, String)> {
        self.created.lock().unwrap().clone()
    }
}

impl SessionFactory for StubFactory {
    fn create(
        &self,
        kind: SessionKind,
        user_agent: &str,
        _config: &SessionConfig,
    ) -> Result<Arc<dyn Transport>, BackendError> {
        if self.fail_on == Some(kind) {
            return Err(BackendError::Session {
                kind,
                message: "stub refused".into(),
            });
        }
        self.created.lock().unwrap().push((kind, user_agent.to_string()));
        Ok(Arc::new(self.transport.clone()))
    }
}
