//! Shared utilities for integration testing.
//!
//! Raw-TCP HTTP stubs: a programmable server that records each request
//! head (and decoded body) and replies with whatever the test's responder
//! returns. Used both as the mock upstream backend and as the mock
//! identity service.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use portal_gateway::{GatewayConfig, GatewayServer, Shutdown};

/// One request as seen by a stub server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path plus query, verbatim from the request line.
    pub target: String,
    /// Header names lowercased; order preserved.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
}

/// Response a stub server writes back.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub delay: Option<Duration>,
}

impl StubResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
            delay: None,
        }
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        201 => "201 Created",
        204 => "204 No Content",
        302 => "302 Found",
        307 => "307 Temporary Redirect",
        400 => "400 Bad Request",
        401 => "401 Unauthorized",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

/// Start a programmable recording stub. Returns its address and a channel
/// of every request it served.
pub async fn start_http_stub<F>(f: F) -> (SocketAddr, mpsc::UnboundedReceiver<RecordedRequest>)
where
    F: Fn(&RecordedRequest) -> StubResponse + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Some(recorded) = read_request(socket).await {
                            let (recorded, mut socket) = recorded;
                            let response = f(&recorded);
                            let _ = tx.send(recorded);
                            if let Some(delay) = response.delay {
                                tokio::time::sleep(delay).await;
                            }
                            let _ = write_response(&mut socket, &response).await;
                            let _ = socket.shutdown().await;
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, rx)
}

/// An address nothing listens on (bound once, then dropped).
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Spawn a gateway on an OS-assigned port. The returned `Shutdown` must
/// stay alive for the duration of the test.
pub async fn spawn_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = GatewayServer::new(config);

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

/// Identity stub responder: active session, fixed token for any audience.
pub fn identity_ok(
    token: &'static str,
) -> impl Fn(&RecordedRequest) -> StubResponse + Send + Sync + 'static {
    move |req| {
        if req.target.starts_with("/tokens/") {
            StubResponse::new(200)
                .header("content-type", "application/json")
                .body(format!(r#"{{"token":"{token}"}}"#))
        } else if req.target == "/session" {
            StubResponse::new(200)
                .header("content-type", "application/json")
                .body(r#"{"user_id":"user-1"}"#)
        } else {
            StubResponse::new(404)
        }
    }
}

/// A client that never follows redirects, so 3xx behavior is observable.
pub fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

async fn read_request(mut socket: TcpStream) -> Option<(RecordedRequest, TcpStream)> {
    let mut buf: Vec<u8> = Vec::new();
    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let mut tmp = [0u8; 4096];
        match socket.read(&mut tmp).await {
            Ok(0) | Err(_) => return None,
            Ok(n) => buf.extend_from_slice(&tmp[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.lines();
    let request_line = lines.next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = Vec::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_lowercase(), value.trim().to_string()));
        }
    }

    let body_start = head_end + 4;
    let content_length = headers
        .iter()
        .find(|(n, _)| n == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok());
    let chunked = headers
        .iter()
        .any(|(n, v)| n == "transfer-encoding" && v.contains("chunked"));

    let body = if let Some(len) = content_length {
        while buf.len() < body_start + len {
            let mut tmp = [0u8; 4096];
            match socket.read(&mut tmp).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
            }
        }
        String::from_utf8_lossy(&buf[body_start..(body_start + len).min(buf.len())]).to_string()
    } else if chunked {
        while find(&buf[body_start..], b"0\r\n\r\n").is_none() {
            let mut tmp = [0u8; 4096];
            match socket.read(&mut tmp).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
            }
        }
        decode_chunked(&buf[body_start..])
    } else {
        String::new()
    };

    Some((
        RecordedRequest {
            method,
            target,
            headers,
            body,
        },
        socket,
    ))
}

async fn write_response(socket: &mut TcpStream, response: &StubResponse) -> std::io::Result<()> {
    let mut out = format!("HTTP/1.1 {}\r\n", status_text(response.status));
    let has_length = response
        .headers
        .iter()
        .any(|(n, _)| n.eq_ignore_ascii_case("content-length"));
    for (name, value) in &response.headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    if !has_length && response.status != 204 {
        out.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
    }
    out.push_str("Connection: close\r\n\r\n");
    if response.status != 204 {
        out.push_str(&response.body);
    }
    socket.write_all(out.as_bytes()).await
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn decode_chunked(raw: &[u8]) -> String {
    let mut body = Vec::new();
    let mut rest = raw;
    loop {
        let Some(line_end) = find(rest, b"\r\n") else { break };
        let size_line = String::from_utf8_lossy(&rest[..line_end]);
        let Ok(size) = usize::from_str_radix(size_line.trim(), 16) else { break };
        if size == 0 {
            break;
        }
        let data_start = line_end + 2;
        if rest.len() < data_start + size + 2 {
            break;
        }
        body.extend_from_slice(&rest[data_start..data_start + size]);
        rest = &rest[data_start + size + 2..];
    }
    String::from_utf8_lossy(&body).to_string()
}
