//! Loopback HTTP responder for tests.
//!
//! Answers every request with one canned response and records the raw
//! requests it received.

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub struct Recorded {
    /// Base URL of the responder, e.g. `http://127.0.0.1:41234`.
    pub url: String,
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl Recorded {
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Body of the n-th request (everything after the header block).
    pub fn body(&self, n: usize) -> String {
        let requests = self.requests.lock().unwrap();
        let raw = &requests[n];
        raw.split_once("\r\n\r\n")
            .map(|(_, body)| body.to_string())
            .unwrap_or_default()
    }
}

pub async fn serve(status: u16, content_type: &str, body: impl AsRef<[u8]>) -> String {
    serve_recording(status, content_type, body).await.url
}

pub async fn serve_recording(
    status: u16,
    content_type: &str,
    body: impl AsRef<[u8]>,
) -> Recorded {
    let body = body.as_ref();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let mut response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);

    let seen = Arc::clone(&requests);
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let request = read_request(&mut socket).await;
            seen.lock().unwrap().push(request);
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        }
    });

    Recorded {
        url: format!("http://{addr}"),
        requests,
    }
}

/// A URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/feed.xml")
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
