//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use dev_proxy::observability::{AccessRecord, AccessSink, ErrorRecord};
use dev_proxy::resilience::Deadlines;
use dev_proxy::{Origin, ProxyServer, RouteTable, ServerHandle};

/// Read one request (head plus Content-Length body) from `socket`.
async fn read_request(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(String::from_utf8_lossy(&buf).to_string())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Start an origin that answers every request with `x-backend: <name>` and
/// echoes the raw request it received as the body.
pub async fn start_echo_backend(name: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nx-backend: {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            name,
                            request.len(),
                            request
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start an origin that sends a chunked response head and then one chunk
/// every 50ms until the peer goes away. Returns the number of upstream
/// sockets it still holds open.
pub async fn start_trickle_backend() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let open = Arc::new(AtomicUsize::new(0));
    let counter = open.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let counter = counter.clone();
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                if read_request(&mut socket).await.is_some() {
                    let head = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n";
                    if socket.write_all(head.as_bytes()).await.is_ok() {
                        while socket.write_all(b"5\r\ntick\n\r\n").await.is_ok() {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                        }
                    }
                }
                counter.fetch_sub(1, Ordering::SeqCst);
            });
        }
    });

    (addr, open)
}

/// Start an origin that announces a body it never sends.
pub async fn start_stalling_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                if read_request(&mut socket).await.is_some() {
                    let head = "HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial";
                    let _ = socket.write_all(head.as_bytes()).await;
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
            });
        }
    });

    addr
}

/// Start an origin that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(socket);
            });
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn origin(addr: SocketAddr) -> Origin {
    format!("http://{addr}").parse().unwrap()
}

/// Sink that keeps every record for inspection.
#[derive(Default)]
pub struct RecordingSink {
    pub requests: Mutex<Vec<AccessRecord>>,
    pub errors: Mutex<Vec<ErrorRecord>>,
    pub aborts: Mutex<Vec<ErrorRecord>>,
}

impl RecordingSink {
    pub fn requests(&self) -> Vec<AccessRecord> {
        self.requests.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.errors.lock().unwrap().clone()
    }

    pub fn aborts(&self) -> Vec<ErrorRecord> {
        self.aborts.lock().unwrap().clone()
    }
}

impl AccessSink for RecordingSink {
    fn log_request(&self, record: &AccessRecord) {
        self.requests.lock().unwrap().push(record.clone());
    }

    fn log_error(&self, record: &ErrorRecord) {
        self.errors.lock().unwrap().push(record.clone());
    }

    fn log_abort(&self, record: &ErrorRecord) {
        self.aborts.lock().unwrap().push(record.clone());
    }
}

/// Start a proxy for `table` on an ephemeral port.
pub async fn start_proxy(
    table: RouteTable,
    deadlines: Deadlines,
) -> (ServerHandle, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let server = ProxyServer::with_table(table, deadlines, sink.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let handle = server.start(listener).unwrap();
    (handle, sink)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
