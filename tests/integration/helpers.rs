//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use http::{HeaderMap, Request, StatusCode, header};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tower::ServiceExt;

use sideload_api::{AppState, build_router};
use sideload_core::config::AppConfig;
use sideload_core::traits::{Notifier, notifier};

/// Multipart boundary used by every generated body.
pub const BOUNDARY: &str = "----sideload-test-boundary-7MA4YWxkTrZu0gW";

/// Landing page written into every test web root.
pub const INDEX_HTML: &str = "<!DOCTYPE html><title>sideload</title><form action=\"/upload\"></form>";

/// Artifact paths reported to the host, in call order.
pub type Notified = Arc<Mutex<Vec<PathBuf>>>;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Handler state behind the router
    pub state: AppState,
    /// Application config, pointing into `dir`
    pub config: AppConfig,
    /// Notifier calls seen so far
    pub notified: Notified,
    dir: TempDir,
}

/// Collected response of a routed request
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Body as UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl TestApp {
    /// Create a new test application with default settings
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test application after adjusting its config
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        seed_web_root(dir.path());

        let mut config = test_config(dir.path());
        adjust(&mut config);

        let (notifier, notified) = recording_notifier();
        let state = AppState::new(Arc::new(config.clone()), notifier)
            .await
            .expect("Failed to build app state");
        let router = build_router(state.clone());

        Self {
            router,
            state,
            config,
            notified,
            dir,
        }
    }

    /// Root of the temporary deployment
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Fixed upload destination
    pub fn artifact_path(&self) -> PathBuf {
        self.config.upload.artifact_path()
    }

    /// Snapshot of notifier calls
    pub fn notified(&self) -> Vec<PathBuf> {
        self.notified.lock().expect("notifier lock poisoned").clone()
    }

    /// Partial artifacts still present in the data directory
    pub fn part_files(&self) -> Vec<PathBuf> {
        part_files(Path::new(&self.config.upload.data_dir))
    }

    /// GET a path through the router
    pub async fn get(&self, path: &str) -> TestResponse {
        let req = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(req).await
    }

    /// POST a multipart body to `/upload`
    pub async fn upload(&self, body: Vec<u8>) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(header::CONTENT_TYPE, multipart_content_type())
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Make an HTTP request to the test app
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Config with every path inside `root` and a loopback listener.
pub fn test_config(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.shutdown_grace_ms = 300;
    config.server.shutdown_timeout_ms = 1_000;
    config.upload.data_dir = root.join("data").to_string_lossy().into_owned();
    config.assets.index_file = root.join("web/index.html").to_string_lossy().into_owned();
    config.assets.root_dir = root.join("web/assets").to_string_lossy().into_owned();
    config
}

/// Landing page, a flat asset, a nested asset, and a file outside the root.
pub fn seed_web_root(root: &Path) {
    let web = root.join("web");
    std::fs::create_dir_all(web.join("assets/js")).expect("Failed to create web root");
    std::fs::write(web.join("index.html"), INDEX_HTML).expect("Failed to write index");
    std::fs::write(web.join("assets/style.css"), "body { margin: 0; }").expect("write css");
    std::fs::write(web.join("assets/js/app.js"), "console.log('hi');").expect("write js");
    std::fs::write(root.join("secret.txt"), "top secret").expect("write secret");
}

/// Notifier that records every artifact path it is given.
pub fn recording_notifier() -> (Notifier, Notified) {
    let notified: Notified = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&notified);
    let notifier = notifier(move |path| {
        sink.lock()
            .expect("notifier lock poisoned")
            .push(path.to_path_buf());
    });
    (notifier, notified)
}

/// `.part` files in `dir`.
pub fn part_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "part"))
        .collect()
}

/// Deterministic non-repeating-ish payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// One part of a generated multipart body
pub enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

/// `Content-Type` header value matching [`multipart_body`].
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Encode `parts` as a `multipart/form-data` body.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                name,
                filename,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Single-file body, the shape the landing page sends.
pub fn file_upload(filename: &str, data: &[u8]) -> Vec<u8> {
    multipart_body(&[Part::File {
        name: "file",
        filename,
        data,
    }])
}

/// Status and body of a raw socket exchange
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Request head for `POST /upload` with an explicit `Content-Length`.
pub fn upload_head(addr: SocketAddr, content_length: usize) -> String {
    format!(
        "POST /upload HTTP/1.1\r\n\
         Host: {addr}\r\n\
         Connection: close\r\n\
         Content-Type: {}\r\n\
         Content-Length: {content_length}\r\n\r\n",
        multipart_content_type()
    )
}

/// GET over a fresh connection.
pub async fn raw_get(addr: SocketAddr, path: &str) -> std::io::Result<RawResponse> {
    let head = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    raw_exchange(addr, head.as_bytes(), &[]).await
}

/// POST a multipart body to `/upload` over a fresh connection.
pub async fn raw_upload(addr: SocketAddr, body: &[u8]) -> std::io::Result<RawResponse> {
    let head = upload_head(addr, body.len());
    raw_exchange(addr, head.as_bytes(), body).await
}

/// POST `body` to `/upload` with chunked transfer encoding, so the server
/// only learns the size by reading.
pub async fn raw_upload_chunked(addr: SocketAddr, body: &[u8]) -> std::io::Result<RawResponse> {
    let head = format!(
        "POST /upload HTTP/1.1\r\n\
         Host: {addr}\r\n\
         Connection: close\r\n\
         Content-Type: {}\r\n\
         Transfer-Encoding: chunked\r\n\r\n",
        multipart_content_type()
    );

    let mut encoded = Vec::with_capacity(body.len() + body.len() / 1024);
    for chunk in body.chunks(16 * 1024) {
        encoded.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        encoded.extend_from_slice(chunk);
        encoded.extend_from_slice(b"\r\n");
    }
    encoded.extend_from_slice(b"0\r\n\r\n");

    raw_exchange(addr, head.as_bytes(), &encoded).await
}

/// Write `head` and `body` while reading the response until the server
/// closes.
///
/// The server may answer and hang up before the body is fully sent (413,
/// early failures), so write errors are ignored and a read error after
/// part of the response arrived ends the read.
pub async fn raw_exchange(
    addr: SocketAddr,
    head: &[u8],
    body: &[u8],
) -> std::io::Result<RawResponse> {
    let stream = TcpStream::connect(addr).await?;
    let (mut reader, mut writer) = stream.into_split();

    let mut request = Vec::with_capacity(head.len() + body.len());
    request.extend_from_slice(head);
    request.extend_from_slice(body);
    let send = tokio::spawn(async move {
        for chunk in request.chunks(64 * 1024) {
            if writer.write_all(chunk).await.is_err() {
                return;
            }
        }
        let _ = writer.flush().await;
        // Keep the write half open until the response has been read.
        std::future::pending::<()>().await;
    });

    let mut raw = Vec::new();
    let mut buf = vec![0u8; 16 * 1024];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
            Err(_) if !raw.is_empty() => break,
            Err(e) => {
                send.abort();
                return Err(e);
            }
        }
    }
    send.abort();

    Ok(parse_response(&raw))
}

fn parse_response(raw: &[u8]) -> RawResponse {
    let text = String::from_utf8_lossy(raw);
    let (head, body) = text.split_once("\r\n\r\n").unwrap_or((&text, ""));
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    RawResponse {
        status,
        body: body.to_string(),
    }
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn wait_for(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
