//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use resource_shell::config::ShellConfig;
use resource_shell::http::HttpServer;
use resource_shell::lifecycle::{self, Shutdown};
use resource_shell::runtime::{ScriptSink, UiContext};

pub const HOME_PAGE: &str = "<html>home</html>";
pub const INJECT_JS: &str = "console.log('injected');";

/// App directory with a bundled site, its injection script and static data.
///
/// ```text
/// page/example.com/index.html
/// page/example.com/script/inject.js
/// data/app/main.js
/// ```
pub fn content_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "page/example.com/index.html", HOME_PAGE);
    write(dir.path(), "page/example.com/script/inject.js", INJECT_JS);
    write(dir.path(), "data/app/main.js", "run();");
    dir
}

pub fn write(base: &Path, relative: &str, content: &str) {
    let path = base.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Config rooted at `app_path` in release mode.
pub fn config_for(app_path: &Path) -> ShellConfig {
    let mut config = ShellConfig::default();
    config.content.app_path = app_path.to_path_buf();
    config
}

/// Script sink that records `(url, code)` pairs.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub executed: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptSink for RecordingSink {
    fn execute(&mut self, code: &str, url: &str) {
        self.executed
            .lock()
            .unwrap()
            .push((url.to_string(), code.to_string()));
    }
}

impl RecordingSink {
    /// Wait up to a second for at least `count` executions.
    pub async fn wait_for(&self, count: usize) -> Vec<(String, String)> {
        for _ in 0..100 {
            let executed = self.executed.lock().unwrap().clone();
            if executed.len() >= count {
                return executed;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.executed.lock().unwrap().clone()
    }
}

pub struct RunningShell {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub sink: RecordingSink,
}

/// Start the dev host on an ephemeral port.
pub async fn start_shell(config: ShellConfig) -> RunningShell {
    let sink = RecordingSink::default();
    let (_ui, injector) = UiContext::spawn(sink.clone());
    let io = lifecycle::build_io_context(&config, injector).spawn().unwrap();

    let shutdown = Shutdown::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config, io);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningShell {
        addr,
        shutdown,
        sink,
    }
}

/// Start a mock upstream that answers every request with `body`.
pub async fn start_mock_backend(content_type: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        read_request_head(&mut socket).await;
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            content_type,
                            body.len(),
                            body
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

async fn read_request_head(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
