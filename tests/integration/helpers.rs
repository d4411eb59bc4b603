//! Shared test helpers for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use bytes::Bytes;
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

use viewer_api::{AppState, build_app};
use viewer_cache::AssetCache;
use viewer_core::config::AppConfig;
use viewer_realtime::{LoopbackWorld, RealtimeEngine};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(5);

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Engine behind `/ws`
    pub engine: Arc<RealtimeEngine>,
    /// Simulation handed to the engine
    pub world: LoopbackWorld,
    /// Holds the index, static and asset fixtures
    _dir: tempfile::TempDir,
}

impl TestApp {
    /// Create a new test application over a fresh fixture directory
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = dir.path();

        std::fs::write(root.join("index.html"), "<html><body>viewer</body></html>")
            .expect("Failed to write index");
        std::fs::create_dir_all(root.join("static")).expect("Failed to create static dir");
        std::fs::write(root.join("static/app.js"), "start();").expect("Failed to write static");
        std::fs::create_dir_all(root.join("assets/models")).expect("Failed to create asset dir");
        std::fs::write(root.join("assets/models/cube.obj"), "v 0 0 0")
            .expect("Failed to write asset");

        let mut config = AppConfig::default();
        config.server.index_file = path_string(root.join("index.html"));
        config.server.static_dir = path_string(root.join("static"));
        config.assets.root = path_string(root.join("assets"));

        let world = LoopbackWorld::new(config.realtime.session_buffer_size);
        let engine = Arc::new(RealtimeEngine::start(
            config.realtime.clone(),
            Arc::new(world.clone()),
        ));
        let assets = Arc::new(AssetCache::new(&config.assets));
        let state = AppState::new(Arc::new(config), engine.clone(), assets);

        Self {
            router: build_app(state),
            engine,
            world,
            _dir: dir,
        }
    }

    /// Serve the app on an ephemeral local port
    pub async fn spawn(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local addr");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server failed");
        });
        addr
    }

    /// Send a GET request through the router
    pub async fn get(&self, path: &str) -> TestResponse {
        let req = Request::get(path)
            .body(Body::empty())
            .expect("Failed to build request");

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
            .expect("Failed to read body");

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Wait until the hub holds exactly `count` connections
    pub async fn wait_for_active(&self, count: usize) {
        let hub = self.engine.hub();
        tokio::time::timeout(WAIT, async {
            loop {
                if hub.active_connections().await.expect("Hub stopped").len() == count {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("Hub never reached {count} connections"));
    }
}

/// Open a WebSocket to a spawned app
pub async fn connect(addr: SocketAddr) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("WebSocket handshake failed");
    ws
}

/// Test response
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub body: Bytes,
}

impl TestResponse {
    /// Body parsed as JSON
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("Body is not JSON")
    }

    /// Body as UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("Body is not UTF-8")
    }
}

fn path_string(path: std::path::PathBuf) -> String {
    path.to_string_lossy().into_owned()
}
