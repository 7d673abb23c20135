use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use usuarios_panel::config::{LimitConfig, ServerConfig};
use usuarios_panel::server::{AppState, create_router};
use usuarios_panel::store::{SqliteStore, Store};
use usuarios_panel::types::Role;

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// An in-process server over a fresh SQLite file.
pub struct TestApp {
    pub temp_dir: TempDir,
    pub state: Arc<AppState>,
    router: Router,
}

pub fn client(last: u8) -> IpAddr {
    IpAddr::from([192, 0, 2, last])
}

impl TestApp {
    /// Starts an app with the given role and limits loose enough that only
    /// the write throttle is noticeable.
    pub fn new(role: Option<&str>) -> Self {
        Self::with_limits(
            role,
            LimitConfig {
                max_requests: 10_000,
                ..LimitConfig::default()
            },
        )
    }

    pub fn with_limits(role: Option<&str>, limits: LimitConfig) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config = ServerConfig {
            db_path: temp_dir.path().join("usuarios.db"),
            limits,
            ..ServerConfig::default()
        };

        let store = SqliteStore::new(&config.db_path).expect("open store");
        store.initialize().expect("initialize store");
        if let Some(role) = role {
            store.set_role(&Role::new(role)).expect("seed role");
        }

        let state = Arc::new(AppState::new(Arc::new(store), &config));
        let router = create_router(Arc::clone(&state));

        Self {
            temp_dir,
            state,
            router,
        }
    }

    pub async fn send(&self, request: Request<Body>, ip: IpAddr) -> TestResponse {
        let mut request = request;
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::new(ip, 40_000)));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        ip: IpAddr,
    ) -> TestResponse {
        let builder = Request::builder().method(method).uri(path);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        self.send(request, ip).await
    }

    pub async fn list_names(&self) -> Vec<String> {
        let response = self
            .request(Method::GET, "/api/usuarios", None, client(250))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        response
            .body
            .as_array()
            .expect("usuarios array")
            .iter()
            .map(|u| u["name"].as_str().expect("name").to_string())
            .collect()
    }
}
