//! Shared mock backends for integration tests.
//!
//! Both mocks are axum apps bound to ephemeral ports on 127.0.0.1.

#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use axum::{
    extract::{Path as UrlPath, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use schema_proxy::config::{ProxyConfig, SchemaSettings, UpstreamConfig};
use schema_proxy::lifecycle::bootstrap;
use schema_proxy::schema::MetadataClient;
use schema_proxy::{HttpServer, Shutdown};

pub const BASE_ID: &str = "p1";
pub const TOKEN: &str = "backend-token";

/// Serve `router` on an ephemeral port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

#[derive(Debug, Clone)]
pub struct MockTable {
    pub id: String,
    pub title: String,
    pub table_name: String,
    /// (field id, title) of link columns.
    pub links: Vec<(String, String)>,
}

impl MockTable {
    pub fn new(id: &str, title: &str, table_name: &str) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            table_name: table_name.into(),
            links: Vec::new(),
        }
    }

    pub fn with_link(mut self, id: &str, title: &str) -> Self {
        self.links.push((id.into(), title.into()));
        self
    }
}

/// Products (T1, link field F1 "Related Orders") and Orders (T2).
pub fn default_tables() -> Vec<MockTable> {
    vec![
        MockTable::new("T1", "Products", "nc_products").with_link("F1", "Related Orders"),
        MockTable::new("T2", "Orders", "nc_orders"),
    ]
}

#[derive(Clone, Default)]
struct MetaState {
    tables: Arc<RwLock<Vec<MockTable>>>,
    failing: Arc<AtomicBool>,
    malformed: Arc<AtomicBool>,
    failing_details: Arc<RwLock<HashSet<String>>>,
    list_calls: Arc<AtomicUsize>,
}

/// Mock metadata API.
pub struct MockMeta {
    pub addr: SocketAddr,
    state: MetaState,
}

impl MockMeta {
    pub async fn start(tables: Vec<MockTable>) -> Self {
        let state = MetaState::default();
        *state.tables.write().unwrap() = tables;

        let router = Router::new()
            .route("/api/v2/meta/bases/{base}/tables", get(list_tables))
            .route("/api/v2/meta/tables/{id}", get(table_detail))
            .with_state(state.clone());

        Self {
            addr: spawn(router).await,
            state,
        }
    }

    pub fn meta_url(&self) -> String {
        format!("http://{}/api/v2/", self.addr)
    }

    pub fn set_tables(&self, tables: Vec<MockTable>) {
        *self.state.tables.write().unwrap() = tables;
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Answer the table list with 200 and a body that is not a table list.
    pub fn set_malformed(&self, malformed: bool) {
        self.state.malformed.store(malformed, Ordering::SeqCst);
    }

    pub fn fail_details_for(&self, table_id: &str) {
        self.state.failing_details.write().unwrap().insert(table_id.to_string());
    }

    pub fn list_calls(&self) -> usize {
        self.state.list_calls.load(Ordering::SeqCst)
    }

    pub fn client(&self) -> MetadataClient {
        let upstream = UpstreamConfig {
            meta_url: Some(self.meta_url()),
            base_id: BASE_ID.to_string(),
            token: TOKEN.to_string(),
            ..UpstreamConfig::default()
        };
        MetadataClient::new(&upstream, &SchemaSettings::default()).unwrap()
    }
}

async fn list_tables(
    State(state): State<MetaState>,
    UrlPath(base): UrlPath<String>,
    headers: HeaderMap,
) -> Response {
    state.list_calls.fetch_add(1, Ordering::SeqCst);
    if state.failing.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "metadata unavailable").into_response();
    }
    if base != BASE_ID || headers.get("xc-token").map(|v| v.as_bytes()) != Some(TOKEN.as_bytes()) {
        return (StatusCode::UNAUTHORIZED, "bad base or token").into_response();
    }
    if state.malformed.load(Ordering::SeqCst) {
        return Json(json!({ "msg": "maintenance" })).into_response();
    }

    let tables = state.tables.read().unwrap().clone();
    let list: Vec<Value> = tables
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "title": t.title,
                "table_name": t.table_name,
            })
        })
        .collect();
    Json(json!({ "list": list })).into_response()
}

async fn table_detail(State(state): State<MetaState>, UrlPath(id): UrlPath<String>) -> Response {
    if state.failing.load(Ordering::SeqCst) || state.failing_details.read().unwrap().contains(&id) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "detail unavailable").into_response();
    }

    let tables = state.tables.read().unwrap().clone();
    let Some(table) = tables.into_iter().find(|t| t.id == id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mut columns = vec![json!({ "id": format!("{}_title", table.id), "title": "Title", "uidt": "SingleLineText" })];
    columns.extend(
        table
            .links
            .iter()
            .map(|(fid, title)| json!({ "id": fid, "title": title, "uidt": "Links" })),
    );
    Json(json!({
        "id": table.id,
        "title": table.title,
        "table_name": table.table_name,
        "columns": columns,
    }))
    .into_response()
}

/// A request as seen by the mock data API.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub uri: String,
    pub headers: HeaderMap,
}

/// Mock data API. Answers every request with `{"ok": true}` and a permissive
/// CORS header the proxy is expected to strip.
pub struct MockData {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockData {
    pub async fn start() -> Self {
        let captured: Arc<Mutex<Vec<CapturedRequest>>> = Arc::default();
        let router = Router::new()
            .fallback(record_request)
            .with_state(Arc::clone(&captured));
        Self {
            addr: spawn(router).await,
            captured,
        }
    }

    pub fn v2_url(&self) -> String {
        format!("http://{}/api/v2/tables/", self.addr)
    }

    pub fn v1_url(&self) -> String {
        format!("http://{}/api/v1/db/data/v1/", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<CapturedRequest> {
        self.captured.lock().unwrap().last().cloned()
    }
}

async fn record_request(
    State(captured): State<Arc<Mutex<Vec<CapturedRequest>>>>,
    request: Request,
) -> Response {
    captured.lock().unwrap().push(CapturedRequest {
        method: request.method().to_string(),
        uri: request.uri().to_string(),
        headers: request.headers().clone(),
    });

    let mut response = Json(json!({ "ok": true })).into_response();
    response
        .headers_mut()
        .insert("access-control-allow-origin", HeaderValue::from_static("*"));
    response
}

/// Proxy config pointing at the mocks.
pub fn proxy_config(meta: &MockMeta, data_url: String, resources: &Path) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstream.data_url = data_url;
    config.upstream.meta_url = Some(meta.meta_url());
    config.upstream.base_id = BASE_ID.to_string();
    config.upstream.token = TOKEN.to_string();
    config.resources.path = resources.to_string_lossy().into_owned();
    config
}

/// A running proxy.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestProxy {
    pub async fn start(config: ProxyConfig) -> Self {
        let shutdown = Shutdown::new();
        let components = bootstrap(config, &shutdown).await.unwrap();
        let server = HttpServer::new(&components).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let signalled = shutdown.signalled();
        tokio::spawn(async move {
            // Keep the watcher and refresh task alive with the server.
            let _components = components;
            let _ = server.run(listener, signalled).await;
        });

        Self { addr, shutdown }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
