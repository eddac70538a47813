#![allow(dead_code)]

//! In-process fake of the Swift / Keystone endpoints used by the HTTP tests.

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

pub const USER: &str = "ci";
pub const KEY: &str = "secret";
pub const TENANT: &str = "builds";
pub const REGION: &str = "RegionOne";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub container: String,
    pub name: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

#[derive(Clone)]
pub struct FakeSwift {
    pub base_url: String,
    pub objects: Arc<Mutex<Vec<StoredObject>>>,
}

impl FakeSwift {
    pub fn storage_url(&self) -> String {
        format!("{}/v1/AUTH_test", self.base_url)
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }
}

/// Starts the fake on an ephemeral port. The server lives as long as the runtime.
pub async fn spawn_fake_swift() -> FakeSwift {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = FakeSwift {
        base_url: format!("http://{addr}"),
        objects: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .route("/auth/v1.0", get(auth_v1))
        .route("/v2.0/tokens", post(auth_v2))
        .route("/v3/auth/tokens", post(auth_v3))
        .route("/v1/AUTH_test/:container/*object", put(put_object))
        .with_state(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    state
}

async fn auth_v1(State(state): State<FakeSwift>, headers: HeaderMap) -> Response {
    let user = headers.get("X-Auth-User").and_then(|v| v.to_str().ok());
    let key = headers.get("X-Auth-Key").and_then(|v| v.to_str().ok());
    if user != Some(USER) || key != Some(KEY) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    (
        StatusCode::OK,
        [
            ("X-Storage-Url", state.storage_url()),
            ("X-Auth-Token", "tk-v1".to_string()),
        ],
    )
        .into_response()
}

async fn auth_v2(State(state): State<FakeSwift>, Json(body): Json<Value>) -> Response {
    let auth = &body["auth"];
    if auth["passwordCredentials"]["username"] != USER
        || auth["passwordCredentials"]["password"] != KEY
        || auth["tenantName"] != TENANT
    {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "access": {
            "token": { "id": "tk-v2" },
            "serviceCatalog": [
                { "type": "compute", "endpoints": [{ "region": REGION, "publicURL": "http://compute.invalid" }] },
                {
                    "type": "object-store",
                    "endpoints": [
                        { "region": "RegionTwo", "publicURL": "http://elsewhere.invalid/v1/AUTH_x" },
                        { "region": REGION, "publicURL": state.storage_url() }
                    ]
                }
            ]
        }
    }))
    .into_response()
}

async fn auth_v3(State(state): State<FakeSwift>, Json(body): Json<Value>) -> Response {
    let auth = &body["auth"];
    let user = &auth["identity"]["password"]["user"];
    if auth["identity"]["methods"][0] != "password"
        || user["name"] != USER
        || user["password"] != KEY
        || auth["scope"]["project"]["name"] != TENANT
    {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    (
        StatusCode::CREATED,
        [("X-Subject-Token", "tk-v3")],
        Json(json!({
            "token": {
                "catalog": [{
                    "type": "object-store",
                    "endpoints": [
                        { "interface": "internal", "region": REGION, "url": "http://internal.invalid/v1/AUTH_x" },
                        { "interface": "public", "region": REGION, "url": state.storage_url() }
                    ]
                }]
            }
        })),
    )
        .into_response()
}

async fn put_object(
    State(state): State<FakeSwift>,
    Path((container, object)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let token = headers.get("X-Auth-Token").and_then(|v| v.to_str().ok());
    if !matches!(token, Some("tk-v1" | "tk-v2" | "tk-v3")) {
        return StatusCode::UNAUTHORIZED;
    }
    if container == "read-only" {
        return StatusCode::FORBIDDEN;
    }
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.objects.lock().unwrap().push(StoredObject {
        container,
        name: object,
        content_type,
        body: body.to_vec(),
    });
    StatusCode::CREATED
}
