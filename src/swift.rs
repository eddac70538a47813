//! OpenStack Swift implementation of the storage contract.
//!
//! Supports the legacy v1 handshake (`X-Auth-User` / `X-Auth-Key`) as well as
//! Keystone v2 and v3 password authentication. Objects are written with a single
//! chunked `PUT` whose body is fed through a bounded channel by [`SwiftObjectWriter`].

use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::SinkExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ConnectionSettings;
use crate::contract::{Connection, Connector, ObjectWriter, StorageError};

const USER_AGENT: &str = concat!("swift-upload/", env!("CARGO_PKG_VERSION"));

/// Chunks buffered between the file reader and the HTTP body.
const BODY_CHANNEL_DEPTH: usize = 8;

const OBJECT_STORE: &str = "object-store";
const DEFAULT_DOMAIN: &str = "Default";

/// Authenticates against Swift and hands out [`SwiftConnection`]s.
#[derive(Debug, Default, Clone)]
pub struct SwiftConnector;

impl SwiftConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for SwiftConnector {
    async fn authenticate(
        &self,
        settings: &ConnectionSettings,
    ) -> Result<Box<dyn Connection>, StorageError> {
        if settings.auth_version > 1 && !has_scope(settings) {
            return Err(StorageError::MissingScope(settings.auth_version));
        }

        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = settings.timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build()?;

        let session = match settings.auth_version {
            0 | 1 => auth_v1(&client, settings).await?,
            2 => auth_v2(&client, settings).await?,
            3 => auth_v3(&client, settings).await?,
            other => return Err(StorageError::UnsupportedAuthVersion(other)),
        };

        info!(
            auth_version = settings.auth_version,
            storage_url = %session.storage_url,
            "Authenticated with Swift"
        );
        Ok(Box::new(SwiftConnection {
            client,
            storage_url: session.storage_url,
            token: session.token,
        }))
    }
}

fn has_scope(settings: &ConnectionSettings) -> bool {
    let filled = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
    filled(&settings.region) && filled(&settings.tenant)
}

struct Session {
    storage_url: String,
    token: String,
}

fn with_timeout(request: RequestBuilder, timeout: Option<Duration>) -> RequestBuilder {
    match timeout {
        Some(timeout) => request.timeout(timeout),
        None => request,
    }
}

fn check_auth_status(response: &Response) -> Result<(), StorageError> {
    match response.status() {
        status if status.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(StorageError::Unauthorized(response.status().to_string()))
        }
        status => Err(StorageError::UnexpectedStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        }),
    }
}

fn header(response: &Response, name: &'static str) -> Result<String, StorageError> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or(StorageError::MissingHeader { header: name })
}

async fn auth_v1(client: &Client, settings: &ConnectionSettings) -> Result<Session, StorageError> {
    debug!(endpoint = %settings.endpoint, "Swift v1 authentication");
    let request = client
        .get(&settings.endpoint)
        .header("X-Auth-User", &settings.access_key)
        .header("X-Auth-Key", &settings.secret_key);
    let response = with_timeout(request, settings.timeout).send().await?;
    check_auth_status(&response)?;

    Ok(Session {
        storage_url: header(&response, "X-Storage-Url")?,
        token: header(&response, "X-Auth-Token")?,
    })
}

// Keystone v2 payloads.

#[derive(Serialize)]
struct V2Request<'a> {
    auth: V2Auth<'a>,
}

#[derive(Serialize)]
struct V2Auth<'a> {
    #[serde(rename = "passwordCredentials")]
    password_credentials: V2Credentials<'a>,
    #[serde(rename = "tenantName")]
    tenant_name: &'a str,
}

#[derive(Serialize)]
struct V2Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct V2Response {
    access: V2Access,
}

#[derive(Deserialize)]
struct V2Access {
    token: V2Token,
    #[serde(rename = "serviceCatalog", default)]
    service_catalog: Vec<V2Service>,
}

#[derive(Deserialize)]
struct V2Token {
    id: String,
}

#[derive(Deserialize)]
struct V2Service {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    endpoints: Vec<V2Endpoint>,
}

#[derive(Deserialize)]
struct V2Endpoint {
    #[serde(default)]
    region: String,
    #[serde(rename = "publicURL")]
    public_url: String,
}

async fn auth_v2(client: &Client, settings: &ConnectionSettings) -> Result<Session, StorageError> {
    let url = format!("{}/tokens", settings.endpoint.trim_end_matches('/'));
    let region = settings.region.as_deref().unwrap_or_default();
    debug!(url = %url, region = %region, "Keystone v2 authentication");

    let body = V2Request {
        auth: V2Auth {
            password_credentials: V2Credentials {
                username: &settings.access_key,
                password: &settings.secret_key,
            },
            tenant_name: settings.tenant.as_deref().unwrap_or_default(),
        },
    };
    let response = with_timeout(client.post(&url).json(&body), settings.timeout)
        .send()
        .await?;
    check_auth_status(&response)?;
    let parsed: V2Response = response.json().await?;

    let storage_url = parsed
        .access
        .service_catalog
        .into_iter()
        .filter(|service| service.kind == OBJECT_STORE)
        .flat_map(|service| service.endpoints)
        .find(|endpoint| endpoint.region == region)
        .map(|endpoint| endpoint.public_url)
        .ok_or_else(|| StorageError::NoEndpoint {
            region: region.to_string(),
        })?;

    Ok(Session {
        storage_url,
        token: parsed.access.token.id,
    })
}

// Keystone v3 payloads.

#[derive(Serialize)]
struct V3Request<'a> {
    auth: V3Auth<'a>,
}

#[derive(Serialize)]
struct V3Auth<'a> {
    identity: V3Identity<'a>,
    scope: V3Scope<'a>,
}

#[derive(Serialize)]
struct V3Identity<'a> {
    methods: [&'a str; 1],
    password: V3Password<'a>,
}

#[derive(Serialize)]
struct V3Password<'a> {
    user: V3User<'a>,
}

#[derive(Serialize)]
struct V3User<'a> {
    name: &'a str,
    password: &'a str,
    domain: V3Domain<'a>,
}

#[derive(Serialize)]
struct V3Scope<'a> {
    project: V3Project<'a>,
}

#[derive(Serialize)]
struct V3Project<'a> {
    name: &'a str,
    domain: V3Domain<'a>,
}

#[derive(Serialize)]
struct V3Domain<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct V3Response {
    token: V3Token,
}

#[derive(Deserialize)]
struct V3Token {
    #[serde(default)]
    catalog: Vec<V3Service>,
}

#[derive(Deserialize)]
struct V3Service {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    endpoints: Vec<V3Endpoint>,
}

#[derive(Deserialize)]
struct V3Endpoint {
    interface: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    region_id: String,
    url: String,
}

async fn auth_v3(client: &Client, settings: &ConnectionSettings) -> Result<Session, StorageError> {
    let url = format!("{}/auth/tokens", settings.endpoint.trim_end_matches('/'));
    let region = settings.region.as_deref().unwrap_or_default();
    debug!(url = %url, region = %region, "Keystone v3 authentication");

    let body = V3Request {
        auth: V3Auth {
            identity: V3Identity {
                methods: ["password"],
                password: V3Password {
                    user: V3User {
                        name: &settings.access_key,
                        password: &settings.secret_key,
                        domain: V3Domain { name: DEFAULT_DOMAIN },
                    },
                },
            },
            scope: V3Scope {
                project: V3Project {
                    name: settings.tenant.as_deref().unwrap_or_default(),
                    domain: V3Domain { name: DEFAULT_DOMAIN },
                },
            },
        },
    };
    let response = with_timeout(client.post(&url).json(&body), settings.timeout)
        .send()
        .await?;
    check_auth_status(&response)?;
    let token = header(&response, "X-Subject-Token")?;
    let parsed: V3Response = response.json().await?;

    let storage_url = parsed
        .token
        .catalog
        .into_iter()
        .filter(|service| service.kind == OBJECT_STORE)
        .flat_map(|service| service.endpoints)
        .find(|endpoint| {
            endpoint.interface == "public"
                && (endpoint.region == region || endpoint.region_id == region)
        })
        .map(|endpoint| endpoint.url)
        .ok_or_else(|| StorageError::NoEndpoint {
            region: region.to_string(),
        })?;

    Ok(Session { storage_url, token })
}

/// Authenticated Swift session.
#[derive(Debug)]
pub struct SwiftConnection {
    client: Client,
    storage_url: String,
    token: String,
}

impl SwiftConnection {
    /// `{storage_url}/{container}/{object}`, each object segment percent-encoded.
    fn object_url(&self, container: &str, object: &str) -> Result<Url, StorageError> {
        let invalid = || StorageError::InvalidUrl {
            url: self.storage_url.clone(),
        };
        let mut url = Url::parse(&self.storage_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push(container)
            .extend(object.split('/'));
        Ok(url)
    }
}

#[async_trait]
impl Connection for SwiftConnection {
    async fn create_object(
        &self,
        container: &str,
        object: &str,
        content_type: &str,
    ) -> Result<Box<dyn ObjectWriter>, StorageError> {
        let url = self.object_url(container, object)?;
        let (sender, receiver) = mpsc::channel::<Result<Vec<u8>, std::io::Error>>(BODY_CHANNEL_DEPTH);

        let request = self
            .client
            .put(url.clone())
            .header("X-Auth-Token", &self.token)
            .header(CONTENT_TYPE, content_type)
            .body(reqwest::Body::wrap_stream(receiver));
        let response = tokio::spawn(async move { request.send().await });

        Ok(Box::new(SwiftObjectWriter {
            url: url.to_string(),
            sender: Some(sender),
            response: Some(response),
        }))
    }
}

/// Streams one object body into an in-flight `PUT`.
///
/// Dropping the writer before [`ObjectWriter::close`] aborts the request, so an
/// interrupted copy never commits a truncated object.
pub struct SwiftObjectWriter {
    url: String,
    sender: Option<mpsc::Sender<Result<Vec<u8>, std::io::Error>>>,
    response: Option<JoinHandle<Result<Response, reqwest::Error>>>,
}

impl SwiftObjectWriter {
    async fn finish(&mut self) -> Result<(), StorageError> {
        let handle = self.response.take().ok_or(StorageError::StreamClosed)?;
        let response = handle
            .await
            .map_err(|err| StorageError::Other(format!("upload task failed: {err}")))??;

        let status = response.status();
        if status.is_success() {
            debug!(url = %self.url, status = %status, "Object stored");
            Ok(())
        } else {
            Err(StorageError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            })
        }
    }
}

#[async_trait]
impl ObjectWriter for SwiftObjectWriter {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        let sender = self.sender.as_mut().ok_or(StorageError::StreamClosed)?;
        if sender.send(Ok(chunk.to_vec())).await.is_ok() {
            return Ok(());
        }
        // The request stopped reading its body; report why.
        self.sender = None;
        match self.finish().await {
            Err(err) => Err(err),
            Ok(()) => Err(StorageError::StreamClosed),
        }
    }

    async fn close(&mut self) -> Result<(), StorageError> {
        self.sender.take();
        self.finish().await
    }
}

impl Drop for SwiftObjectWriter {
    fn drop(&mut self) {
        if let Some(handle) = self.response.take() {
            handle.abort();
        }
    }
}
