//! # contract: storage capability consumed by the uploader
//!
//! The upload pipeline never talks HTTP directly. It authenticates through a
//! [`Connector`], receives a [`Connection`] for the rest of the run, and asks
//! that connection for one [`ObjectWriter`] per file.
//!
//! ## Implementations
//! - [`crate::swift::SwiftConnector`] talks to OpenStack Swift (v1 auth, Keystone v2/v3).
//! - Tests use the `mockall` mocks generated below, or a recording fake.
//!
//! ## Mocking & Testing
//! The traits are annotated for `mockall`. The mocks are exported under the
//! `test-export-mocks` feature (on by default) so integration tests can use them.

use async_trait::async_trait;
use mockall::automock;

use crate::config::ConnectionSettings;

/// Errors surfaced by a storage client.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("authentication rejected: {0}")]
    Unauthorized(String),

    #[error("auth version {0} requires both region and tenant")]
    MissingScope(u32),

    #[error("unsupported auth version {0}")]
    UnsupportedAuthVersion(u32),

    #[error("no object-store endpoint in service catalog for region {region:?}")]
    NoEndpoint { region: String },

    #[error("missing {header} header in authentication response")]
    MissingHeader { header: &'static str },

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid storage url {url}")]
    InvalidUrl { url: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("object stream already closed")]
    StreamClosed,

    #[error("{0}")]
    Other(String),
}

/// Establishes an authenticated session with the storage service.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Run the authentication handshake described by `settings`.
    ///
    /// Called exactly once per upload run.
    async fn authenticate(
        &self,
        settings: &ConnectionSettings,
    ) -> Result<Box<dyn Connection>, StorageError>;
}

/// An authenticated session. Shared by reference across every upload of a run.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Connection: Send + Sync {
    /// Open a write stream for `object` in `container`.
    ///
    /// The object only exists once [`ObjectWriter::close`] succeeds.
    async fn create_object(
        &self,
        container: &str,
        object: &str,
        content_type: &str,
    ) -> Result<Box<dyn ObjectWriter>, StorageError>;
}

/// Sequential byte sink for a single object.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectWriter: Send {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), StorageError>;

    /// Finalize the object. Dropping a writer without closing it abandons the object.
    async fn close(&mut self) -> Result<(), StorageError>;
}
