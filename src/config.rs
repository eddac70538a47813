use std::time::Duration;

use tracing::{debug, info};

/// Everything a single upload run needs. Built once by
/// [`crate::load_config::load_config`] and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub connection: ConnectionSettings,
    /// Destination container.
    pub container: String,
    /// Include glob, e.g. `dist/**/*.tar.gz`.
    pub source: String,
    /// Exclude globs; any path they match is dropped from the include set.
    pub exclude: Vec<String>,
    /// Remote prefix, already stripped of its leading `/`.
    pub target: String,
    /// Literal prefix removed from each local path before it is joined to `target`.
    pub strip_prefix: String,
    pub dry_run: bool,
    pub on_error: FailurePolicy,
    /// Treat an empty match set as a successful run with nothing to upload.
    pub allow_empty: bool,
}

impl UploadRequest {
    pub fn trace_loaded(&self) {
        info!(
            endpoint = %self.connection.endpoint,
            container = %self.container,
            source = %self.source,
            excludes = self.exclude.len(),
            target = %self.target,
            dry_run = self.dry_run,
            "Loaded upload request"
        );
        debug!(on_error = ?self.on_error, allow_empty = self.allow_empty, "Upload policies");
    }
}

/// Authentication parameters handed to a [`crate::contract::Connector`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub auth_version: u32,
    /// Only forwarded when `auth_version > 1`.
    pub region: Option<String>,
    /// Only forwarded when `auth_version > 1`.
    pub tenant: Option<String>,
    /// Bounds connection establishment and the auth request.
    pub timeout: Option<Duration>,
}

// Keeps the secret out of logs.
impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("auth_version", &self.auth_version)
            .field("region", &self.region)
            .field("tenant", &self.tenant)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// What to do when a single file fails to upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the run at the first failing file.
    #[default]
    Abort,
    /// Log the failure, record it in the report and move on.
    Continue,
}
