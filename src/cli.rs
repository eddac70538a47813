//! Command-line surface of the plugin.
//!
//! Every flag can also be supplied through a `PLUGIN_*` environment variable, which
//! is how CI runners pass plugin settings. [`run`] is shared by `main` and the
//! integration tests.

use anyhow::{Context, Result};
use clap::Parser;

use crate::load_config::load_config;
use crate::swift::SwiftConnector;
use crate::upload::upload;

/// Upload build artifacts to an OpenStack Swift container.
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "swift-upload",
    version,
    about = "Upload files matching a glob pattern to an OpenStack Swift container"
)]
pub struct Cli {
    /// Authentication URL of the Swift / Keystone endpoint
    #[clap(long, env = "PLUGIN_ENDPOINT")]
    pub endpoint: String,

    /// Swift user name
    #[clap(long, env = "PLUGIN_ACCESS_KEY")]
    pub access_key: String,

    /// Swift API key or password
    #[clap(long, env = "PLUGIN_SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    /// Destination container
    #[clap(long, env = "PLUGIN_CONTAINER")]
    pub container: String,

    /// Authentication protocol: 1 (legacy), 2 (Keystone v2) or 3 (Keystone v3).
    /// 0 is accepted and treated as 1; the version is never guessed from the endpoint.
    #[clap(long, env = "PLUGIN_AUTH_VERSION", default_value_t = 1)]
    pub auth_version: u32,

    /// Region, required when auth-version > 1
    #[clap(long, env = "PLUGIN_REGION")]
    pub region: Option<String>,

    /// Tenant (project) name, required when auth-version > 1
    #[clap(long, env = "PLUGIN_TENANT")]
    pub tenant: Option<String>,

    /// Connection timeout, e.g. `30s` or `1m`
    #[clap(long, env = "PLUGIN_TIMEOUT")]
    pub timeout: Option<String>,

    /// Glob pattern of the files to upload, e.g. `dist/**/*.tar.gz`
    #[clap(long, env = "PLUGIN_SOURCE")]
    pub source: String,

    /// Glob patterns of files to leave out, separated by commas.
    /// Values are split on every comma, so `{a,b}` alternations cannot be used here.
    #[clap(long, env = "PLUGIN_EXCLUDE", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Remote folder the files are uploaded into
    #[clap(long, env = "PLUGIN_TARGET", default_value = "")]
    pub target: String,

    /// Prefix removed from local paths before they are joined to the target
    #[clap(long, env = "PLUGIN_STRIP_PREFIX", default_value = "")]
    pub strip_prefix: String,

    /// Accepted for compatibility; recursion is expressed with `**` in the source pattern
    #[clap(long, env = "PLUGIN_RECURSIVE")]
    pub recursive: bool,

    /// Log what would be uploaded without writing anything
    #[clap(long, env = "PLUGIN_DRY_RUN")]
    pub dry_run: bool,

    /// Keep uploading the remaining files when one fails
    #[clap(long, env = "PLUGIN_CONTINUE_ON_ERROR")]
    pub continue_on_error: bool,

    /// Succeed without uploading when the source pattern matches nothing
    #[clap(long, env = "PLUGIN_ALLOW_EMPTY")]
    pub allow_empty: bool,
}

/// Async CLI entrypoint for `main` and integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "swift-upload starting");

    let request = load_config(cli);
    let connector = SwiftConnector::new();

    let report = upload(&request, &connector)
        .await
        .with_context(|| format!("upload to container {:?} failed", request.container))?;

    if !report.failed.is_empty() {
        tracing::warn!(failed = report.failed.len(), "Some files failed to upload");
    }
    tracing::debug!(?report, "Upload report");
    Ok(())
}
