use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::config::{ConnectionSettings, FailurePolicy, UploadRequest};
use crate::target::normalize_target;

/// Turns parsed flags / `PLUGIN_*` variables into the request consumed by
/// [`crate::upload::upload`].
///
/// Region and tenant are only forwarded for auth versions above 1. A timeout that
/// does not parse is ignored with a warning rather than failing the run.
pub fn load_config(cli: Cli) -> UploadRequest {
    let scoped = cli.auth_version > 1;
    if !scoped && (cli.region.is_some() || cli.tenant.is_some()) {
        debug!(auth_version = cli.auth_version, "Ignoring region/tenant for this auth version");
    }
    if cli.recursive {
        debug!("--recursive has no effect; use ** in --source for recursive matching");
    }

    let request = UploadRequest {
        connection: ConnectionSettings {
            endpoint: cli.endpoint,
            access_key: cli.access_key,
            secret_key: cli.secret_key,
            auth_version: cli.auth_version,
            region: if scoped { Some(cli.region.unwrap_or_default()) } else { None },
            tenant: if scoped { Some(cli.tenant.unwrap_or_default()) } else { None },
            timeout: cli.timeout.as_deref().and_then(parse_timeout),
        },
        container: cli.container,
        source: cli.source,
        exclude: cli.exclude,
        target: normalize_target(&cli.target),
        strip_prefix: cli.strip_prefix,
        dry_run: cli.dry_run,
        on_error: if cli.continue_on_error {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Abort
        },
        allow_empty: cli.allow_empty,
    };

    request.trace_loaded();
    request
}

/// Parses durations such as `30s`, `1m30s` or `2m 15s`.
pub fn parse_timeout(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match humantime::parse_duration(raw) {
        Ok(timeout) => {
            info!(timeout = ?timeout, "Using connection timeout");
            Some(timeout)
        }
        Err(e) => {
            warn!(timeout = %raw, error = %e, "Ignoring malformed timeout");
            None
        }
    }
}
