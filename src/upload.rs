//! Top-level upload pipeline: authenticate → resolve → classify → write.
//!
//! [`upload`] drives one run for an [`UploadRequest`]:
//!   - authenticates once through the injected [`Connector`] (failure is fatal)
//!   - resolves the source/exclude globs into candidate paths
//!   - for every candidate file: detects its content type, derives the object key,
//!     logs the planned upload and, unless this is a dry run, streams the file body
//!     into a new object
//!
//! Files are processed strictly one after another, in resolution order.
//!
//! # Error Handling
//! Authentication and resolution errors always abort. A per-file failure aborts under
//! [`FailurePolicy::Abort`] and is recorded in the report under
//! [`FailurePolicy::Continue`]. An empty match set aborts unless `allow_empty` is set.
//!
//! Dry runs emit exactly the same log records as real runs.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info, warn};

use crate::config::{FailurePolicy, UploadRequest};
use crate::content_type::content_type;
use crate::contract::{Connection, Connector};
use crate::error::{ResolveError, UploadError};
use crate::matches::matches;
use crate::target::build_target;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of a completed run.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub uploaded: Vec<UploadedObject>,
    /// Directories returned by the glob expansion.
    pub skipped: Vec<PathBuf>,
    /// Only populated under [`FailurePolicy::Continue`].
    pub failed: Vec<FailedUpload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub source: PathBuf,
    pub target: String,
    pub content_type: String,
    /// `None` for dry runs.
    pub bytes: Option<u64>,
}

#[derive(Debug)]
pub struct FailedUpload {
    pub source: PathBuf,
    pub target: String,
    pub error: UploadError,
}

pub async fn upload<C>(request: &UploadRequest, connector: &C) -> Result<UploadReport, UploadError>
where
    C: Connector + ?Sized,
{
    let connection = match connector.authenticate(&request.connection).await {
        Ok(connection) => connection,
        Err(e) => {
            error!(
                endpoint = %request.connection.endpoint,
                auth_version = request.connection.auth_version,
                error = %e,
                "Authentication failed"
            );
            return Err(UploadError::Auth(e));
        }
    };

    info!(
        region = request.connection.region.as_deref().unwrap_or_default(),
        endpoint = %request.connection.endpoint,
        container = %request.container,
        path = %request.target,
        "Attempting to upload"
    );

    let candidates = match matches(&request.source, &request.exclude) {
        Ok(candidates) => candidates,
        Err(ResolveError::NoMatches { pattern }) if request.allow_empty => {
            warn!(source = %pattern, "No files matched, nothing to upload");
            Vec::new()
        }
        Err(e) => {
            error!(source = %request.source, error = %e, "Failed to resolve source files");
            return Err(e.into());
        }
    };

    let mut report = UploadReport::default();

    for source in candidates {
        if source.is_dir() {
            debug!(path = %source.display(), "Skipping directory");
            report.skipped.push(source);
            continue;
        }

        let content_type = content_type(&source);
        if source.to_str().is_none() {
            warn!(
                source = %source.display(),
                "Source path is not valid UTF-8, invalid bytes are replaced in the object key"
            );
        }
        let target = build_target(
            &source.to_string_lossy(),
            &request.target,
            &request.strip_prefix,
        );

        info!(
            source = %source.display(),
            container = %request.container,
            target = %target,
            content_type = %content_type,
            "Uploading file"
        );

        if request.dry_run {
            report.uploaded.push(UploadedObject {
                source,
                target,
                content_type,
                bytes: None,
            });
            continue;
        }

        let outcome = upload_file(
            connection.as_ref(),
            &request.container,
            &source,
            &target,
            &content_type,
        )
        .await;
        match outcome {
            Ok(bytes) => report.uploaded.push(UploadedObject {
                source,
                target,
                content_type,
                bytes: Some(bytes),
            }),
            Err(e) => {
                error!(
                    source = %source.display(),
                    container = %request.container,
                    target = %target,
                    error = %e,
                    "Upload failed"
                );
                match request.on_error {
                    FailurePolicy::Abort => return Err(e),
                    FailurePolicy::Continue => report.failed.push(FailedUpload {
                        source,
                        target,
                        error: e,
                    }),
                }
            }
        }
    }

    info!(
        uploaded = report.uploaded.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Upload complete"
    );
    Ok(report)
}

/// Streams one local file into a new object and returns the number of bytes sent.
async fn upload_file(
    connection: &dyn Connection,
    container: &str,
    source: &Path,
    target: &str,
    content_type: &str,
) -> Result<u64, UploadError> {
    let mut file = File::open(source).await.map_err(|e| UploadError::Open {
        path: source.to_path_buf(),
        source: e,
    })?;

    let mut writer = connection
        .create_object(container, target, content_type)
        .await
        .map_err(|e| UploadError::Create {
            target: target.to_string(),
            source: e,
        })?;

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut sent: u64 = 0;
    loop {
        let read = file.read(&mut buffer).await.map_err(|e| UploadError::Read {
            path: source.to_path_buf(),
            source: e,
        })?;
        if read == 0 {
            break;
        }
        writer
            .write(&buffer[..read])
            .await
            .map_err(|e| UploadError::Write {
                target: target.to_string(),
                source: e,
            })?;
        sent += read as u64;
    }

    writer.close().await.map_err(|e| UploadError::Close {
        target: target.to_string(),
        source: e,
    })?;
    Ok(sent)
}
