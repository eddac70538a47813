#![doc = "swift-upload: publish build artifacts to an OpenStack Swift container."]

//! The pipeline resolves a source glob (minus exclude globs) into local files,
//! detects each file's content type, derives its object key and streams it into
//! the configured container. Storage access goes through the traits in
//! [`contract`], with [`swift`] as the production implementation.

pub mod cli;
pub mod config;
pub mod content_type;
pub mod contract;
pub mod error;
pub mod load_config;
pub mod matches;
pub mod swift;
pub mod target;
pub mod upload;

pub use cli::{run, Cli};
pub use config::{ConnectionSettings, FailurePolicy, UploadRequest};
pub use error::{ResolveError, UploadError};
pub use upload::{upload, UploadReport};
