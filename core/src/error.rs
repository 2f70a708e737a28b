//! Error types for every layer: backend primitives, profile persistence,
//! settings, and reconciliation.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::topology::ModeKind;


/// Failure reported by a `DisplayBackend` primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// A native call returned a non-success status.
    #[error("{call} failed: {code}")]
    Call { call: &'static str, code: i64 },
    #[error("display configuration is not supported on this platform")]
    Unsupported,
}

impl BackendError {
    pub fn call(call: &'static str, code: impl Into<i64>) -> Self {
        BackendError::Call {
            call,
            code: code.into(),
        }
    }
}


#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile path is empty")]
    EmptyPath,
    #[error("profile path must be a file")]
    NotAFile,
    #[error("resolve home dir: no profile directory configured")]
    NoProfileDir,
    #[error("create profile dir: {0}")]
    CreateDir(#[source] std::io::Error),
    #[error("read profile: {0}")]
    Read(#[source] std::io::Error),
    #[error("parse profile: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("serialize profile: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("write profile: {0}")]
    Write(#[source] std::io::Error),
    #[error("parse profile: mode {index} has unknown infoType {info_type}")]
    UnknownModeType { index: usize, info_type: u32 },
    #[error("parse profile: {kind} mode {index} has no mode body")]
    MissingModeBody { index: usize, kind: ModeKind },
}


#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read settings {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse settings {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}


#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("get current display settings: {0}")]
    Query(#[source] BackendError),
    #[error("path {path} {slot} mode index {index} does not resolve to a {expected} mode")]
    InvalidModeReference {
        path: usize,
        slot: &'static str,
        index: usize,
        expected: ModeKind,
    },
    #[error("no available targets to apply after filtering missing targets")]
    NothingToApply,
    #[error("SetDisplayConfig failed: {0}")]
    ApplyFailed(#[source] BackendError),
    #[error("SetDisplayConfig failed (alternative): {0}")]
    AlternativeApplyFailed(#[source] BackendError),
}


/// Top-level error for runtime operations.
#[derive(Debug, Error)]
pub enum SwitchError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error("get display settings: {0}")]
    Backend(#[from] BackendError),
}
