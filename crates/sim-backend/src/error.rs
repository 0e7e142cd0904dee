use std::path::PathBuf;
use thiserror::Error;

use crate::BodyId;

pub type Result<T, E = BackendError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("not connected to a physics server")]
    NotConnected,
    #[error("already connected to a physics server")]
    AlreadyConnected,
    #[error("cannot load model, file not found: {}", .0.display())]
    ModelNotFound(PathBuf),
    #[error("unknown body: {0}")]
    UnknownBody(BodyId),
    #[error("joint index {index} out of range for body {body} ({count} joints)")]
    JointOutOfRange {
        body: BodyId,
        index: usize,
        count: usize,
    },
    #[error("length mismatch: expected {expected} values, got {got}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("operation not supported on this backend: {0}")]
    Unsupported(&'static str),
}
