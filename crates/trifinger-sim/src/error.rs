use thiserror::Error;

use crate::TimeIndex;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("time index {requested} has to match the current step or the next one (current: {current:?})")]
    InvalidTimeIndex {
        requested: TimeIndex,
        current: Option<TimeIndex>,
    },
    #[error(
        "cameras are not enabled; create the platform with `enable_cameras` set to use camera observations"
    )]
    CamerasDisabled,
    #[error("unknown finger type: {0}")]
    UnknownFingerType(String),
    #[error("link not found in loaded model: {0}")]
    UnknownLinkName(String),
    #[error("action field `{field}` has {got} entries, expected {expected}")]
    ActionDimension {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("backend error: {0}")]
    Backend(#[from] sim_backend::BackendError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
