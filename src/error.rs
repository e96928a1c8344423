use thiserror::Error;

/// Errors raised at the crate's file and parsing boundaries. The tracking
/// and counting core itself is infallible: bad observations are dropped,
/// capacity pressure is resolved by eviction, and an empty frame is a
/// normal no-detections frame.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown nut class label: {0:?}")]
    UnknownClass(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
