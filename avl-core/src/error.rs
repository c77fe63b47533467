use thiserror::Error;

use crate::types::Key;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, AvlError>;

/// Errors surfaced by the tree and the insertion animator.
///
/// Inserting a key that is already present is not an error: the plain
/// insert reports it as `Ok(false)` and the animator plays the rejection.
#[derive(Debug, Error)]
pub enum AvlError {
    #[error("key {0} is outside the supported range 0..100")]
    KeyOutOfRange(Key),
    #[error("tree is full ({capacity} nodes)")]
    CapacityExceeded { capacity: usize },
    #[error("an insertion is already animating")]
    Busy,
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
