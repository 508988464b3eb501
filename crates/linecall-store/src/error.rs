//! Error types for the store layer.

/// Errors from the Redis mirror.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Any Redis failure: connect, command, or decode.
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),
}
