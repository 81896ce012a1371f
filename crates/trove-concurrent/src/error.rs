use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConcurrentError {
    #[error("invalid thread name format {0:?}: only `{{}}` placeholders are allowed")]
    InvalidNameFormat(String),

    #[error("thread stack size must be non-zero")]
    ZeroStackSize,

    #[error("queue capacity must be non-zero")]
    ZeroCapacity,

    #[error(transparent)]
    Future(#[from] FutureError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FutureError {
    #[error("future was cancelled")]
    Cancelled,

    #[error("computation failed: {0}")]
    Failed(String),

    #[error("timed out waiting for the result")]
    TimedOut,
}
