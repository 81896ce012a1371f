use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectError {
    #[error("range start is greater than range end")]
    InvertedRange,
}
