use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BaseError {
    #[error("expiration duration must be positive")]
    NonPositiveDuration,
}
