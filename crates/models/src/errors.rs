use thiserror::Error;

/// Payload validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("empty title")]
    EmptyTitle,
    #[error("empty body")]
    EmptyBody,
}
