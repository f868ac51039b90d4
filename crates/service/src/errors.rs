use thiserror::Error;

use models::ModelError;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ModelError),
    #[error("a todo with id={0} not found")]
    NotFound(String),
    #[error("caller is not the owner of todo {0}")]
    NotOwner(String),
    #[error("one of the indexes is out of bounds (start={start}, end={end}, len={len})")]
    IndexOutOfBounds { start: u64, end: u64, len: u64 },
    #[error("the start index {start} can't be greater than the end index {end}")]
    InvalidRange { start: u64, end: u64 },
    #[error("page spans {requested} items; at most {max} can be fetched at a time")]
    PageTooLarge { requested: u64, max: u64 },
    #[error("todo with id={0} has already been completed")]
    AlreadyCompleted(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ServiceError {
    pub fn not_found(id: &str) -> Self { Self::NotFound(id.to_string()) }

    pub fn not_owner(id: &str) -> Self { Self::NotOwner(id.to_string()) }

    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(ModelError::EmptyTitle) => "empty_title",
            ServiceError::Validation(ModelError::EmptyBody) => "empty_body",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::NotOwner(_) => "not_owner",
            ServiceError::AlreadyCompleted(_) => "already_completed",
            ServiceError::IndexOutOfBounds { .. } => "index_out_of_bounds",
            ServiceError::InvalidRange { .. } => "invalid_range",
            ServiceError::PageTooLarge { .. } => "page_too_large",
            ServiceError::Storage(e) if e.is_capacity() => "capacity",
            ServiceError::Storage(_) => "storage",
        }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(ModelError::EmptyTitle) => 1001,
            ServiceError::Validation(ModelError::EmptyBody) => 1002,
            ServiceError::NotFound(_) => 1101,
            ServiceError::NotOwner(_) => 1102,
            ServiceError::AlreadyCompleted(_) => 1103,
            ServiceError::IndexOutOfBounds { .. } => 1201,
            ServiceError::InvalidRange { .. } => 1202,
            ServiceError::PageTooLarge { .. } => 1203,
            ServiceError::Storage(e) => e.code(),
        }
    }
}
