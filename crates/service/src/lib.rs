//! Service layer providing owner-scoped CRUD over durable todo records.
//! - Separates business rules from the storage substrate (`storage::OrderedMap`).
//! - Reuses validation and entity definitions in `models` crate.
//! - Every operation returns a typed `ServiceError` instead of panicking.

pub mod errors;
pub mod pagination;
pub mod storage;
pub mod todo;
