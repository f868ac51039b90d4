//! Owned todo records: the record store and its collaborators.

pub mod context;
pub mod service;

pub use context::{Clock, IdGenerator, SystemClock, UuidGenerator};
pub use service::{Tenancy, TodoService};
