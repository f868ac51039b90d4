//! Domain types shared by the service and server crates.

pub mod errors;
pub mod principal;
pub mod todo;

pub use errors::ModelError;
pub use principal::Principal;
pub use todo::{TodoPayload, TodoRecord};
