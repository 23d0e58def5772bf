//! # simactive-shared
//!
//! Types shared by every simactive crate: the entity model, the error
//! taxonomy raised by the repository layer, and the per-operation
//! [`Context`] carrying deadlines and cancellation.

pub mod constants;
pub mod context;
pub mod error;
pub mod types;

pub use context::Context;
pub use error::{ContextError, ErrorKind, RepoError, RepoResult};
pub use types::*;
