//! Namespaced key/value persistence.
//!
//! [`StorageBackend`] is the raw key/value store (in memory, on the local
//! filesystem, ...); [`Gateway`] binds one to a namespace so that unrelated
//! data sharing the same backend can't collide with ours.

pub mod backend;
pub mod error;
mod gateway;
mod key;

pub use crate::backend::StorageBackend;
pub use crate::gateway::{DEFAULT_NAMESPACE, Gateway};
pub use crate::key::{SEPARATOR, validate as validate_key};
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
