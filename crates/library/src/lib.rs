//! The library: which archives have been imported, how far each one has been
//! read, and the display preference.
//!
//! Everything is persisted through a [`Gateway`](koma_storage::Gateway) as
//! small versioned JSON documents; see [`LibraryStore`].

pub mod error;
pub mod models;
pub mod remote;
mod schema;
mod store;

pub use crate::models::{ProgressRecord, Theme};
pub use crate::store::{KEY_LIBRARY, KEY_PROGRESS, KEY_THEME, LibraryStore};
