//! Comic archive ingestion.
//!
//! A comic archive (CBZ) is a zip container of sequentially named images.
//! [`Extractor::extract`] validates the container, keeps the image entries,
//! orders them naturally (`page2` before `page10`) and leases one
//! [`PageResource`] per page from a [`ResourcePool`].
//!
//! The crate also owns the models shared by the rest of the workspace:
//! [`MangaRecord`](models::MangaRecord), [`Page`](models::Page) and
//! [`Timestamp`](models::Timestamp).

pub mod clock;
mod compare;
mod consts;
pub mod error;
mod extract;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod models;
mod resource;

pub use crate::clock::{Clock, ClockHandle, ManualClock, SystemClock};
pub use crate::compare::natural_cmp;
pub use crate::consts::ARCHIVE_EXTENSION;
pub use crate::extract::{Extraction, Extractor, accepts_file_name};
pub use crate::resource::{PageResource, ResourceId, ResourcePool};

use crate::error::Result;
use tracing::instrument;

/// Easy, top-level entrypoint: extract an archive with a fresh
/// [`ResourcePool`] and the system clock. See [`Extractor`] for details.
#[instrument(skip(bytes), fields(archive_size = bytes.as_ref().len()))]
pub fn extract(file_name: &str, bytes: impl AsRef<[u8]>) -> Result<Extraction> {
    Extractor::default().extract(file_name, bytes.as_ref())
}
