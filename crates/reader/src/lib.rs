//! The reader: one [`ReaderSession`] owns the open archive and turns user
//! input (taps, swipes, keys) into navigation, committing progress to the
//! [`LibraryStore`](koma_library::LibraryStore) on every page change.
//!
//! The session is single-threaded and event driven: every method runs to
//! completion before the next event is handled. The only suspending
//! operation is archive loading, see [`ReaderSession::begin_load`].

pub mod error;
mod fullscreen;
mod input;
mod keys;
mod load;
mod session;
mod settings;
mod view;

pub use crate::fullscreen::{Fullscreen, ManualFullscreen};
pub use crate::input::{Gesture, SwipeDirection, TapZone};
pub use crate::keys::{Key, KeyResponse};
pub use crate::load::{LoadOutcome, PendingLoad};
pub use crate::session::ReaderSession;
pub use crate::settings::{ReaderSettings, SwipeThresholds, TapZones};
pub use crate::view::{ReaderViewState, SessionState, ViewMode, Zoom};
