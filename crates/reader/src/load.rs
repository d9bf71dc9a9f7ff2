//! Archive loading in flight.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use koma_archive::Extraction;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;

/// Holds a session's `loading` flag up while alive.
#[derive(Debug)]
pub(crate) struct LoadingGuard {
    flag: Arc<AtomicBool>,
}
impl LoadingGuard {
    /// `None` if a load is already in flight.
    pub(crate) fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: Arc::clone(flag) })
    }
}
impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// An extraction running off the event loop.
///
/// Returned by [`ReaderSession::begin_load`](crate::ReaderSession::begin_load).
/// Awaiting [`wait`](Self::wait) doesn't borrow the session, so input events
/// can still be handled in the meantime. Dropping it abandons the load: the
/// session stops loading and the extracted pages are released as soon as
/// the task finishes.
#[derive(Debug)]
pub struct PendingLoad {
    file_name: String,
    task: JoinHandle<koma_archive::error::Result<Extraction>>,
    guard: LoadingGuard,
}
impl PendingLoad {
    pub(crate) fn new(
        file_name: String,
        task: JoinHandle<koma_archive::error::Result<Extraction>>,
        guard: LoadingGuard,
    ) -> Self {
        Self { file_name, task, guard }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Wait for the extraction to finish.
    pub async fn wait(self) -> LoadOutcome {
        let result = match self.task.await.or_raise(|| ErrorKind::Interrupted) {
            Ok(Ok(extraction)) => Ok(extraction),
            Ok(Err(e)) => Err(ErrorKind::archive(e)),
            Err(e) => Err(e),
        };
        LoadOutcome {
            file_name: self.file_name,
            result,
            _guard: self.guard,
        }
    }
}

/// A finished extraction, to be handed to
/// [`ReaderSession::complete_load`](crate::ReaderSession::complete_load).
///
/// The session keeps reporting `loading` until the outcome is completed or
/// dropped.
#[derive(Debug)]
pub struct LoadOutcome {
    file_name: String,
    pub(crate) result: Result<Extraction>,
    _guard: LoadingGuard,
}
impl LoadOutcome {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_is_exclusive() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = LoadingGuard::acquire(&flag).unwrap();
        assert!(flag.load(Ordering::Acquire));
        assert!(LoadingGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(!flag.load(Ordering::Acquire));
        assert!(LoadingGuard::acquire(&flag).is_some());
    }
}
