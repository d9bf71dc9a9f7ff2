//! Page resource handles.
//!
//! A [`PageResource`] is the displayable content of one page. Handles are
//! leased from a [`ResourcePool`] which keeps count of how many are alive, so
//! whoever owns a set of pages can prove it gave them all back.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Opaque identifier of a page resource, unique within its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(u64);
impl ResourceId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Hands out [`PageResource`]s and tracks how many are still held.
///
/// Cloning a pool is cheap and every clone shares the same counters.
#[derive(Debug, Clone, Default)]
pub struct ResourcePool {
    live: Arc<AtomicUsize>,
    next_id: Arc<AtomicU64>,
}
impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn acquire(&self, data: Vec<u8>) -> PageResource {
        let id = ResourceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.live.fetch_add(1, Ordering::AcqRel);
        PageResource {
            id,
            data,
            _lease: Lease { live: Arc::clone(&self.live) },
        }
    }

    /// Number of resources acquired from this pool that haven't been released.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

struct Lease {
    live: Arc<AtomicUsize>,
}
impl Drop for Lease {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Handle to the decoded-ready bytes of one page.
///
/// The handle is released when it is dropped; [`release`](Self::release)
/// makes that explicit at the call site.
pub struct PageResource {
    id: ResourceId,
    data: Vec<u8>,
    _lease: Lease,
}
impl PageResource {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn release(self) {
        tracing::trace!(resource = self.id.0, "Releasing page resource");
        drop(self);
    }
}
impl Debug for PageResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PageResource").field("id", &self.id).field("len", &self.data.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_count_follows_handles() {
        let pool = ResourcePool::new();
        let first = pool.acquire(b"one".to_vec());
        let second = pool.acquire(b"two".to_vec());
        assert_eq!(pool.live(), 2);
        assert_ne!(first.id(), second.id());
        first.release();
        assert_eq!(pool.live(), 1);
        drop(second);
        assert_eq!(pool.live(), 0);
    }

    #[test]
    fn test_clones_share_counters() {
        let pool = ResourcePool::new();
        let clone = pool.clone();
        let handle = clone.acquire(Vec::new());
        assert_eq!(pool.live(), 1);
        assert!(handle.is_empty());
    }
}
