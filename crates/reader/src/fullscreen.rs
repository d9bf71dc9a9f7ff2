//! Platform fullscreen capability.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;

/// Whatever can put the reader into fullscreen (a window, a browser
/// document...).
///
/// Requests are only requests: the platform may refuse them or apply them
/// later. The session learns the real state through [`subscribe`](Self::subscribe)
/// and never assumes a request succeeded.
pub trait Fullscreen: Send + Sync {
    fn request_enter(&self);
    fn request_exit(&self);
    /// Current fullscreen state, updated on every change.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// A fullscreen platform driven by hand.
///
/// With [`granting`](Self::granting) every request is applied immediately;
/// with [`deferred`](Self::deferred) requests are only counted and the state
/// changes when [`notify`](Self::notify) says so (like a user pressing the
/// platform's own exit key).
#[derive(Debug)]
pub struct ManualFullscreen {
    state: watch::Sender<bool>,
    grant_requests: bool,
    requests: AtomicUsize,
}
impl ManualFullscreen {
    pub fn granting() -> Self {
        Self::new(true)
    }

    pub fn deferred() -> Self {
        Self::new(false)
    }

    fn new(grant_requests: bool) -> Self {
        Self {
            state: watch::Sender::new(false),
            grant_requests,
            requests: AtomicUsize::new(0),
        }
    }

    /// Report a fullscreen change from the platform's side.
    pub fn notify(&self, fullscreen: bool) {
        self.state.send_replace(fullscreen);
    }

    pub fn is_fullscreen(&self) -> bool {
        *self.state.borrow()
    }

    /// Number of enter/exit requests received so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    fn request(&self, fullscreen: bool) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if self.grant_requests {
            self.notify(fullscreen);
        }
    }
}
impl Fullscreen for ManualFullscreen {
    fn request_enter(&self) {
        self.request(true);
    }

    fn request_exit(&self) {
        self.request(false);
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granting() {
        let platform = ManualFullscreen::granting();
        let rx = platform.subscribe();
        platform.request_enter();
        assert!(*rx.borrow());
        platform.request_exit();
        assert!(!*rx.borrow());
        assert_eq!(platform.requests(), 2);
    }

    #[test]
    fn test_deferred() {
        let platform = ManualFullscreen::deferred();
        let mut rx = platform.subscribe();
        platform.request_enter();
        assert!(!rx.has_changed().unwrap());
        platform.notify(true);
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
    }
}
