use std::time::Duration;

/// Tunables of a [`ReaderSession`](crate::ReaderSession).
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderSettings {
    /// Inactivity before the controls hide themselves.
    pub controls_timeout: Duration,
    pub tap: TapZones,
    pub swipe: SwipeThresholds,
}
impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            controls_timeout: Duration::from_millis(3000),
            tap: TapZones::default(),
            swipe: SwipeThresholds::default(),
        }
    }
}

/// Horizontal tap zones, as fractions of the element width.
///
/// Left of `previous` goes back a page, right of `next` goes forward, and
/// anything in between toggles the controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapZones {
    pub previous: f64,
    pub next: f64,
}
impl Default for TapZones {
    fn default() -> Self {
        Self { previous: 0.3, next: 0.7 }
    }
}

/// What a touch has to do to count as a swipe (or as a drag).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeThresholds {
    /// Minimum horizontal travel, in pixels.
    pub min_distance: f64,
    /// A swipe must end before this much time has passed.
    pub max_duration: Duration,
    /// Travel on either axis past which a non-swipe touch is a drag, not a tap.
    pub drag_threshold: f64,
}
impl Default for SwipeThresholds {
    fn default() -> Self {
        Self {
            min_distance: 50.0,
            max_duration: Duration::from_millis(600),
            drag_threshold: 10.0,
        }
    }
}
