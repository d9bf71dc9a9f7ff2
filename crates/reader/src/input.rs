//! Pointer and touch classification.
//!
//! Pure functions over coordinates and durations; the session decides what
//! each classification does.

use crate::settings::{SwipeThresholds, TapZones};
use koma_archive::models::Timestamp;
use std::time::Duration;

/// Where a tap landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapZone {
    Previous,
    Middle,
    Next,
}

/// Direction of a swipe, in reading terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Finger moved left: go to the next page.
    Forward,
    /// Finger moved right: go to the previous page.
    Backward,
}

/// What a finished touch turned out to be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Swipe(SwipeDirection),
    /// Moved too far to be a tap, not enough (or too slowly) to be a swipe.
    Drag,
    /// Barely moved; handled like a pointer tap at `x`.
    Tap { x: f64 },
}

impl TapZones {
    pub fn classify(&self, x: f64, width: f64) -> TapZone {
        if width.is_nan() || width <= 0.0 || !x.is_finite() {
            return TapZone::Middle;
        }
        let p = x / width;
        if p > self.next {
            TapZone::Next
        } else if p < self.previous {
            TapZone::Previous
        } else {
            TapZone::Middle
        }
    }
}

impl SwipeThresholds {
    /// Classify a touch from its total displacement and duration. `dragged`
    /// is whether it ever travelled past the drag threshold while moving.
    pub fn classify(&self, dx: f64, dy: f64, dt: Duration, dragged: bool, end_x: f64) -> Gesture {
        if dx.abs() > dy.abs() && dx.abs() > self.min_distance && dt < self.max_duration {
            let direction = if dx < 0.0 { SwipeDirection::Forward } else { SwipeDirection::Backward };
            return Gesture::Swipe(direction);
        }
        if dragged || self.is_drag(dx, dy) {
            return Gesture::Drag;
        }
        Gesture::Tap { x: end_x }
    }

    pub fn is_drag(&self, dx: f64, dy: f64) -> bool {
        dx.abs() > self.drag_threshold || dy.abs() > self.drag_threshold
    }
}

/// Touch in progress.
#[derive(Debug, Clone, Copy)]
struct TouchStart {
    x: f64,
    y: f64,
    at: Timestamp,
}

/// Follows one touch from start to end.
#[derive(Debug, Default)]
pub(crate) struct TouchTracker {
    start: Option<TouchStart>,
    dragged: bool,
}
impl TouchTracker {
    pub(crate) fn start(&mut self, x: f64, y: f64, at: Timestamp) {
        self.start = Some(TouchStart { x, y, at });
        self.dragged = false;
    }

    pub(crate) fn moved(&mut self, x: f64, y: f64, thresholds: &SwipeThresholds) {
        if let Some(start) = self.start {
            self.dragged |= thresholds.is_drag(x - start.x, y - start.y);
        }
    }

    /// Finish the touch; `None` if no touch was started.
    pub(crate) fn end(&mut self, x: f64, y: f64, at: Timestamp, thresholds: &SwipeThresholds) -> Option<Gesture> {
        let start = self.start.take()?;
        let dragged = std::mem::take(&mut self.dragged);
        Some(thresholds.classify(x - start.x, y - start.y, at.since(start.at), dragged, x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(80.0, 100.0, TapZone::Next)]
    #[case(71.0, 100.0, TapZone::Next)]
    #[case(70.0, 100.0, TapZone::Middle)]
    #[case(50.0, 100.0, TapZone::Middle)]
    #[case(30.0, 100.0, TapZone::Middle)]
    #[case(29.0, 100.0, TapZone::Previous)]
    #[case(10.0, 100.0, TapZone::Previous)]
    #[case(10.0, 0.0, TapZone::Middle)]
    #[case(f64::NAN, 100.0, TapZone::Middle)]
    fn test_tap_zones(#[case] x: f64, #[case] width: f64, #[case] expected: TapZone) {
        assert_eq!(TapZones::default().classify(x, width), expected);
    }

    #[rstest]
    #[case(-80.0, 5.0, 300, Gesture::Swipe(SwipeDirection::Forward))]
    #[case(80.0, -5.0, 300, Gesture::Swipe(SwipeDirection::Backward))]
    // Too slow.
    #[case(-80.0, 5.0, 600, Gesture::Drag)]
    // Mostly vertical.
    #[case(-60.0, 70.0, 100, Gesture::Drag)]
    // Too short for a swipe, too long for a tap.
    #[case(-40.0, 0.0, 100, Gesture::Drag)]
    #[case(0.0, 11.0, 100, Gesture::Drag)]
    #[case(4.0, -3.0, 100, Gesture::Tap { x: 200.0 })]
    #[case(10.0, 10.0, 2000, Gesture::Tap { x: 200.0 })]
    fn test_touch_classification(#[case] dx: f64, #[case] dy: f64, #[case] dt: u64, #[case] expected: Gesture) {
        let gesture = SwipeThresholds::default().classify(dx, dy, Duration::from_millis(dt), false, 200.0);
        assert_eq!(gesture, expected);
    }

    #[test]
    fn test_drag_during_move_suppresses_tap() {
        let thresholds = SwipeThresholds::default();
        let mut tracker = TouchTracker::default();
        tracker.start(100.0, 100.0, Timestamp::from_millis(0));
        tracker.moved(130.0, 100.0, &thresholds);
        // Came back to where it started.
        let gesture = tracker.end(101.0, 100.0, Timestamp::from_millis(200), &thresholds);
        assert_eq!(gesture, Some(Gesture::Drag));
    }

    #[test]
    fn test_tracker_resets() {
        let thresholds = SwipeThresholds::default();
        let mut tracker = TouchTracker::default();
        assert_eq!(tracker.end(0.0, 0.0, Timestamp::from_millis(0), &thresholds), None);
        tracker.start(100.0, 100.0, Timestamp::from_millis(0));
        let gesture = tracker.end(20.0, 100.0, Timestamp::from_millis(300), &thresholds);
        assert_eq!(gesture, Some(Gesture::Swipe(SwipeDirection::Forward)));
        assert_eq!(tracker.end(20.0, 100.0, Timestamp::from_millis(300), &thresholds), None);
    }
}
