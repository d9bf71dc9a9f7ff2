use derive_more::Display;

/// Whether an archive is being read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum SessionState {
    /// No archive on screen.
    #[default]
    Library,
    Reading,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum ViewMode {
    #[default]
    #[display("single")]
    Single,
    /// The current page and the one before it, side by side.
    #[display("double")]
    Double,
}
impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Single => Self::Double,
            Self::Double => Self::Single,
        }
    }

    /// Pages moved by one navigation step.
    pub fn step(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Double => 2,
        }
    }
}

/// Zoom factor, always a multiple of 0.25 within `[0.5, 3.0]`.
///
/// Stored as a count of quarter steps so it can't drift off the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("{}%", u32::from(*_0) * 25)]
pub struct Zoom(u8);
impl Zoom {
    pub const MIN: Self = Self(2);
    pub const MAX: Self = Self(12);
    pub const STEP: f32 = 0.25;

    /// Snap any factor to the nearest step within range.
    pub fn from_factor(factor: f32) -> Self {
        if !factor.is_finite() {
            return Self::default();
        }
        let quarters = (factor / Self::STEP).round().clamp(f32::from(Self::MIN.0), f32::from(Self::MAX.0));
        Self(quarters as u8)
    }

    pub fn factor(self) -> f32 {
        f32::from(self.0) * Self::STEP
    }

    pub fn zoomed_in(self) -> Self {
        Self((self.0 + 1).min(Self::MAX.0))
    }

    pub fn zoomed_out(self) -> Self {
        Self(self.0.saturating_sub(1).max(Self::MIN.0))
    }
}
impl Default for Zoom {
    fn default() -> Self {
        Self(4)
    }
}

/// Snapshot of everything a front end needs to draw the reader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReaderViewState {
    pub view_mode: ViewMode,
    pub zoom: f32,
    pub current_page_index: usize,
    pub controls_visible: bool,
    pub fullscreen: bool,
}
