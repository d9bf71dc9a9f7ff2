use std::convert::Infallible;
use std::str::FromStr;

/// Keys the reader reacts to.
///
/// Parsed from DOM-style key names (`ArrowLeft`, `" "`, `Escape`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Space,
    /// `f`, either case.
    Fullscreen,
    Escape,
    Other(String),
}
impl FromStr for Key {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ArrowLeft" | "Left" | "left" => Self::ArrowLeft,
            "ArrowRight" | "Right" | "right" => Self::ArrowRight,
            " " | "Space" | "Spacebar" | "space" => Self::Space,
            "f" | "F" => Self::Fullscreen,
            "Escape" | "Esc" | "escape" | "esc" => Self::Escape,
            other => Self::Other(other.to_string()),
        })
    }
}

/// What the event source should do with a key event after the session saw
/// it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyResponse {
    /// The session acted on the key.
    pub handled: bool,
    /// Suppress the platform's default action (scrolling, for Space).
    pub prevent_default: bool,
}
impl KeyResponse {
    pub(crate) const IGNORED: Self = Self { handled: false, prevent_default: false };
    pub(crate) const HANDLED: Self = Self { handled: true, prevent_default: false };
}
