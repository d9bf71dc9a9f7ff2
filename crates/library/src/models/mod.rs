mod progress;
mod theme;

pub use self::progress::ProgressRecord;
pub use self::theme::Theme;
