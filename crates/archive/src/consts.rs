/// Conventional extension of a comic book zip archive, checked at selection time.
pub const ARCHIVE_EXTENSION: &str = ".cbz";

/// Placeholder name for archives whose file name has no usable stem.
pub(crate) const FALLBACK_NAME: &str = "manga";
