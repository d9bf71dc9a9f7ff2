//! Contract of the remote manga listing.
//!
//! The remote collection endpoint returns a JSON array of [`RemoteManga`];
//! items are read or downloaded through per-item endpoints. No HTTP client
//! lives here, only the record shape and the path builders.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use urlencoding::encode;

/// Endpoint returning the remote collection.
pub const COLLECTION_PATH: &str = "/api/manga";
const DEFAULT_EXTENSION: &str = "cbz";
const FALLBACK_NAME: &str = "manga";
const MAX_NAME_LENGTH: usize = 120;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(EXTENSION_REGEX, r"\.[^/.]+$");
regex!(UNSAFE_REGEX, r"[^A-Za-z0-9 _.-]+");
regex!(WHITESPACE_REGEX, r"\s+");

/// One item of the remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteManga {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub created_time: String,
    pub modified_time: String,
}
impl RemoteManga {
    /// Parse the collection endpoint's response body.
    pub fn parse_collection(body: &[u8]) -> serde_json::Result<Vec<Self>> {
        serde_json::from_slice(body)
    }

    pub fn read_path(&self) -> String {
        read_path(&self.id)
    }

    pub fn download_path(&self) -> String {
        download_path(&self.id, &self.name)
    }
}

/// Turn a display name into something safe to use as a file name.
///
/// The extension (if any) is dropped, characters outside
/// ASCII `[A-Za-z0-9 _.-]` are removed, whitespace runs collapse to a single space
/// and the result is capped at 120 characters. An empty result becomes
/// `manga`. `ext` is appended after stripping a trailing dot.
///
/// ```
/// use koma_library::remote::safe_filename;
/// assert_eq!(safe_filename("One Piece: Vol. 1?.cbz", "cbz"), "One Piece Vol. 1.cbz");
/// assert_eq!(safe_filename("???", "cbz"), "manga.cbz");
/// ```
pub fn safe_filename(name: &str, ext: &str) -> String {
    let name = if name.is_empty() { FALLBACK_NAME } else { name };
    let base = EXTENSION_REGEX.replace(name, "");
    let base = UNSAFE_REGEX.replace_all(&base, "");
    let base = WHITESPACE_REGEX.replace_all(&base, " ");
    let base: String = base.trim().chars().take(MAX_NAME_LENGTH).collect();
    let base = if base.is_empty() { FALLBACK_NAME } else { base.as_str() };
    format!("{}.{ext}", base.strip_suffix('.').unwrap_or(base))
}

/// Path of the endpoint streaming an item for reading.
pub fn read_path(id: &str) -> String {
    format!("{COLLECTION_PATH}/{}/read", encode(id))
}

/// Path of the endpoint downloading an item under a sanitized file name.
pub fn download_path(id: &str, name: &str) -> String {
    format!(
        "{COLLECTION_PATH}/{}/download?filename={}",
        encode(id),
        encode(&safe_filename(name, DEFAULT_EXTENSION))
    )
}
