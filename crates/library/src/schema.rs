//! Persisted document layouts.
//!
//! Each key holds one JSON document tagged with a `version`. Decoding checks
//! the version before trusting the shape; anything that doesn't match is
//! reported as [`InvalidData`](ErrorKind::InvalidData) and the caller resets
//! the key.

use crate::error::{ErrorKind, Result};
use crate::models::{ProgressRecord, Theme};
use exn::ResultExt;
use koma_archive::models::{MangaId, MangaRecord, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{from_slice as from_json, to_vec as to_json};

pub(crate) const SCHEMA_VERSION: u32 = 1;

/// Only the version, so an unknown layout can be told apart from a broken one.
#[derive(Deserialize)]
struct Header {
    version: u32,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(test, derive(Debug, PartialEq))]
struct MangaProxy {
    id: String,
    name: String,
    #[serde(rename = "pageCount")]
    page_count: usize,
    #[serde(rename = "addedAt")]
    added_at: i64,
}
impl From<&MangaRecord> for MangaProxy {
    fn from(manga: &MangaRecord) -> Self {
        Self {
            id: manga.id().to_string(),
            name: manga.name().to_string(),
            page_count: manga.page_count(),
            added_at: manga.added_at().as_millis(),
        }
    }
}
impl From<MangaProxy> for MangaRecord {
    fn from(manga: MangaProxy) -> Self {
        MangaRecord::new(manga.id, manga.name, manga.page_count, Timestamp::from_millis(manga.added_at))
    }
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(test, derive(Debug, PartialEq))]
struct ProgressProxy {
    #[serde(rename = "mangaId")]
    manga_id: String,
    #[serde(rename = "currentPageIndex")]
    current_page_index: usize,
    #[serde(rename = "lastReadAt")]
    last_read_at: i64,
}
impl From<&ProgressRecord> for ProgressProxy {
    fn from(progress: &ProgressRecord) -> Self {
        Self {
            manga_id: progress.manga_id.to_string(),
            current_page_index: progress.current_page_index,
            last_read_at: progress.last_read_at.as_millis(),
        }
    }
}
impl From<ProgressProxy> for ProgressRecord {
    fn from(progress: ProgressProxy) -> Self {
        Self {
            manga_id: MangaId::new(progress.manga_id),
            current_page_index: progress.current_page_index,
            last_read_at: Timestamp::from_millis(progress.last_read_at),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct LibraryDocument {
    version: u32,
    manga: Vec<MangaProxy>,
}

#[derive(Serialize, Deserialize)]
struct ProgressDocument {
    version: u32,
    entries: Vec<ProgressProxy>,
}

#[derive(Serialize, Deserialize)]
struct ThemeDocument {
    version: u32,
    theme: Theme,
}

fn check_version(bytes: &[u8]) -> Result<()> {
    let header: Header = from_json(bytes).or_raise(|| ErrorKind::InvalidData("missing version"))?;
    if header.version != SCHEMA_VERSION {
        exn::bail!(ErrorKind::InvalidData("unsupported version"));
    }
    Ok(())
}

pub(crate) fn encode_library(manga: &[MangaRecord]) -> Result<Vec<u8>> {
    let document = LibraryDocument {
        version: SCHEMA_VERSION,
        manga: manga.iter().map(MangaProxy::from).collect(),
    };
    to_json(&document).or_raise(|| ErrorKind::InvalidData("library"))
}

pub(crate) fn decode_library(bytes: &[u8]) -> Result<Vec<MangaRecord>> {
    check_version(bytes)?;
    let document: LibraryDocument = from_json(bytes).or_raise(|| ErrorKind::InvalidData("library"))?;
    Ok(document.manga.into_iter().map(MangaRecord::from).collect())
}

pub(crate) fn encode_progress<'a>(entries: impl IntoIterator<Item = &'a ProgressRecord>) -> Result<Vec<u8>> {
    let document = ProgressDocument {
        version: SCHEMA_VERSION,
        entries: entries.into_iter().map(ProgressProxy::from).collect(),
    };
    to_json(&document).or_raise(|| ErrorKind::InvalidData("progress"))
}

pub(crate) fn decode_progress(bytes: &[u8]) -> Result<Vec<ProgressRecord>> {
    check_version(bytes)?;
    let document: ProgressDocument = from_json(bytes).or_raise(|| ErrorKind::InvalidData("progress"))?;
    Ok(document.entries.into_iter().map(ProgressRecord::from).collect())
}

pub(crate) fn encode_theme(theme: Theme) -> Result<Vec<u8>> {
    to_json(&ThemeDocument { version: SCHEMA_VERSION, theme }).or_raise(|| ErrorKind::InvalidData("theme"))
}

pub(crate) fn decode_theme(bytes: &[u8]) -> Result<Theme> {
    check_version(bytes)?;
    let document: ThemeDocument = from_json(bytes).or_raise(|| ErrorKind::InvalidData("theme"))?;
    Ok(document.theme)
}
