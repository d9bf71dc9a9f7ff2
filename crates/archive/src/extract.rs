//! Unpacking a zip container into an ordered list of pages.

use crate::clock::{ClockHandle, SystemClock};
use crate::compare::natural_cmp;
use crate::consts::{ARCHIVE_EXTENSION, FALLBACK_NAME};
use crate::error::{ErrorKind, Result};
use crate::models::{MangaId, MangaRecord, MediaType, Page};
use crate::resource::ResourcePool;
use exn::ResultExt;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;
use zip::ZipArchive;

/// Pages and library record produced by a successful extraction.
#[derive(Debug)]
pub struct Extraction {
    pub pages: Vec<Page>,
    pub manga: MangaRecord,
}

/// An entry that survived filtering, before it becomes a [`Page`].
struct Candidate {
    name: String,
    media_type: MediaType,
    data: Vec<u8>,
}

/// Turns archive bytes into [`Page`]s.
///
/// Resources are leased from the extractor's [`ResourcePool`]; the extractor
/// never releases them, that's the job of whoever ends up owning the pages.
#[derive(Clone)]
pub struct Extractor {
    pool: ResourcePool,
    clock: ClockHandle,
}
impl Default for Extractor {
    fn default() -> Self {
        Self {
            pool: ResourcePool::default(),
            clock: Arc::new(SystemClock),
        }
    }
}
impl Extractor {
    pub fn new(pool: ResourcePool, clock: ClockHandle) -> Self {
        Self { pool, clock }
    }

    pub fn with_pool(mut self, pool: ResourcePool) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_clock(mut self, clock: ClockHandle) -> Self {
        self.clock = clock;
        self
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    /// Extract every page image from a zip container.
    ///
    /// Directory entries and entries without a recognized image extension
    /// are skipped. Pages are ordered by [`natural_cmp`] on their full entry
    /// path and indexed by that order.
    ///
    /// # Errors
    ///
    /// - [`CorruptArchive`](ErrorKind::CorruptArchive) if the bytes aren't a
    ///   readable zip container, or a page entry fails to decompress.
    /// - [`EmptyArchive`](ErrorKind::EmptyArchive) if no entry is a page.
    ///
    /// No resource is acquired unless extraction succeeds.
    #[instrument(skip(self, bytes), fields(archive_size = bytes.len()))]
    pub fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<Extraction> {
        let mut candidates = Self::candidates(bytes)?;
        if candidates.is_empty() {
            exn::bail!(ErrorKind::EmptyArchive);
        }
        candidates.sort_by(|a, b| natural_cmp(&a.name, &b.name));

        let pages: Vec<Page> = candidates
            .into_iter()
            .enumerate()
            .map(|(index, c)| Page::new(index, c.name, c.media_type, self.pool.acquire(c.data)))
            .collect();
        let now = self.clock.now();
        let manga = MangaRecord::new(MangaId::generate(now), manga_name(file_name), pages.len(), now);
        tracing::debug!(id = %manga.id(), name = manga.name(), pages = pages.len(), "Extracted archive");
        Ok(Extraction { pages, manga })
    }

    fn candidates(bytes: &[u8]) -> Result<Vec<Candidate>> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).or_raise(|| ErrorKind::CorruptArchive)?;
        let mut candidates = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).or_raise(|| ErrorKind::CorruptArchive)?;
            if entry.is_dir() {
                continue;
            }
            let Some(media_type) = MediaType::from_name(entry.name()) else {
                tracing::trace!(entry = entry.name(), "Skipping non-image entry");
                continue;
            };
            let name = entry.name().to_string();
            // The declared size is unverified until the entry has been read; a page can't
            // need more room up front than the whole archive.
            let hint = usize::try_from(entry.size()).unwrap_or(usize::MAX).min(bytes.len());
            let mut data = Vec::with_capacity(hint);
            entry.read_to_end(&mut data).or_raise(|| ErrorKind::CorruptArchive)?;
            candidates.push(Candidate { name, media_type, data });
        }
        Ok(candidates)
    }
}

/// Returns `true` if a selected file looks like a comic archive (by name
/// only; the content is checked during extraction).
///
/// ```
/// use koma_archive::accepts_file_name;
///
/// assert!(accepts_file_name("One Piece v01.cbz"));
/// assert!(accepts_file_name("SHOUTING.CBZ"));
/// assert!(!accepts_file_name("notes.zip"));
/// ```
pub fn accepts_file_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(ARCHIVE_EXTENSION)
}

/// Display name of an archive: the final path component, extension removed.
pub(crate) fn manga_name(file_name: &str) -> String {
    let stem = Path::new(file_name).file_stem().map(|s| s.to_string_lossy().trim().to_string()).unwrap_or_default();
    if stem.is_empty() { FALLBACK_NAME.to_string() } else { stem }
}
