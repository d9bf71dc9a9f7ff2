use crate::error::{ErrorKind, Result};
use crate::models::{ProgressRecord, Theme};
use crate::schema;
use exn::ResultExt;
use koma_archive::models::{MangaId, MangaRecord, Timestamp};
use koma_storage::Gateway;
use std::collections::HashMap;
use tracing::instrument;

/// Key of the ordered manga collection.
pub const KEY_LIBRARY: &str = "library";
/// Key of the progress entries.
pub const KEY_PROGRESS: &str = "progress";
/// Key of the display preference.
pub const KEY_THEME: &str = "theme";

/// The collection of imported manga, their reading progress and the theme.
///
/// State lives in memory and every mutation is written through the
/// [`Gateway`] before the method returns. If the gateway fails (storage full,
/// read-only, gone) the store logs a warning and carries on in memory-only
/// mode for the rest of its life; persistence problems are never returned to
/// the caller.
///
/// Invariants:
/// - manga ids are unique and the collection keeps insertion order;
/// - a progress entry only exists for a manga in the collection, and its
///   page index is within that manga's pages.
pub struct LibraryStore {
    gateway: Gateway,
    manga: Vec<MangaRecord>,
    progress: HashMap<MangaId, ProgressRecord>,
    theme: Theme,
    memory_only: bool,
}

impl LibraryStore {
    /// Load the persisted state behind `gateway`.
    ///
    /// A missing key is an empty collection. A document that fails to decode
    /// is discarded (and removed) with a warning. If the gateway can't even be
    /// read, the store starts empty in memory-only mode.
    #[instrument(skip_all, fields(namespace = gateway.namespace(), backend = gateway.backend_name()))]
    pub fn open(gateway: Gateway) -> Self {
        let mut store = Self {
            gateway,
            manga: Vec::new(),
            progress: HashMap::new(),
            theme: Theme::default(),
            memory_only: false,
        };
        if let Err(e) = store.load() {
            tracing::warn!(error = ?e, "Failed to read library, continuing in memory only");
            store.manga.clear();
            store.progress.clear();
            store.theme = Theme::default();
            store.memory_only = true;
        }
        tracing::debug!(manga = store.manga.len(), progress = store.progress.len(), "Opened library");
        store
    }

    fn load(&mut self) -> Result<()> {
        if let Some(manga) = self.read_document(KEY_LIBRARY, schema::decode_library)? {
            for record in manga {
                if self.manga.iter().any(|m| m.id() == record.id()) {
                    tracing::warn!(id = %record.id(), "Dropping duplicate manga entry");
                    continue;
                }
                self.manga.push(record);
            }
        }

        let mut changed = false;
        for mut entry in self.read_document(KEY_PROGRESS, schema::decode_progress)?.unwrap_or_default() {
            let Some(last_page) = self.get_manga(&entry.manga_id).map(|m| m.last_page()) else {
                tracing::warn!(id = %entry.manga_id, "Dropping progress of unknown manga");
                changed = true;
                continue;
            };
            let Some(last_page) = last_page else {
                changed = true;
                continue;
            };
            if entry.current_page_index > last_page {
                tracing::warn!(id = %entry.manga_id, index = entry.current_page_index, last_page, "Clamping progress");
                entry.current_page_index = last_page;
                changed = true;
            }
            self.progress.insert(entry.manga_id.clone(), entry);
        }
        if changed {
            self.persist_progress();
        }

        if let Some(theme) = self.read_document(KEY_THEME, schema::decode_theme)? {
            self.theme = theme;
        }
        Ok(())
    }

    /// Read and decode one key. Storage failures are errors; decoding
    /// failures reset the key and read as absent.
    fn read_document<T>(&mut self, key: &'static str, decode: fn(&[u8]) -> Result<T>) -> Result<Option<T>> {
        let Some(bytes) = self.gateway.read(key).or_raise(|| ErrorKind::Storage)? else {
            return Ok(None);
        };
        match decode(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = ?e, "Discarding malformed document");
                if let Err(e) = self.gateway.remove(key) {
                    self.degrade(key, &e);
                }
                Ok(None)
            },
        }
    }

    /// `true` once a storage failure has been seen; nothing is persisted
    /// after that.
    pub fn is_memory_only(&self) -> bool {
        self.memory_only
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Every manga in the order it was added.
    pub fn list_manga(&self) -> &[MangaRecord] {
        &self.manga
    }

    pub fn get_manga(&self, id: &MangaId) -> Option<&MangaRecord> {
        self.manga.iter().find(|m| m.id() == id)
    }

    /// Add a manga to the end of the collection.
    ///
    /// Ids are unique: adding a record whose id is already known replaces
    /// that record in place (and drops progress that no longer fits).
    #[instrument(skip_all, fields(id = %record.id(), name = record.name()))]
    pub fn add_manga(&mut self, record: MangaRecord) {
        match self.manga.iter_mut().find(|m| m.id() == record.id()) {
            Some(existing) => {
                let outgrown = self
                    .progress
                    .get(record.id())
                    .is_some_and(|p| record.last_page().is_none_or(|last| p.current_page_index > last));
                *existing = record.clone();
                if outgrown {
                    self.progress.remove(record.id());
                    self.persist_progress();
                }
            },
            None => self.manga.push(record),
        }
        self.persist_library();
    }

    /// Remove a manga and its progress. Returns the removed record, if any.
    ///
    /// The progress entry is removed even if the manga itself wasn't found,
    /// so no orphan can survive.
    #[instrument(skip(self))]
    pub fn remove_manga(&mut self, id: &MangaId) -> Option<MangaRecord> {
        let removed = self.manga.iter().position(|m| m.id() == id).map(|position| self.manga.remove(position));
        if removed.is_some() {
            self.persist_library();
        }
        if self.progress.remove(id).is_some() {
            self.persist_progress();
        }
        removed
    }

    pub fn get_progress(&self, id: &MangaId) -> Option<&ProgressRecord> {
        self.progress.get(id)
    }

    /// Record that `id` is open at `page_index`.
    ///
    /// Nothing happens (and `false` is returned) if the manga isn't in the
    /// collection or the index is past its last page.
    #[instrument(skip(self, at), fields(at = %at))]
    pub fn set_progress(&mut self, id: &MangaId, page_index: usize, at: Timestamp) -> bool {
        let Some(manga) = self.get_manga(id) else {
            tracing::debug!("Ignoring progress for unknown manga");
            return false;
        };
        if manga.last_page().is_none_or(|last| page_index > last) {
            tracing::debug!(page_count = manga.page_count(), "Ignoring out of range progress");
            return false;
        }
        self.progress.insert(
            id.clone(),
            ProgressRecord {
                manga_id: id.clone(),
                current_page_index: page_index,
                last_read_at: at,
            },
        );
        self.persist_progress();
        true
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.persist(KEY_THEME, schema::encode_theme(theme));
    }

    fn persist_library(&mut self) {
        let encoded = schema::encode_library(&self.manga);
        self.persist(KEY_LIBRARY, encoded);
    }

    fn persist_progress(&mut self) {
        // Stored in collection order so the document is stable.
        let encoded = schema::encode_progress(self.manga.iter().filter_map(|m| self.progress.get(m.id())));
        self.persist(KEY_PROGRESS, encoded);
    }

    fn persist(&mut self, key: &'static str, encoded: Result<Vec<u8>>) {
        if self.memory_only {
            return;
        }
        let data = match encoded {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(key, error = ?e, "Failed to encode document, not persisting");
                return;
            },
        };
        if let Err(e) = self.gateway.write(key, &data) {
            self.degrade(key, &e);
        }
    }

    fn degrade(&mut self, key: &str, error: &koma_storage::error::Error) {
        tracing::warn!(key, error = ?error, "Storage failed, continuing in memory only");
        self.memory_only = true;
    }
}
