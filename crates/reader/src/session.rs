use crate::error::{Error, ErrorKind, Result};
use crate::fullscreen::Fullscreen;
use crate::input::{Gesture, SwipeDirection, TapZone, TouchTracker};
use crate::keys::{Key, KeyResponse};
use crate::load::{LoadOutcome, LoadingGuard, PendingLoad};
use crate::settings::ReaderSettings;
use crate::view::{ReaderViewState, SessionState, ViewMode, Zoom};
use koma_archive::models::{MangaId, MangaRecord, Page, Timestamp};
use koma_archive::{ClockHandle, Extractor, SystemClock, accepts_file_name};
use koma_library::LibraryStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::instrument;

/// The archive whose pages the session holds.
struct OpenArchive {
    manga: MangaRecord,
    pages: Vec<Page>,
}
impl OpenArchive {
    fn release(self) {
        let count = self.pages.len();
        self.pages.into_iter().for_each(Page::release);
        tracing::debug!(id = %self.manga.id(), pages = count, "Released page resources");
    }
}

/// Live state of the reader.
///
/// The session is in [`SessionState::Library`] until an archive is loaded or
/// resumed, then in [`SessionState::Reading`]. It exclusively owns the pages
/// of (at most) one archive: loading another archive or [`close`](Self::close)
/// releases every page handle. [`back`](Self::back) returns to the library
/// but keeps the pages, so the same manga can be [resumed](Self::open_manga).
///
/// Invariants:
/// - while an archive is held, the current page index is within its pages;
/// - zoom is a multiple of 0.25 in `[0.5, 3.0]`;
/// - at most one controls deadline is pending;
/// - every change of page index is committed to the library.
pub struct ReaderSession {
    library: LibraryStore,
    extractor: Extractor,
    clock: ClockHandle,
    settings: ReaderSettings,
    platform: Arc<dyn Fullscreen>,
    fullscreen_rx: watch::Receiver<bool>,
    state: SessionState,
    archive: Option<OpenArchive>,
    current_page: usize,
    view_mode: ViewMode,
    zoom: Zoom,
    controls_visible: bool,
    controls_deadline: Option<Timestamp>,
    fullscreen: bool,
    loading: Arc<AtomicBool>,
    touch: TouchTracker,
}

impl ReaderSession {
    pub fn new(library: LibraryStore, platform: Arc<dyn Fullscreen>) -> Self {
        let fullscreen_rx = platform.subscribe();
        let fullscreen = *fullscreen_rx.borrow();
        Self {
            library,
            extractor: Extractor::default(),
            clock: Arc::new(SystemClock),
            settings: ReaderSettings::default(),
            platform,
            fullscreen_rx,
            state: SessionState::Library,
            archive: None,
            current_page: 0,
            view_mode: ViewMode::default(),
            zoom: Zoom::default(),
            controls_visible: true,
            controls_deadline: None,
            fullscreen,
            loading: Arc::new(AtomicBool::new(false)),
            touch: TouchTracker::default(),
        }
    }

    pub fn with_settings(mut self, settings: ReaderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Use `clock` for progress timestamps, the controls timer and new
    /// records.
    pub fn with_clock(mut self, clock: ClockHandle) -> Self {
        self.extractor = self.extractor.with_clock(Arc::clone(&clock));
        self.clock = clock;
        self
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor.with_clock(Arc::clone(&self.clock));
        self
    }

    pub fn library(&self) -> &LibraryStore {
        &self.library
    }

    /// Give the library store back, releasing any held pages.
    pub fn into_library(mut self) -> LibraryStore {
        if let Some(archive) = self.archive.take() {
            archive.release();
        }
        self.library
    }

    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_reading(&self) -> bool {
        self.state == SessionState::Reading
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// The manga whose pages are held, whether it's on screen or not.
    pub fn current_manga(&self) -> Option<&MangaRecord> {
        self.archive.as_ref().map(|a| &a.manga)
    }

    pub fn pages(&self) -> &[Page] {
        self.archive.as_ref().map(|a| a.pages.as_slice()).unwrap_or_default()
    }

    pub fn page_count(&self) -> usize {
        self.pages().len()
    }

    pub fn current_page_index(&self) -> usize {
        self.current_page
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// When the controls will hide themselves, if they are going to.
    pub fn controls_deadline(&self) -> Option<Timestamp> {
        self.controls_deadline
    }

    pub fn view(&self) -> ReaderViewState {
        ReaderViewState {
            view_mode: self.view_mode,
            zoom: self.zoom.factor(),
            current_page_index: self.current_page,
            controls_visible: self.controls_visible,
            fullscreen: self.fullscreen,
        }
    }

    /// Pages on screen: the current one, preceded by the previous one in
    /// double mode (unless the current one is the first).
    pub fn visible_pages(&self) -> Vec<&Page> {
        let pages = self.pages();
        let Some(current) = pages.get(self.current_page) else {
            return Vec::new();
        };
        match self.view_mode {
            ViewMode::Double if self.current_page > 0 => vec![&pages[self.current_page - 1], current],
            _ => vec![current],
        }
    }

    /// Mirror the platform's fullscreen state. Returns `true` if it changed.
    ///
    /// Called before handling every event; an event loop can also call it
    /// when the subscription reports a change.
    pub fn sync_fullscreen(&mut self) -> bool {
        let fullscreen = *self.fullscreen_rx.borrow_and_update();
        let changed = fullscreen != self.fullscreen;
        if changed {
            tracing::debug!(fullscreen, "Fullscreen changed");
            self.fullscreen = fullscreen;
        }
        changed
    }

    /// A receiver for fullscreen changes, to wake an event loop.
    pub fn fullscreen_changes(&self) -> watch::Receiver<bool> {
        self.fullscreen_rx.clone()
    }

    // Loading ----------------------------------------------------------------

    /// Start extracting an archive on the blocking pool.
    ///
    /// Only one load may be in flight: a second call fails with
    /// [`Busy`](ErrorKind::Busy) until the first outcome is completed or
    /// dropped. A file whose name isn't a comic archive fails with
    /// [`UnsupportedFile`](ErrorKind::UnsupportedFile) without loading.
    ///
    /// Must be called within a Tokio runtime.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn begin_load(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<PendingLoad> {
        self.sync_fullscreen();
        if !accepts_file_name(file_name) {
            exn::bail!(ErrorKind::UnsupportedFile(file_name.to_string()));
        }
        let Some(guard) = LoadingGuard::acquire(&self.loading) else {
            tracing::debug!("Rejecting load, another one is in flight");
            exn::bail!(ErrorKind::Busy);
        };
        let extractor = self.extractor.clone();
        let name = file_name.to_string();
        let task = tokio::task::spawn_blocking(move || extractor.extract(&name, &bytes));
        Ok(PendingLoad::new(file_name.to_string(), task, guard))
    }

    /// Adopt a finished extraction.
    ///
    /// On success the previously held pages are released, the manga is added
    /// to the library and the session starts reading it. On failure nothing
    /// changes.
    #[instrument(skip_all, fields(file = outcome.file_name()))]
    pub fn complete_load(&mut self, outcome: LoadOutcome) -> Result<MangaId> {
        self.sync_fullscreen();
        let extraction = match outcome.result {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!(error = ?e, "Failed to load archive");
                return Err(e);
            },
        };
        if let Some(previous) = self.archive.take() {
            previous.release();
        }
        let id = extraction.manga.id().clone();
        tracing::info!(%id, name = extraction.manga.name(), pages = extraction.pages.len(), "Loaded archive");
        self.library.add_manga(extraction.manga.clone());
        self.archive = Some(OpenArchive {
            manga: extraction.manga,
            pages: extraction.pages,
        });
        self.enter_reading();
        Ok(id)
    }

    /// [`begin_load`](Self::begin_load), wait, [`complete_load`](Self::complete_load).
    pub async fn load_archive(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<MangaId> {
        let pending = self.begin_load(file_name, bytes)?;
        let outcome = pending.wait().await;
        self.complete_load(outcome)
    }

    // Library <-> Reading ----------------------------------------------------

    /// Resume reading a manga whose pages the session holds.
    ///
    /// # Errors
    ///
    /// - [`UnknownManga`](ErrorKind::UnknownManga) if `id` isn't in the library.
    /// - [`ArchiveUnavailable`](ErrorKind::ArchiveUnavailable) if the session
    ///   holds another archive (or none).
    #[instrument(skip(self))]
    pub fn open_manga(&mut self, id: &MangaId) -> Result<()> {
        self.sync_fullscreen();
        if self.library.get_manga(id).is_none() {
            exn::bail!(ErrorKind::UnknownManga(id.clone()));
        }
        if self.current_manga().is_none_or(|m| m.id() != id) {
            return Err(Error::from(ErrorKind::ArchiveUnavailable(id.clone())));
        }
        self.enter_reading();
        Ok(())
    }

    fn enter_reading(&mut self) {
        let Some(manga) = self.current_manga() else {
            return;
        };
        let last = manga.last_page().unwrap_or_default();
        let saved = self.library.get_progress(manga.id()).map(|p| p.current_page_index.min(last));
        self.current_page = saved.unwrap_or_default();
        self.state = SessionState::Reading;
        self.show_controls();
        tracing::debug!(page = self.current_page, "Reading");
    }

    /// Return to the library, keeping the pages.
    pub fn back(&mut self) {
        self.sync_fullscreen();
        if self.state == SessionState::Reading {
            tracing::debug!("Back to library");
            self.state = SessionState::Library;
            self.hide_controls();
        }
    }

    /// Return to the library and release every page.
    pub fn close(&mut self) {
        self.back();
        if let Some(archive) = self.archive.take() {
            archive.release();
        }
        self.current_page = 0;
    }

    /// Remove a manga (and its progress) from the library, closing it first
    /// if it's the one held.
    pub fn remove_manga(&mut self, id: &MangaId) -> Option<MangaRecord> {
        if self.current_manga().is_some_and(|m| m.id() == id) {
            self.close();
        }
        self.library.remove_manga(id)
    }

    // Navigation -------------------------------------------------------------

    /// Move forward one step (two pages in double mode).
    ///
    /// Does nothing unless a full step fits: never advances partially.
    pub fn next_page(&mut self) -> bool {
        self.sync_fullscreen();
        if !self.is_reading() {
            return false;
        }
        let step = self.view_mode.step();
        match self.current_page.checked_add(step) {
            Some(target) if target < self.page_count() => self.go_to(target),
            _ => false,
        }
    }

    /// Move back one step (two pages in double mode), stopping at the first
    /// page.
    pub fn prev_page(&mut self) -> bool {
        self.sync_fullscreen();
        if !self.is_reading() || self.current_page == 0 {
            return false;
        }
        let target = self.current_page.saturating_sub(self.view_mode.step());
        self.go_to(target)
    }

    /// Jump to a page; out-of-range indexes are clamped.
    pub fn seek(&mut self, index: usize) -> bool {
        self.sync_fullscreen();
        if !self.is_reading() || self.page_count() == 0 {
            return false;
        }
        let target = index.min(self.page_count() - 1);
        self.go_to(target)
    }

    fn go_to(&mut self, target: usize) -> bool {
        if target == self.current_page {
            return false;
        }
        self.current_page = target;
        self.commit();
        self.show_controls();
        true
    }

    /// Push the current index to the library.
    fn commit(&mut self) {
        let Some(id) = self.current_manga().map(|m| m.id().clone()) else {
            return;
        };
        let now = self.clock.now();
        tracing::debug!(%id, page = self.current_page, "Committing progress");
        self.library.set_progress(&id, self.current_page, now);
    }

    pub fn toggle_view_mode(&mut self) -> ViewMode {
        self.sync_fullscreen();
        self.view_mode = self.view_mode.toggled();
        self.view_mode
    }

    pub fn zoom_in(&mut self) -> Zoom {
        self.sync_fullscreen();
        self.zoom = self.zoom.zoomed_in();
        self.zoom
    }

    pub fn zoom_out(&mut self) -> Zoom {
        self.sync_fullscreen();
        self.zoom = self.zoom.zoomed_out();
        self.zoom
    }

    // Controls ---------------------------------------------------------------

    fn show_controls(&mut self) {
        self.controls_visible = true;
        self.controls_deadline = Some(self.clock.now().saturating_add(self.settings.controls_timeout));
    }

    fn hide_controls(&mut self) {
        self.controls_visible = false;
        self.controls_deadline = None;
    }

    /// Hide the controls if their deadline has passed. Returns `true` if
    /// they were hidden by this call.
    pub fn tick(&mut self) -> bool {
        self.sync_fullscreen();
        match self.controls_deadline {
            Some(deadline) if self.clock.now() >= deadline => {
                self.hide_controls();
                true
            },
            _ => false,
        }
    }

    pub fn pointer_moved(&mut self) {
        self.sync_fullscreen();
        if self.is_reading() {
            self.show_controls();
        }
    }

    // Input ------------------------------------------------------------------

    /// A pointer tap at `x` on an element `width` wide.
    pub fn tap(&mut self, x: f64, width: f64) -> TapZone {
        self.sync_fullscreen();
        let zone = self.settings.tap.classify(x, width);
        if !self.is_reading() {
            return zone;
        }
        match zone {
            TapZone::Next => {
                self.next_page();
            },
            TapZone::Previous => {
                self.prev_page();
            },
            TapZone::Middle if self.controls_visible => self.hide_controls(),
            TapZone::Middle => self.show_controls(),
        }
        zone
    }

    pub fn touch_start(&mut self, x: f64, y: f64) {
        self.sync_fullscreen();
        self.touch.start(x, y, self.clock.now());
    }

    pub fn touch_move(&mut self, x: f64, y: f64) {
        self.touch.moved(x, y, &self.settings.swipe);
    }

    /// Finish a touch on an element `width` wide. A swipe navigates, a drag
    /// does nothing and anything else is handled as a [`tap`](Self::tap).
    pub fn touch_end(&mut self, x: f64, y: f64, width: f64) -> Option<Gesture> {
        self.sync_fullscreen();
        let gesture = self.touch.end(x, y, self.clock.now(), &self.settings.swipe)?;
        if !self.is_reading() {
            return Some(gesture);
        }
        match gesture {
            Gesture::Swipe(SwipeDirection::Forward) => {
                self.next_page();
                self.show_controls();
            },
            Gesture::Swipe(SwipeDirection::Backward) => {
                self.prev_page();
                self.show_controls();
            },
            Gesture::Drag => {},
            Gesture::Tap { x } => {
                self.tap(x, width);
            },
        }
        Some(gesture)
    }

    pub fn key(&mut self, key: &Key) -> KeyResponse {
        self.sync_fullscreen();
        if !self.is_reading() {
            return KeyResponse::IGNORED;
        }
        match key {
            Key::ArrowLeft => {
                self.prev_page();
                KeyResponse::HANDLED
            },
            Key::ArrowRight => {
                self.next_page();
                KeyResponse::HANDLED
            },
            Key::Space => {
                self.next_page();
                KeyResponse { handled: true, prevent_default: true }
            },
            Key::Fullscreen => {
                self.toggle_fullscreen();
                KeyResponse::HANDLED
            },
            Key::Escape if self.fullscreen => {
                self.platform.request_exit();
                self.sync_fullscreen();
                KeyResponse::HANDLED
            },
            Key::Escape => {
                self.back();
                KeyResponse::HANDLED
            },
            Key::Other(_) => KeyResponse::IGNORED,
        }
    }

    /// Ask the platform to enter or leave fullscreen. The session's state
    /// only follows once the platform reports the change (which a platform
    /// may do before this returns).
    pub fn toggle_fullscreen(&mut self) {
        self.sync_fullscreen();
        if self.fullscreen {
            self.platform.request_exit();
        } else {
            self.platform.request_enter();
        }
        self.sync_fullscreen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fullscreen::ManualFullscreen;
    use koma_archive::fixtures::{build_cbz, corrupt_cbz, numbered_cbz};
    use koma_archive::{Clock, ManualClock, ResourcePool};
    use koma_storage::Gateway;
    use koma_storage::backend::MemoryBackend;
    use std::time::Duration;

    struct Harness {
        session: ReaderSession,
        clock: Arc<ManualClock>,
        pool: ResourcePool,
        platform: Arc<ManualFullscreen>,
        backend: Arc<MemoryBackend>,
    }

    fn harness_with(platform: ManualFullscreen) -> Harness {
        let backend = Arc::new(MemoryBackend::default());
        let library = LibraryStore::open(Gateway::new(backend.clone(), "manga-reader").unwrap());
        let clock = Arc::new(ManualClock::new(Timestamp::from_millis(1_000_000)));
        let pool = ResourcePool::new();
        let platform = Arc::new(platform);
        let session = ReaderSession::new(library, platform.clone())
            .with_clock(clock.clone())
            .with_extractor(Extractor::default().with_pool(pool.clone()));
        Harness { session, clock, pool, platform, backend }
    }

    fn harness() -> Harness {
        harness_with(ManualFullscreen::granting())
    }

    async fn loaded(pages: usize) -> (Harness, MangaId) {
        let mut h = harness();
        let id = h.session.load_archive("volume.cbz", numbered_cbz(pages)).await.unwrap();
        (h, id)
    }

    #[tokio::test]
    async fn test_load_enters_reading() {
        let (h, id) = loaded(5).await;
        assert_eq!(h.session.state(), SessionState::Reading);
        assert_eq!(h.session.page_count(), 5);
        assert_eq!(h.session.current_page_index(), 0);
        assert!(h.session.controls_visible());
        assert!(!h.session.is_loading());
        let manga = h.session.library().get_manga(&id).unwrap();
        assert_eq!(manga.name(), "volume");
        assert_eq!(h.pool.live(), 5);
    }

    #[tokio::test]
    async fn test_navigation_commits_progress() {
        let (mut h, id) = loaded(5).await;
        h.clock.advance(Duration::from_secs(10));
        assert!(h.session.next_page());
        let progress = h.session.library().get_progress(&id).unwrap();
        assert_eq!(progress.current_page_index, 1);
        assert_eq!(progress.last_read_at, Timestamp::from_millis(1_010_000));
        // Persisted, not just in memory.
        let reopened = LibraryStore::open(Gateway::new(h.backend.clone(), "manga-reader").unwrap());
        assert_eq!(reopened.get_progress(&id).unwrap().current_page_index, 1);
    }

    #[tokio::test]
    async fn test_next_page_never_overshoots() {
        let (mut h, _id) = loaded(5).await;
        assert!(h.session.seek(4));
        assert!(!h.session.next_page());
        assert_eq!(h.session.current_page_index(), 4);

        h.session.toggle_view_mode();
        assert!(h.session.seek(3));
        // 3 + 2 > 4: no partial advance.
        assert!(!h.session.next_page());
        assert_eq!(h.session.current_page_index(), 3);
        assert!(h.session.seek(2));
        assert!(h.session.next_page());
        assert_eq!(h.session.current_page_index(), 4);
        assert!(!h.session.next_page());
    }

    #[tokio::test]
    async fn test_prev_page_clamps_to_zero() {
        let (mut h, id) = loaded(5).await;
        h.session.seek(1);
        h.session.toggle_view_mode();
        assert!(h.session.prev_page());
        assert_eq!(h.session.current_page_index(), 0);
        assert_eq!(h.session.library().get_progress(&id).unwrap().current_page_index, 0);
        assert!(!h.session.prev_page());

        h.session.toggle_view_mode();
        h.session.seek(1);
        assert!(h.session.prev_page());
        assert_eq!(h.session.current_page_index(), 0);
    }

    #[tokio::test]
    async fn test_toggle_view_mode_twice_is_identity() {
        let (mut h, _id) = loaded(5).await;
        h.session.seek(3);
        let before = h.session.view();
        h.session.toggle_view_mode();
        h.session.toggle_view_mode();
        assert_eq!(h.session.view(), before);
    }

    #[tokio::test]
    async fn test_visible_pages() {
        let (mut h, _id) = loaded(5).await;
        let names = |s: &ReaderSession| s.visible_pages().iter().map(|p| p.name().to_string()).collect::<Vec<_>>();
        assert_eq!(names(&h.session), ["page1.png"]);
        h.session.toggle_view_mode();
        // Nothing before the first page.
        assert_eq!(names(&h.session), ["page1.png"]);
        h.session.seek(2);
        assert_eq!(names(&h.session), ["page2.png", "page3.png"]);
    }

    #[tokio::test]
    async fn test_seek_clamps() {
        let (mut h, _id) = loaded(5).await;
        assert!(h.session.seek(99));
        assert_eq!(h.session.current_page_index(), 4);
        assert!(!h.session.seek(4));
    }

    #[tokio::test]
    async fn test_tap_zones() {
        let (mut h, _id) = loaded(5).await;
        assert_eq!(h.session.tap(80.0, 100.0), TapZone::Next);
        assert_eq!(h.session.current_page_index(), 1);
        assert_eq!(h.session.tap(10.0, 100.0), TapZone::Previous);
        assert_eq!(h.session.current_page_index(), 0);
        assert!(h.session.controls_visible());
        assert_eq!(h.session.tap(50.0, 100.0), TapZone::Middle);
        assert!(!h.session.controls_visible());
        assert_eq!(h.session.controls_deadline(), None);
        h.session.tap(50.0, 100.0);
        assert!(h.session.controls_visible());
        assert_eq!(h.session.current_page_index(), 0);
    }

    #[tokio::test]
    async fn test_swipe_navigates_once() {
        let (mut h, _id) = loaded(5).await;
        h.session.touch_start(300.0, 200.0);
        h.clock.advance(Duration::from_millis(300));
        let gesture = h.session.touch_end(220.0, 205.0, 400.0);
        assert_eq!(gesture, Some(Gesture::Swipe(SwipeDirection::Forward)));
        // 220 / 400 would be a middle tap; only the swipe applied.
        assert_eq!(h.session.current_page_index(), 1);
        assert!(h.session.controls_visible());
    }

    #[tokio::test]
    async fn test_drag_is_not_a_tap() {
        let (mut h, _id) = loaded(5).await;
        h.session.touch_start(350.0, 200.0);
        h.session.touch_move(350.0, 260.0);
        h.clock.advance(Duration::from_millis(100));
        let gesture = h.session.touch_end(350.0, 205.0, 400.0);
        assert_eq!(gesture, Some(Gesture::Drag));
        assert_eq!(h.session.current_page_index(), 0);
    }

    #[tokio::test]
    async fn test_short_touch_is_a_tap() {
        let (mut h, _id) = loaded(5).await;
        h.session.touch_start(350.0, 200.0);
        h.clock.advance(Duration::from_millis(80));
        let gesture = h.session.touch_end(352.0, 201.0, 400.0);
        assert_eq!(gesture, Some(Gesture::Tap { x: 352.0 }));
        assert_eq!(h.session.current_page_index(), 1);
    }

    #[tokio::test]
    async fn test_keyboard() {
        let (mut h, _id) = loaded(5).await;
        assert_eq!(h.session.key(&Key::ArrowRight), KeyResponse::HANDLED);
        let response = h.session.key(&Key::Space);
        assert!(response.handled && response.prevent_default);
        assert_eq!(h.session.current_page_index(), 2);
        h.session.key(&Key::ArrowLeft);
        assert_eq!(h.session.current_page_index(), 1);
        assert_eq!(h.session.key(&Key::Other("x".to_string())), KeyResponse::IGNORED);
        assert_eq!(h.session.key(&Key::Escape), KeyResponse::HANDLED);
        assert_eq!(h.session.state(), SessionState::Library);
        // Keys only apply while reading.
        assert_eq!(h.session.key(&Key::ArrowRight), KeyResponse::IGNORED);
        assert_eq!(h.session.current_page_index(), 1);
    }

    #[tokio::test]
    async fn test_escape_leaves_fullscreen_first() {
        let (mut h, _id) = loaded(5).await;
        h.session.key(&Key::Fullscreen);
        assert!(h.session.is_fullscreen());
        h.session.key(&Key::Escape);
        assert!(!h.session.is_fullscreen());
        assert_eq!(h.session.state(), SessionState::Reading);
        h.session.key(&Key::Escape);
        assert_eq!(h.session.state(), SessionState::Library);
    }

    #[tokio::test]
    async fn test_fullscreen_request_is_not_assumed() {
        let mut h = harness_with(ManualFullscreen::deferred());
        h.session.load_archive("volume.cbz", numbered_cbz(3)).await.unwrap();
        h.session.toggle_fullscreen();
        assert_eq!(h.platform.requests(), 1);
        assert!(!h.session.is_fullscreen());
        h.platform.notify(true);
        assert!(h.session.sync_fullscreen());
        assert!(h.session.view().fullscreen);
        // The platform can leave fullscreen on its own.
        h.platform.notify(false);
        h.session.pointer_moved();
        assert!(!h.session.is_fullscreen());
    }

    #[tokio::test]
    async fn test_zoom_is_clamped() {
        let (mut h, _id) = loaded(2).await;
        for _ in 0..20 {
            h.session.zoom_in();
        }
        assert_eq!(h.session.view().zoom, 3.0);
        for _ in 0..20 {
            h.session.zoom_out();
        }
        assert_eq!(h.session.view().zoom, 0.5);
        h.session.zoom_in();
        assert_eq!(h.session.view().zoom, 0.75);
    }

    #[tokio::test]
    async fn test_controls_timer() {
        let (mut h, _id) = loaded(5).await;
        let timeout = h.session.settings().controls_timeout;
        h.clock.advance(timeout - Duration::from_millis(1));
        assert!(!h.session.tick());
        h.session.pointer_moved();
        // Restarted, not accumulated.
        h.clock.advance(Duration::from_millis(2));
        assert!(!h.session.tick());
        assert!(h.session.controls_visible());
        h.clock.advance(timeout);
        assert!(h.session.tick());
        assert!(!h.session.controls_visible());
        assert_eq!(h.session.controls_deadline(), None);
        assert!(!h.session.tick());
        // Navigation shows them again.
        h.session.next_page();
        assert!(h.session.controls_visible());
        assert_eq!(h.session.controls_deadline(), Some(h.clock.now().saturating_add(timeout)));
    }

    #[tokio::test]
    async fn test_corrupt_archive_changes_nothing() {
        let (mut h, id) = loaded(3).await;
        h.session.seek(2);
        let err = h.session.load_archive("broken.cbz", corrupt_cbz()).await.unwrap_err();
        assert_eq!(*err, ErrorKind::CorruptArchive);
        let err = h.session.load_archive("empty.cbz", build_cbz([("notes.txt", "hello")])).await.unwrap_err();
        assert_eq!(*err, ErrorKind::EmptyArchive);
        assert_eq!(h.session.current_manga().unwrap().id(), &id);
        assert_eq!(h.session.current_page_index(), 2);
        assert_eq!(h.session.library().list_manga().len(), 1);
        assert_eq!(h.pool.live(), 3);
        assert!(!h.session.is_loading());
    }

    #[tokio::test]
    async fn test_unsupported_file_rejected() {
        let mut h = harness();
        let err = h.session.begin_load("volume.zip", numbered_cbz(1)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFile(_)));
        assert!(!h.session.is_loading());
    }

    #[tokio::test]
    async fn test_only_one_load_in_flight() {
        let mut h = harness();
        let pending = h.session.begin_load("one.cbz", numbered_cbz(2)).unwrap();
        assert!(h.session.is_loading());
        let err = h.session.begin_load("two.cbz", numbered_cbz(2)).unwrap_err();
        assert_eq!(*err, ErrorKind::Busy);
        // Input keeps flowing while the extraction runs.
        h.session.pointer_moved();
        let outcome = pending.wait().await;
        assert!(h.session.is_loading());
        h.session.complete_load(outcome).unwrap();
        assert!(!h.session.is_loading());
        assert_eq!(h.session.library().list_manga().len(), 1);
    }

    #[tokio::test]
    async fn test_abandoned_load_clears_flag() {
        let mut h = harness();
        let pending = h.session.begin_load("one.cbz", numbered_cbz(2)).unwrap();
        drop(pending);
        assert!(!h.session.is_loading());
        assert!(h.session.begin_load("two.cbz", numbered_cbz(2)).is_ok());
    }

    #[tokio::test]
    async fn test_replacing_archive_releases_pages() {
        let (mut h, first) = loaded(4).await;
        assert_eq!(h.pool.live(), 4);
        let second = h.session.load_archive("other.cbz", numbered_cbz(2)).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(h.pool.live(), 2);
        assert_eq!(h.session.current_manga().unwrap().id(), &second);
        h.session.close();
        assert_eq!(h.pool.live(), 0);
        assert_eq!(h.session.state(), SessionState::Library);
    }

    #[tokio::test]
    async fn test_resume_restores_progress() {
        let (mut h, id) = loaded(5).await;
        h.session.seek(3);
        h.session.back();
        assert_eq!(h.session.state(), SessionState::Library);
        assert!(!h.session.next_page());
        assert_eq!(h.pool.live(), 5);
        h.session.open_manga(&id).unwrap();
        assert_eq!(h.session.state(), SessionState::Reading);
        assert_eq!(h.session.current_page_index(), 3);
    }

    #[tokio::test]
    async fn test_open_unavailable_or_unknown() {
        let (mut h, first) = loaded(3).await;
        h.session.load_archive("other.cbz", numbered_cbz(2)).await.unwrap();
        let err = h.session.open_manga(&first).unwrap_err();
        assert_eq!(*err, ErrorKind::ArchiveUnavailable(first));
        let ghost = MangaId::new("ghost");
        let err = h.session.open_manga(&ghost).unwrap_err();
        assert_eq!(*err, ErrorKind::UnknownManga(ghost));
    }

    #[tokio::test]
    async fn test_remove_open_manga_closes_it() {
        let (mut h, id) = loaded(3).await;
        h.session.next_page();
        assert!(h.session.remove_manga(&id).is_some());
        assert_eq!(h.session.state(), SessionState::Library);
        assert!(h.session.current_manga().is_none());
        assert_eq!(h.pool.live(), 0);
        assert!(h.session.library().get_progress(&id).is_none());
        assert!(h.session.library().list_manga().is_empty());
    }

    #[tokio::test]
    async fn test_reimport_starts_fresh() {
        let (mut h, first) = loaded(3).await;
        h.session.seek(2);
        let second = h.session.load_archive("volume.cbz", numbered_cbz(3)).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(h.session.current_page_index(), 0);
        assert_eq!(h.session.library().list_manga().len(), 2);
    }

    #[tokio::test]
    async fn test_index_and_zoom_always_in_range() {
        let (mut h, _id) = loaded(5).await;
        let actions: [fn(&mut ReaderSession); 6] = [
            |s| {
                s.next_page();
            },
            |s| {
                s.prev_page();
            },
            |s| {
                s.toggle_view_mode();
            },
            |s| {
                s.zoom_in();
            },
            |s| {
                s.zoom_out();
            },
            |s| {
                s.tap(95.0, 100.0);
            },
        ];
        // Deterministic pseudo-random walk.
        let mut seed: u32 = 7;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            actions[(seed >> 16) as usize % actions.len()](&mut h.session);
            let view = h.session.view();
            assert!(view.current_page_index < 5);
            assert!((0.5..=3.0).contains(&view.zoom));
            assert_eq!((view.zoom / 0.25).fract(), 0.0);
        }
    }
}
