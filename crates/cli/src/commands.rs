use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use koma_archive::models::{MangaId, Timestamp};
use koma_config::Config;
use koma_library::{LibraryStore, Theme};
use koma_reader::{ManualFullscreen, ReaderSession};
use std::path::Path;
use std::sync::Arc;

pub(crate) fn open_library(config: &Config) -> Result<LibraryStore> {
    let gateway = config.open_gateway().or_raise(|| ErrorKind::Config)?;
    let library = LibraryStore::open(gateway);
    if library.is_memory_only() {
        tracing::warn!("Library storage unavailable, changes will not be saved");
    }
    Ok(library)
}

/// A session for a terminal, where fullscreen requests are always granted.
pub(crate) fn new_session(config: &Config, library: LibraryStore) -> ReaderSession {
    ReaderSession::new(library, Arc::new(ManualFullscreen::granting())).with_settings(config.reader_settings())
}

pub(crate) async fn read_archive(path: &Path) -> Result<(String, Vec<u8>)> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ErrorKind::InvalidInput(format!("not a file: {}", path.display())))?;
    let bytes = tokio::fs::read(path).await.or_raise(|| ErrorKind::Io(path.display().to_string()))?;
    Ok((file_name, bytes))
}

pub(crate) async fn import(config: &Config, library: LibraryStore, path: &Path) -> Result<()> {
    let (file_name, bytes) = read_archive(path).await?;
    let mut session = new_session(config, library);
    let id = session
        .load_archive(&file_name, bytes)
        .await
        .or_raise(|| ErrorKind::Load(file_name.clone()))?;
    if let Some(manga) = session.current_manga() {
        println!("{id}\t{}\t{} pages", manga.name(), manga.page_count());
    }
    session.close();
    Ok(())
}

pub(crate) fn list(library: &LibraryStore) {
    if library.list_manga().is_empty() {
        println!("Library is empty.");
        return;
    }
    for manga in library.list_manga() {
        let progress = library.get_progress(manga.id());
        let percent = progress.map(|p| p.percent(manga.page_count())).unwrap_or_default();
        let last_read = progress.map(|p| p.last_read_at.to_string()).unwrap_or_else(|| "never".to_string());
        println!(
            "{}\t{}\t{} pages\t{percent}%\tadded {}\tlast read {last_read}",
            manga.id(),
            manga.name(),
            manga.page_count(),
            manga.added_at(),
        );
    }
}

pub(crate) fn remove(mut library: LibraryStore, id: &str) -> Result<()> {
    match library.remove_manga(&MangaId::new(id)) {
        Some(manga) => {
            println!("Removed {}", manga.name());
            Ok(())
        },
        None => exn::bail!(ErrorKind::UnknownManga(id.to_string())),
    }
}

pub(crate) fn progress(mut library: LibraryStore, id: &str, set: Option<usize>) -> Result<()> {
    let id = MangaId::new(id);
    let Some(manga) = library.get_manga(&id).cloned() else {
        exn::bail!(ErrorKind::UnknownManga(id.to_string()));
    };
    if let Some(page) = set {
        let valid = page
            .checked_sub(1)
            .is_some_and(|index| library.set_progress(&id, index, Timestamp::now()));
        if !valid {
            exn::bail!(ErrorKind::InvalidInput(format!("page must be between 1 and {}", manga.page_count())));
        }
    }
    match library.get_progress(&id) {
        Some(progress) => println!(
            "{}: page {}/{} ({}%)",
            manga.name(),
            progress.current_page_index + 1,
            manga.page_count(),
            progress.percent(manga.page_count())
        ),
        None => println!("{}: not started", manga.name()),
    }
    Ok(())
}

pub(crate) fn theme(mut library: LibraryStore, theme: Option<Theme>) {
    if let Some(theme) = theme {
        library.set_theme(theme);
    }
    println!("{}", library.theme());
}
