//! Reading from a terminal: one command per line on stdin drives a
//! [`ReaderSession`].

use crate::commands::{new_session, read_archive};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use koma_archive::models::{MangaId, Timestamp};
use koma_config::Config;
use koma_library::LibraryStore;
use koma_reader::{Key, ReaderSession, SessionState};
use std::path::Path;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "commands: next | prev | key <name> | tap <x> <width> | move | zoom in|out | view | \
                    seek <page> | fullscreen | back | open | status | help | quit";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Next,
    Prev,
    Key(Key),
    Tap { x: f64, width: f64 },
    PointerMoved,
    ZoomIn,
    ZoomOut,
    ToggleView,
    /// 1-based page number.
    Seek(usize),
    Fullscreen,
    Back,
    Open,
    Status,
    Help,
    Quit,
}
impl FromStr for Command {
    type Err = String;
    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let line = line.trim_start();
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();
        Ok(match command {
            "next" | "n" => Self::Next,
            "prev" | "p" => Self::Prev,
            "key" => {
                let Some(name) = line.strip_prefix("key ") else {
                    return Err("missing key name".to_string());
                };
                // Only spaces left means the space bar.
                let name = if name.trim().is_empty() { " " } else { name.trim() };
                let Ok(key) = name.parse::<Key>();
                Self::Key(key)
            },
            "tap" => Self::Tap {
                x: argument(&args, 0, "x")?,
                width: argument(&args, 1, "width")?,
            },
            "move" => Self::PointerMoved,
            "zoom" => match args.first() {
                Some(&("in" | "+")) => Self::ZoomIn,
                Some(&("out" | "-")) => Self::ZoomOut,
                _ => return Err("zoom in or zoom out".to_string()),
            },
            "view" => Self::ToggleView,
            "seek" => match argument::<usize>(&args, 0, "page")? {
                0 => return Err("page numbers start at 1".to_string()),
                page => Self::Seek(page),
            },
            "fullscreen" | "f" => Self::Fullscreen,
            "back" => Self::Back,
            "open" => Self::Open,
            "status" | "" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => return Err(format!("unknown command: {other}")),
        })
    }
}

fn argument<T: FromStr>(args: &[&str], position: usize, what: &str) -> std::result::Result<T, String> {
    let value = args.get(position).ok_or_else(|| format!("missing {what}"))?;
    value.parse().map_err(|_| format!("{what} must be a number"))
}

/// Import `path` and read it until `quit` or end of input.
pub(crate) async fn read(config: &Config, library: LibraryStore, path: &Path) -> Result<()> {
    let (file_name, bytes) = read_archive(path).await?;
    let mut session = new_session(config, library);
    let id = session
        .load_archive(&file_name, bytes)
        .await
        .or_raise(|| ErrorKind::Load(file_name.clone()))?;
    println!("{HELP}");
    status(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut fullscreen = session.fullscreen_changes();
    loop {
        let wait = session.controls_deadline().map(|deadline| deadline.since(Timestamp::now()));
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.or_raise(|| ErrorKind::Io("stdin".to_string()))? else {
                    break;
                };
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        apply(&mut session, &id, command);
                        status(&session);
                    },
                    Err(message) => println!("{message}"),
                }
            },
            () = sleep_for(wait) => {
                if session.tick() {
                    status(&session);
                }
            },
            Ok(()) = fullscreen.changed() => {
                if session.sync_fullscreen() {
                    status(&session);
                }
            },
        }
    }
    session.close();
    Ok(())
}

async fn sleep_for(wait: Option<std::time::Duration>) {
    match wait {
        Some(wait) => tokio::time::sleep(wait).await,
        None => std::future::pending().await,
    }
}

fn apply(session: &mut ReaderSession, id: &MangaId, command: Command) {
    match command {
        Command::Next => {
            session.next_page();
        },
        Command::Prev => {
            session.prev_page();
        },
        Command::Key(key) => {
            let response = session.key(&key);
            if !response.handled {
                println!("(ignored)");
            }
        },
        Command::Tap { x, width } => {
            session.tap(x, width);
        },
        Command::PointerMoved => session.pointer_moved(),
        Command::ZoomIn => {
            session.zoom_in();
        },
        Command::ZoomOut => {
            session.zoom_out();
        },
        Command::ToggleView => {
            session.toggle_view_mode();
        },
        Command::Seek(page) => {
            session.seek(page.saturating_sub(1));
        },
        Command::Fullscreen => session.toggle_fullscreen(),
        Command::Back => session.back(),
        Command::Open => {
            if let Err(e) = session.open_manga(id) {
                println!("{}", *e);
            }
        },
        Command::Status | Command::Quit => {},
        Command::Help => println!("{HELP}"),
    }
}

fn status(session: &ReaderSession) {
    let Some(manga) = session.current_manga() else {
        println!("[{}] nothing open", session.state());
        return;
    };
    if session.state() == SessionState::Library {
        println!("[library] {} (type `open` to resume)", manga.name());
        return;
    }
    let view = session.view();
    let pages = session
        .visible_pages()
        .iter()
        .map(|page| format!("{} ({})", page.name(), page.media_type().mime()))
        .collect::<Vec<_>>()
        .join(" | ");
    println!(
        "[reading] {} {}/{} {} {} controls:{} fullscreen:{} :: {pages}",
        manga.name(),
        view.current_page_index + 1,
        session.page_count(),
        view.view_mode,
        session.zoom(),
        if view.controls_visible { "on" } else { "off" },
        if view.fullscreen { "on" } else { "off" },
    );
}
