//! `koma`: import comic archives, manage the library and read from a
//! terminal.

mod commands;
mod error;
mod repl;

use crate::error::{ErrorKind, Result};
use clap::{Parser, Subcommand, ValueEnum};
use exn::ResultExt;
use koma_config::Config;
use koma_library::Theme;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Read comic archives (CBZ) and keep track of where you left off.
#[derive(Parser)]
#[command(name = "koma", version, about)]
struct Cli {
    /// Configuration file (defaults to `koma.toml` in the configuration and
    /// working directories).
    #[arg(long, global = true, env = "KOMA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add an archive to the library.
    Import { file: PathBuf },
    /// List the library with reading progress.
    List,
    /// Remove a manga and its progress.
    Remove { id: String },
    /// Show, or set, the page a manga is open at.
    Progress {
        id: String,
        /// Page number, starting at 1.
        #[arg(long)]
        set: Option<usize>,
    },
    /// Show, or set, the display theme.
    Theme { theme: Option<ThemeArg> },
    /// Import an archive and read it, driven by commands on stdin.
    Read { file: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Dark,
    Light,
}
impl From<ThemeArg> for Theme {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Light => Theme::Light,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let library = commands::open_library(&config)?;

    match cli.command {
        Commands::Import { file } => commands::import(&config, library, &file).await,
        Commands::List => {
            commands::list(&library);
            Ok(())
        },
        Commands::Remove { id } => commands::remove(library, &id),
        Commands::Progress { id, set } => commands::progress(library, &id, set),
        Commands::Theme { theme } => {
            commands::theme(library, theme.map(Theme::from));
            Ok(())
        },
        Commands::Read { file } => repl::read(&config, library, &file).await,
    }
}
