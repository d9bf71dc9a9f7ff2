use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not read {_0}")]
    Io(#[error(not(source))] String),
    #[display("could not load archive {_0}")]
    Load(#[error(not(source))] String),
    #[display("no manga with id {_0}")]
    UnknownManga(#[error(not(source))] String),
    #[display("{_0}")]
    InvalidInput(#[error(not(source))] String),
}
