//! Library error type

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the merged bouquet failed; the file may be truncated
    #[error("failed to write bouquet {}: {source}", path.display())]
    BouquetWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("invalid log marker pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("log marker pattern {0:?} has no capture group")]
    MarkerWithoutCapture(String),

    #[error("{0:?} is not a valid astra variable name")]
    InvalidVariable(String),

    #[error("{} is not an analyzer log", .0.display())]
    NotALog(PathBuf),

    #[error("analyzer: {0}")]
    Analyzer(String),

    #[error("service list reload failed: {0}")]
    Reload(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
