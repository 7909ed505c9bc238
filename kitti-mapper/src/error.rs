use std::{io, path::PathBuf};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fatal failures of a mapping run.
///
/// A text input that cannot be opened is not among them: its table is
/// loaded empty instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}:{line}: {message}", path.display())]
    Format {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{}:{line}: calibration '{label}' cannot be decomposed: {reason}", path.display())]
    Calibration {
        path: PathBuf,
        line: usize,
        label: String,
        reason: &'static str,
    },

    #[error("no {table} entry at index {index}, the table holds {len} entries")]
    Index {
        table: &'static str,
        index: usize,
        len: usize,
    },

    #[error("unable to read scan file '{}'", path.display())]
    ScanRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to write tile '{}'", path.display())]
    TileWrite {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl Error {
    pub(crate) fn format(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn tile_write<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self::TileWrite {
            path: path.into(),
            source: source.into(),
        }
    }
}
