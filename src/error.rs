//! Error types for the splitting pipeline
//!
//! None of these are allowed to fail a host build. Hooks catch them, log a
//! warning and fall back to leaving the output untouched.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::FilePath;

pub type Result<T, E = SplitError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SplitError {
    /// The app declaration has no `pages` list
    #[error("app declaration is missing its `pages` list")]
    MissingPages,

    #[error("failed to read app declaration {path}")]
    ReadAppConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse app declaration {path}")]
    ParseAppConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read module graph {path}")]
    ReadGraph {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse module graph {path}")]
    ParseGraph {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing one page stylesheet failed while linking a shared chunk
    #[error("failed to link {chunk} into {stylesheet}")]
    StylesheetIo {
        chunk: FilePath,
        stylesheet: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}
