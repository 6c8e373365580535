//! Crate error type
//!
//! Gameplay never fails: rejected actions are reported through outcome enums
//! and log warnings. Only loading and saving data files can error.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid tuning: {0}")]
    InvalidTuning(String),

    #[error("invalid power-up catalog: {0}")]
    InvalidCatalog(String),

    #[error("unknown power-up kind `{0}` (expected Damage, IncreaseHealth or MaxHealthBoost)")]
    UnknownPowerUpKind(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
