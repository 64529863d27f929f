//! Error taxonomy for the progression engine.
//!
//! Gameplay paths never surface these to the action pipeline; they are logged
//! and swallowed there. Admin commands and the API's `try_*` helpers return
//! them so callers can show a message.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgressionError {
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("unknown skill '{skill}' in category '{category}'")]
    UnknownSkill { category: String, skill: String },
    #[error("could not parse config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },
    #[error("i/o failure on {path}: {source}")]
    PersistenceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid amount {0}: must be a positive, finite number")]
    InvalidAmount(f64),
    #[error("invalid player id '{0}'")]
    InvalidPlayer(String),
}

pub type ProgressionResult<T> = Result<T, ProgressionError>;
