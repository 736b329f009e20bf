//! Error types for agenda-engine operations.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgendaError {
    #[error("Invalid range: start ({start}) must be before end ({end})")]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("Event title must not be empty")]
    EmptyTitle,

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failures of the persistence layer behind [`crate::store::EventStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, AgendaError>;
