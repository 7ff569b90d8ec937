//! Error types for beatreel
//!
//! Everything here is fatal at startup except `UnknownLanguage`, which the
//! sequencer only raises under the strict language policy.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Roster parse error: {0}")]
    RosterParse(#[from] serde_json::Error),

    #[error("Style pool '{0}' is empty")]
    EmptyPool(String),

    #[error("Asset directory not found: {}", .0.display())]
    MissingAssets(PathBuf),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Task failed: {0}")]
    Task(String),

    #[error("Unknown language '{raw}' for player '{ign}'")]
    UnknownLanguage { ign: String, raw: String },
}

/// Result type alias for beatreel
pub type Result<T> = std::result::Result<T, Error>;
