//! Error types for the document store and its glue
//!
//! This module defines error types that:
//! - Follow the store taxonomy (unavailable, write failed, decode)
//! - Keep a human-readable message for progress logs
//! - Never model a missing document; reads return `Option` for that

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mail_codec::DecodeError;

/// Application error type for the store, bootstrap and command line
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum StoreError {
    /// Folder resolution or listing failed (network, auth, provider outage)
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A delete or insert failed partway through a write; retry the whole write
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StoreError {
    /// Short kind name used in progress lines
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::StoreUnavailable(_) => "StoreUnavailable",
            StoreError::WriteFailed(_) => "WriteFailed",
            StoreError::Decode(_) => "DecodeError",
            StoreError::Config(_) => "Config",
            StoreError::Auth(_) => "Auth",
            StoreError::Parse(_) => "Parse",
            StoreError::Io(_) => "Io",
            StoreError::InvalidInput(_) => "InvalidInput",
        }
    }
}

impl From<DecodeError> for StoreError {
    fn from(err: DecodeError) -> Self {
        StoreError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Parse(err.to_string())
    }
}

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;
