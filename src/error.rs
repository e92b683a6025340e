//! Crate-wide error type for fallible internal operations.
//!
//! Protocol-visible errors never escape as this type directly (see
//! `session::dispatch`, which maps every failure mode to a JSON-RPC error
//! object); `ServerError` exists so the plumbing between components has a
//! typed shape instead of stringly-typed `anyhow::Error` everywhere.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("framing error: {0}")]
    Framing(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;
