//! Error types for ring engine operations

use thiserror::Error;

/// Errors that can occur during ring engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
