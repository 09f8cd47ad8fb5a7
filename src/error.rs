// src/error.rs

//! Unified error handling for the applier.

use std::fmt;

use thiserror::Error;

/// Result type alias for applier operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed before a status was received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Remote service answered with an unexpected status
    #[error("{context} returned {status}: {body}")]
    Status {
        context: String,
        status: u16,
        body: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The work queue was shut down
    #[error("Work queue is closed")]
    QueueClosed,
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an unexpected-status error with context.
    pub fn status(context: impl Into<String>, status: u16, body: impl fmt::Display) -> Self {
        Self::Status {
            context: context.into(),
            status,
            body: body.to_string(),
        }
    }
}
