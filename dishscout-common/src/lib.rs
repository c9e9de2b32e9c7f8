//! Common types and utilities shared across Dishscout crates.
//!
//! This crate holds the shared error type and the observability helpers used
//! throughout the Dishscout workspace. It stays dependency-light so that every
//! crate can depend on it.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`DishError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use dishscout_common::DishError;
//!
//! let err = DishError::Config("missing API key".into());
//! assert!(err.is_config());
//! assert_eq!(err.to_string(), "Configuration error: missing API key");
//! ```

pub mod observability;

/// Error types used across the Dishscout system.
///
/// The variants follow the three failure kinds a search can hit: bad
/// configuration, rejected user input, and everything that can go wrong on
/// the outbound model call.
#[derive(thiserror::Error, Debug)]
pub enum DishError {
    /// Credentials or settings are missing or were rejected by the service.
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input failed validation; no outbound call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request never produced an HTTP response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with an error status or an unusable body.
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Operation exceeded the configured timeout.
    #[error("Timeout occurred")]
    Timeout,
}

impl DishError {
    pub fn is_config(&self) -> bool {
        matches!(self, DishError::Config(_))
    }

    /// Short label for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            DishError::Config(_) => "config",
            DishError::Validation(_) => "validation",
            DishError::Transport(_) => "transport",
            DishError::Service { .. } => "service",
            DishError::Decode(_) => "decode",
            DishError::Timeout => "timeout",
        }
    }
}

/// Convenient alias for results that use [`DishError`].
pub type Result<T> = std::result::Result<T, DishError>;
