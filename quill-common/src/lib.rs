//! Common types and utilities shared across Quill crates.
//!
//! This crate defines the shared error type and the observability helpers
//! used throughout the Quill workspace. It is intentionally lightweight so
//! that every crate can depend on it without pulling heavy transitive costs.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`QuillError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use quill_common::QuillError;
//!
//! let err = QuillError::Config("llm.api_key is missing".into());
//! assert_eq!(err.to_string(), "Configuration error: llm.api_key is missing");
//! ```
pub mod observability;

/// Error types used across the Quill system.
#[derive(thiserror::Error, Debug)]
pub enum QuillError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A collaborator (database, HTTP client, ...) could not be initialised.
    #[error("Initialisation error: {0}")]
    Init(String),

    /// Catch-all for failures bubbled up from `anyhow` call sites.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`QuillError`].
pub type Result<T> = std::result::Result<T, QuillError>;

