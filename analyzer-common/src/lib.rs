//! Types shared across the page analyzer crates.
//!
//! This crate is deliberately small: the error taxonomy every layer converts
//! into, and the tracing setup used by the binary and the integration tests.
//!
//! - [`AnalyzerError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! ```rust
//! use analyzer_common::AnalyzerError;
//!
//! let err = AnalyzerError::UrlNotFound(7);
//! assert!(err.is_not_found());
//! assert_eq!(err.to_string(), "URL not found: 7");
//! ```

pub mod observability;

/// Outcome of a failed handler-level operation.
///
/// Each lower layer keeps its own error enum and converts into this one at the
/// crate boundary, so handlers can decide per variant what the user sees.
#[derive(thiserror::Error, Debug)]
pub enum AnalyzerError {
    /// Submitted input was rejected before touching storage.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No stored URL carries the requested id.
    #[error("URL not found: {0}")]
    UrlNotFound(i64),

    /// The outbound fetch failed (connect, timeout, non-success status).
    #[error("Network error: {0}")]
    Network(String),

    /// The fetched document could not be interpreted as a page.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The backing store rejected or failed an operation.
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalyzerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UrlNotFound(_))
    }
}

/// Convenient alias for results that use [`AnalyzerError`].
pub type Result<T> = std::result::Result<T, AnalyzerError>;
