//! Errors for the fallible edges of the CSP crate.
//!
//! The policy registry itself never fails; only configuration loading and
//! hash algorithm parsing report errors.

#[derive(thiserror::Error, Debug)]
pub enum CspError {
    #[error("Invalid CSP configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unsupported hash algorithm: {name}")]
    UnsupportedAlgorithm { name: String },

    #[error("Malformed CSP configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CSP operations that can fail
pub type CspResult<T> = Result<T, CspError>;
