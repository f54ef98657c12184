//! Citadel CSP Crate
//!
//! Builds `Content-Security-Policy` header values from a shared, thread-safe
//! registry of directives. Compilation is lazy and cached; the only per-request
//! work is substituting a caller-supplied nonce into the cached value.

pub mod config;
pub mod directive;
pub mod error;
pub mod policy;
pub mod source;

pub use config::PolicyConfig;
pub use error::{CspError, CspResult};
pub use policy::{HeaderMode, Policy};
pub use source::{hash, nonce, HashAlgorithm, NONCE_PLACEHOLDER};
