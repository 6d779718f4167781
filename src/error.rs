//! Error types for the cache subsystem, the code engine, and the auth flow shim.
//!
//! The three enums mirror the layering of the modules that raise them:
//! `CacheError` is produced by backends and the registry, `CodeError` wraps
//! it for the code engine, and `AuthError` wraps `CodeError` for the auth
//! flow shim.

use thiserror::Error;

/// Errors raised by `Cache` implementations and the `CacheRegistry`.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The underlying store (network socket, DB connection, file) failed.
    #[error("cache transport error: {0}")]
    Transport(String),

    /// A value could not be encoded or decoded by the backend.
    #[error("cache serialization error: {0}")]
    Serialization(String),

    /// A backend, registry, or engine was configured with an invalid or
    /// unknown driver/setting. Treated as fatal at construction time.
    #[error("cache configuration error: {0}")]
    Configuration(String),

    /// A `Remember`/`RememberForever` producer closure failed.
    #[error("cache value producer failed: {0}")]
    Producer(#[from] anyhow::Error),
}

/// Errors raised by `CodeEngine`.
#[derive(Debug, Error)]
pub enum CodeError {
    /// The submitted code did not match the stored one (or none was found).
    #[error("confie: code not matched")]
    NotMatched,

    /// The underlying cache backend failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Errors raised by `AuthFlow`.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The request named an unsupported `kind`, or was otherwise malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Password-based authentication failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The one-time code did not verify.
    #[error(transparent)]
    Code(#[from] CodeError),

    /// The `UserStore` collaborator failed.
    #[error("user store error: {0}")]
    Store(#[from] anyhow::Error),
}
