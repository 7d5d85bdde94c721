//! Error types for SkillMint.

use thiserror::Error;

/// Top-level error type for SkillMint operations.
///
/// Subsystem crates keep their own error enums and convert into this one at
/// the application boundary.
#[derive(Debug, Error)]
pub enum SkillMintError {
    /// Catalog could not be loaded or failed validation
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Progress could not be persisted
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Display name cannot identify a user
    #[error("Invalid user name: {0:?}")]
    InvalidUser(String),
}

/// Result type alias for SkillMint operations.
pub type SkillMintResult<T> = Result<T, SkillMintError>;
