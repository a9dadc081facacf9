//! Error types for the permission engine

use thiserror::Error;

/// Grammar violations in a dot-notation permission string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Empty (or whitespace-only) permission
    #[error("Permission must be a non-empty string")]
    Empty,

    /// Fewer than two dot-separated segments
    #[error("Permission must have at least 2 segments (e.g., \"module.action\"): '{0}'")]
    TooFewSegments(String),

    /// Two dots in a row
    #[error("Permission cannot contain consecutive dots: '{0}'")]
    ConsecutiveDots(String),

    /// Wildcard used anywhere but the final segment
    #[error("Wildcard (*) can only appear at the end of a permission: '{0}'")]
    MisplacedWildcard(String),

    /// Wildcard glued to a segment (`users*` instead of `users.*`)
    #[error("Wildcard must follow a dot (e.g., \"users.*\" not \"users*\"): '{0}'")]
    WildcardWithoutDot(String),

    /// Segment outside `[a-z][a-z0-9-]*`
    #[error(
        "Permission must follow dot notation with lowercase letters, numbers and hyphens: '{0}'"
    )]
    InvalidCharacters(String),
}

/// Permission engine errors
#[derive(Debug, Error)]
pub enum PermissionError {
    /// Permission string failed grammar validation
    #[error("Invalid permission format: {0}")]
    InvalidFormat(#[from] FormatError),

    /// Cache backend error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Membership lookup error
    #[error("Membership lookup failed: {0}")]
    Lookup(String),

    /// Value (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Redis error
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for permission engine operations
pub type Result<T> = std::result::Result<T, PermissionError>;
