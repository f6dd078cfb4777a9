//! Error types for capability grants.

use thiserror::Error;

/// Reasons a capability pattern fails to compile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The pattern is the empty string.
    #[error("empty capability pattern")]
    Empty,

    /// A `.`-separated segment is empty (leading, trailing or doubled dot).
    #[error("empty segment at position {0}")]
    EmptySegment(usize),

    /// A wildcard appears inside a segment instead of forming the whole segment.
    #[error("wildcard must be a whole segment, got {0:?}")]
    PartialWildcard(String),

    /// More than two consecutive `*` characters.
    #[error("invalid wildcard {0:?}")]
    InvalidWildcard(String),

    /// A glob metacharacter that the grammar does not support.
    #[error("unsupported character {0:?}")]
    UnsupportedCharacter(char),
}

/// Errors returned by the capability enforcer and manifest loading.
#[derive(Error, Debug)]
pub enum CapabilityError {
    /// Empty or malformed caller input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A capability pattern in a grant batch did not compile.
    #[error("capability {index} ({pattern:?}): {source}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        #[source]
        source: PatternError,
    },

    /// Plugin manifest is structurally valid TOML but semantically wrong.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for capability operations.
pub type CapabilityResult<T> = std::result::Result<T, CapabilityError>;
