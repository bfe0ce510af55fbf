//! Fatal errors surfaced to the caller of a regeneration.
//!
//! Missing or malformed marker pairs are deliberately absent from this taxonomy: a family without
//! a usable region simply preserves nothing. Only inputs that cannot be turned into a tree end up
//! here, each naming the artifact that failed.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The input a fatal error refers to.
pub enum Artifact {
    /// C# source of the entity the DTO is derived from.
    Entity,
    /// A previously generated DTO file being regenerated.
    PreviousDto,
    /// Metadata describing the entity (JSON or extracted).
    Metadata,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity => write!(f, "entity source"),
            Self::PreviousDto => write!(f, "previous DTO file"),
            Self::Metadata => write!(f, "entity metadata"),
        }
    }
}

/// Errors that stop a regeneration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The C# grammar could not be loaded into the parser.
    #[error("Failed to load C# grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    /// A grammar query failed to compile.
    #[error("Invalid tree-sitter query: {0}")]
    Query(#[from] tree_sitter::QueryError),
    /// The parser produced no tree or a tree containing syntax errors.
    #[error("Failed to parse {artifact}: {detail}")]
    Parse {
        /// Which input failed.
        artifact: Artifact,
        /// Where parsing went wrong, e.g. the position of the first syntax error.
        detail: String,
    },
    /// The input parsed but does not declare a class.
    #[error("No class declaration found in {0}")]
    MissingClass(Artifact),
    /// Metadata names something that cannot become a C# identifier or type.
    #[error("Invalid {artifact}: {reason}")]
    InvalidMetadata {
        /// Which input failed.
        artifact: Artifact,
        /// Human-readable description of the offending value.
        reason: String,
    },
    /// Metadata JSON could not be decoded.
    #[error("Failed to decode entity metadata: {0}")]
    Json(#[from] serde_json::Error),
    /// Configuration file exists but cannot be decoded.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
