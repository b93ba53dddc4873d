use thiserror::Error;

use crate::coercion::RecordError;

/// Errors raised by the entity graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NeoError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("close approach of `{designation}` is not linked to a NEO")]
    Unlinked { designation: String },

    #[error("close approach of `{designation}` outlived the database holding its NEO")]
    Detached { designation: String },

    #[error("no NEO with designation `{designation}`")]
    UnresolvedReference { designation: String },

    #[error("duplicate NEO designation `{0}`")]
    DuplicateDesignation(String),

    #[error("close approach of `{approach}` cannot link to NEO `{neo}`")]
    DesignationMismatch { approach: String, neo: String },

    #[error("close approach of `{0}` is already linked")]
    AlreadyLinked(String),

    #[error("{kind} source is missing column(s): {}", .missing.join(", "))]
    MissingColumns { kind: String, missing: Vec<String> },

    #[error("unknown unresolved-approach policy `{0}` (expected drop, keep or error)")]
    UnknownPolicy(String),
}

/// Result type for entity graph operations
pub type NeoResult<T> = Result<T, NeoError>;
