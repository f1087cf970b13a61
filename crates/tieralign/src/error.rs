//! Error types for tier and relation operations.
//!
//! This module provides [`RelationError`], the error type for everything
//! that goes wrong while wiring nodes, tiers, and tier groups together.
//! Recoverable conditions (a lookup time outside every interval, a child
//! set that does not snugly tile its parent) are not errors; those surface
//! as `Option`/`bool` returns with a logged warning.

use thiserror::Error;

use tieralign_core::hierarchy::{HierarchyError, TagKind};

/// The main error type for tier and relation operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RelationError {
    /// A node was asked to precede, follow, or contain itself.
    #[error("node '{0}' cannot be related to itself")]
    SelfLink(String),

    /// Two nodes that must share a tag do not.
    #[error("expected a '{expected}' node, found '{found}'")]
    TagMismatch { expected: String, found: String },

    /// A containment operation needs a declared relation the hierarchy
    /// does not carry.
    #[error("tag '{tag}' has no declared {role}")]
    NoDeclaredRelation { tag: String, role: &'static str },

    /// Fusing leftwards at the first entry, or rightwards at the last.
    #[error("cannot fuse past the edge of the tier at index {0}")]
    FuseAtEdge(usize),

    /// An interval-only operation was applied to a point node.
    #[error("node '{0}' is not an interval")]
    NotAnInterval(String),

    /// A tier was built from entries whose shape does not match the
    /// tag's declared kind.
    #[error("tag '{tag}' is declared {expected:?}")]
    KindMismatch { tag: String, expected: TagKind },

    /// A `"#"` boundary sentinel was appended to a tier or list.
    #[error("boundary sentinels cannot join tiers or lists")]
    BoundaryMember,

    /// An index past the end of a tier or group.
    #[error("index {0} is out of range")]
    IndexOutOfRange(usize),

    /// The tags of a set of tiers do not form one containment chain.
    #[error("tier tags do not form a single top-to-bottom chain")]
    BrokenChain,

    /// Two groups being combined carry different tag chains.
    #[error("tier groups carry different tag chains")]
    ChainMismatch,

    /// An operation that needs at least one tier was given none.
    #[error("tier group has no tiers")]
    EmptyGroup,

    /// An interleaved tier had no adjacent tier to copy timing from.
    #[error("no adjacent tier to copy timing from")]
    NoTimingSource,

    /// A named tier is absent from the group.
    #[error("no tier named '{0}'")]
    MissingTier(String),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RelationError>;
