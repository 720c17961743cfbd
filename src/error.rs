//! Error types for the capability core.
//!
//! Only configuration problems are fatal, and only at registry build time.
//! Everything that can go wrong while ticking (missing capabilities in a
//! relationship, failing tasks, vanished targets) is encoded as outcomes
//! and state transitions, never as errors crossing a tick boundary.

use thiserror::Error;

use crate::capability::capability::CapabilityId;

/// A capability graph that cannot be constructed. Detected when the
/// registry is built; must abort construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Two capabilities registered under the same id.
    #[error("duplicate capability id: {id}")]
    DuplicateId { id: CapabilityId },

    /// A capability lists itself in one of its relationship sets.
    #[error("capability {id} references itself in its {relation} set")]
    SelfReference { id: CapabilityId, relation: &'static str },

    /// A capability both requires and conflicts with the same peer.
    #[error("capability {id} both requires and conflicts with {other}")]
    RequiresConflictOverlap { id: CapabilityId, other: CapabilityId },
}
