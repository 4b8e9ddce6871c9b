//! Typed identifiers for fork nodes.
//!
//! `ForkId` wraps a UUIDv7 (time-ordered, globally unique) so ids minted later
//! sort later. It displays as standard UUID text for logging; the `short()`
//! form (first 8 hex chars) is for human-facing output and never used as a
//! lookup key.

use std::fmt;

/// Identifier of a node in a fork forest (UUIDv7).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ForkId(uuid::Uuid);

impl ForkId {
    /// Create a new time-ordered ID (UUIDv7).
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// First 8 hex characters, for human display only (not lookup).
    pub fn short(&self) -> String {
        self.0.as_simple().to_string()[..8].to_string()
    }
}

impl Default for ForkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ForkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ForkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForkId({})", self.short())
    }
}
