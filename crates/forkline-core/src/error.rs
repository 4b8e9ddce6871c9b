//! Invariant violations of the fork forest.
//!
//! Every variant is a programming error on the caller's side: the forest
//! never returns these as values. They are raised through [`fault`], which
//! logs the violation and panics.

use thiserror::Error;

use crate::ForkId;

/// Contract violations detected by the fork forest.
///
/// Times are carried pre-formatted so the error does not depend on the
/// timeline's time type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForkableError {
    /// The id does not name a node of this forest (deleted, or from another forest).
    #[error("unknown fork {0:?}")]
    UnknownFork(ForkId),

    /// A root was used where a fork with a parent is required.
    #[error("{0:?} is a root (!is_root violated)")]
    RootHasNoParent(ForkId),

    /// Deletion through a node that is not the direct parent.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild { parent: ForkId, child: ForkId },

    /// A node with a parent was used where a root is required.
    #[error("{0:?} must be a root (is_root violated)")]
    NotARoot(ForkId),

    /// Attaching a node whose local timeline is empty.
    #[error("{0:?} has an empty timeline (timeline_empty): nothing to match the copied begin")]
    EmptyAttachment(ForkId),

    /// The first sample of an attached node is not at the attach time.
    #[error("copied begin of {node:?} is at {begin}, attach point is at {fork}")]
    CopiedBeginMismatch {
        node: ForkId,
        begin: String,
        fork: String,
    },

    /// Detaching a node that has not copied its fork-point sample.
    #[error("{node:?} must start with a copy of its fork point at {fork} before detaching")]
    MissingCopiedBegin { node: ForkId, fork: String },

    /// Attaching a tree beneath one of its own nodes.
    #[error("attaching {node:?} beneath {parent:?} would create a cycle")]
    CycleAttachment { parent: ForkId, node: ForkId },

    /// Attaching beneath an empty root: there is no sample to fork at.
    #[error("cannot attach beneath {0:?}: it is an empty root")]
    EmptyRootFork(ForkId),

    /// A local position beyond the end of the node's local timeline.
    #[error("position {index} out of range for {node:?} with {len} local samples")]
    PositionOutOfRange { node: ForkId, index: usize, len: usize },

    /// Incrementing a cursor that is at the end of its target.
    #[error("cannot increment: current != end violated for target {0:?}")]
    IncrementPastEnd(ForkId),

    /// Decrementing a cursor at the first sample of history.
    #[error("cannot decrement before the beginning of {0:?}: no earlier sample")]
    DecrementPastBegin(ForkId),

    /// Reading the sample under an end cursor.
    #[error("cannot dereference the end of {0:?}")]
    DereferenceEnd(ForkId),

    /// Pruning forks at a time that precedes the node's own fork point.
    #[error("cannot delete forks of {node:?} after {time}, which is before the fork time {fork}")]
    PruneBeforeForkTime {
        node: ForkId,
        time: String,
        fork: String,
    },

    /// Checking fork-freedom on a node that has a parent.
    #[error("cannot check forks of nonroot {0:?}")]
    NonRootCheck(ForkId),

    /// Forks that would dangle if history up to `time` were trimmed.
    #[error("found {count} fork(s) at or before {time} in the tree of {root:?}")]
    ForksBeforeTime { root: ForkId, count: usize, time: String },

    /// A fork position names a parent sample that no longer exists.
    #[error("{child:?} forks at {fork}, which is not in the timeline of {parent:?}")]
    DanglingForkPosition {
        parent: ForkId,
        child: ForkId,
        fork: String,
    },

    /// A sample that would break strict time ordering of the effective timeline.
    #[error("sample at {time} breaks time ordering of {node:?}: {reason}")]
    UnorderedSample {
        node: ForkId,
        time: String,
        reason: &'static str,
    },

    /// A sample that would break strict time ordering of a standalone
    /// timeline, before it belongs to any node.
    #[error("sample at {time} breaks time ordering of the timeline: {reason}")]
    UnorderedTimeline { time: String, reason: &'static str },
}

/// Report an invariant violation and abort the current operation.
///
/// Logs at error level, then panics with the error's message.
#[track_caller]
#[cold]
pub fn fault(error: ForkableError) -> ! {
    tracing::error!(%error, "fork forest invariant violated");
    panic!("{error}")
}
