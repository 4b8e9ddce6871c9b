//! Branching timelines for trajectory simulation.
//!
//! A single history can split into several continuations (competing
//! predictions, planned maneuvers) that share their common past without
//! copying it. The continuations live in a tree of fork nodes: each node
//! owns only the samples after its fork point and borrows everything before
//! it from its ancestors.
//!
//! # Pieces
//!
//! - [`Timeline`]: the local sample storage a node wraps. [`DiscreteTimeline`]
//!   is the stock implementation; trajectory kinds may bring their own.
//! - [`Forest`]: the arena owning every node, with fork, delete, attach and
//!   detach.
//! - [`Cursor`] / [`Samples`]: walk the effective timeline of a node as one
//!   sequence, crossing from ancestor to descendant at fork points.
//! - Maintenance: [`Forest::delete_all_forks_after`] and
//!   [`Forest::check_no_forks_before`].
//!
//! # Faults
//!
//! Misuse (deleting through the wrong parent, detaching a root, walking past
//! either end of a timeline, ...) is a defect in the caller, not a runtime
//! condition. It panics with a [`ForkableError`] message; see [`error`].
//!
//! # Example
//!
//! ```rust
//! use forkline_core::{DiscreteTimeline, Forest, Instant, Timestamped};
//!
//! let t = Instant::from_seconds;
//! let mut forest = Forest::<DiscreteTimeline<&str>>::new();
//! let history = forest.new_root();
//! forest.push_back(history, Timestamped::new(t(0.0), "launch"));
//! forest.push_back(history, Timestamped::new(t(10.0), "coast"));
//!
//! let burn = forest.fork(history, forest.timeline_find(history, t(10.0)));
//! forest.push_back(burn, Timestamped::new(t(20.0), "burn"));
//!
//! let values: Vec<_> = forest.samples(burn).map(|s| s.value).collect();
//! assert_eq!(values, ["launch", "coast", "burn"]);
//! ```

mod cursor;
mod discrete;
pub mod error;
mod forest;
mod maintenance;
mod timeline;

pub use cursor::{Cursor, Samples};
pub use discrete::{DiscreteTimeline, Timestamped};
pub use error::ForkableError;
pub use forest::{Forest, ForkPosition};
pub use forkline_types::{ForkId, Instant};
pub use timeline::{LocalPosition, Timeline};
