//! Shared time and identity types for forkline.
//!
//! A pure leaf crate with **no internal forkline dependencies**: the time
//! axis every timeline sample is keyed by, and the typed identifier of a
//! node in a fork forest.
//!
//! |--------------|-----------------------------------------|
//! | Type         | Purpose                                 |
//! |--------------|-----------------------------------------|
//! | [`Instant`]  | Seconds since J2000, totally ordered    |
//! | [`ForkId`]   | Which node of a fork forest             |
//! |--------------|-----------------------------------------|

pub mod ids;
pub mod time;

pub use ids::ForkId;
pub use time::Instant;
