//! The storage capability a fork node wraps.
//!
//! A [`Timeline`] is the strictly time-increasing sequence of samples one
//! node owns locally. Concrete trajectory kinds plug in their own storage;
//! the forest only ever talks to it through this trait.
//!
//! Local positions are indices into the timeline, with `len()` acting as the
//! end sentinel. Front insertion shifts every index by one.

use std::fmt::Debug;

/// Ordered, strictly time-increasing local sample storage.
pub trait Timeline: Default {
    /// The time axis samples are keyed by.
    type Time: Copy + Ord + Debug;

    /// What is stored at each time.
    type Sample;

    /// The time a sample is keyed by.
    fn time_of(sample: &Self::Sample) -> Self::Time;

    /// Number of samples stored locally.
    fn len(&self) -> usize;

    /// The sample at a local index.
    fn get(&self, index: usize) -> Option<&Self::Sample>;

    /// Index of the sample with exactly `time`.
    fn find(&self, time: Self::Time) -> Option<usize>;

    /// Index of the first sample with time ≥ `time`, or `len()` if none.
    fn lower_bound(&self, time: Self::Time) -> usize;

    /// Insert a sample before every stored sample.
    fn push_front(&mut self, sample: Self::Sample);

    /// Insert a sample after every stored sample.
    fn push_back(&mut self, sample: Self::Sample);

    /// Remove the earliest sample.
    fn pop_front(&mut self) -> Option<Self::Sample>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn time_at(&self, index: usize) -> Option<Self::Time> {
        self.get(index).map(Self::time_of)
    }

    fn first_time(&self) -> Option<Self::Time> {
        self.time_at(0)
    }

    fn last_time(&self) -> Option<Self::Time> {
        self.len().checked_sub(1).and_then(|last| self.time_at(last))
    }
}

/// A position within one node's local timeline.
///
/// `End` is one past the last local sample. Forking at `End` means "after
/// everything stored locally so far".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalPosition {
    Index(usize),
    End,
}

/// Turns a [`Timeline::find`] result into a position, absent meaning `End`.
impl From<Option<usize>> for LocalPosition {
    fn from(found: Option<usize>) -> Self {
        found.map_or(LocalPosition::End, LocalPosition::Index)
    }
}
