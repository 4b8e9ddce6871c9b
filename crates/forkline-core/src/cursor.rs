//! Walking a node's effective timeline.
//!
//! The effective timeline of a target node is never materialized. A
//! [`Cursor`] records, for each node from the root down to the target, how
//! many of that node's local samples belong to the lineage (its segment),
//! and steps across segment boundaries as it moves.
//!
//! A cursor borrows the forest, so the tree between the root and the target
//! cannot change while it is alive.

use std::fmt;
use std::iter::FusedIterator;

use crate::error::{ForkableError, fault};
use crate::forest::Forest;
use crate::timeline::Timeline;
use crate::ForkId;

/// The part of one node's local timeline that a lineage goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    node: ForkId,
    /// Local samples `0..len` belong to the lineage.
    len: usize,
}

/// A position in the effective timeline of a target node.
///
/// Equality compares the owning node and the local position only: the end
/// cursors of two different nodes are never equal, and cursors built for
/// different targets are equal when they sit on the same stored sample.
pub struct Cursor<'a, T: Timeline> {
    forest: &'a Forest<T>,
    /// Root first, target last.
    segments: Vec<Segment>,
    depth: usize,
    index: usize,
}

impl<'a, T: Timeline> Cursor<'a, T> {
    fn new(forest: &'a Forest<T>, segments: Vec<Segment>, depth: usize, index: usize) -> Self {
        let mut cursor = Self {
            forest,
            segments,
            depth,
            index,
        };
        cursor.normalize();
        cursor
    }

    /// The node whose local timeline the cursor is in.
    pub fn node(&self) -> ForkId {
        self.segments[self.depth].node
    }

    /// Position within [`Cursor::node`]'s local timeline.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The node this cursor walks the effective timeline of.
    pub fn target(&self) -> ForkId {
        self.segments[self.segments.len() - 1].node
    }

    pub fn is_end(&self) -> bool {
        self.depth + 1 == self.segments.len() && self.index == self.segments[self.depth].len
    }

    /// The sample under the cursor.
    pub fn sample(&self) -> &'a T::Sample {
        if self.is_end() {
            fault(ForkableError::DereferenceEnd(self.target()));
        }
        let forest: &'a Forest<T> = self.forest;
        match forest.node(self.node()).timeline.get(self.index) {
            Some(sample) => sample,
            None => fault(ForkableError::DereferenceEnd(self.target())),
        }
    }

    pub fn time(&self) -> T::Time {
        T::time_of(self.sample())
    }

    /// Step to the next sample, entering the next descendant's local
    /// timeline once this segment is exhausted.
    pub fn move_next(&mut self) {
        if self.is_end() {
            fault(ForkableError::IncrementPastEnd(self.target()));
        }
        self.index += 1;
        self.normalize();
    }

    /// Step to the previous sample, climbing to the parent's fork-point
    /// sample from the start of a local timeline.
    pub fn move_prev(&mut self) {
        loop {
            if self.index > 0 {
                self.index -= 1;
                return;
            }
            if self.depth == 0 {
                fault(ForkableError::DecrementPastBegin(self.target()));
            }
            self.depth -= 1;
            self.index = self.segments[self.depth].len;
        }
    }

    /// Iterate from this position to the end of the target.
    pub fn into_samples(self) -> Samples<'a, T> {
        let last = self.segments.len() - 1;
        let back = Cursor {
            forest: self.forest,
            segments: self.segments.clone(),
            depth: last,
            index: self.segments[last].len,
        };
        Samples { front: self, back }
    }

    /// Skip exhausted segments so that a position is represented one way
    /// only: either on a stored sample or at the target's end.
    fn normalize(&mut self) {
        while self.index == self.segments[self.depth].len && self.depth + 1 < self.segments.len() {
            self.depth += 1;
            self.index = 0;
        }
    }
}

impl<T: Timeline> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        Self {
            forest: self.forest,
            segments: self.segments.clone(),
            depth: self.depth,
            index: self.index,
        }
    }
}

impl<T: Timeline> PartialEq for Cursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.node() == other.node() && self.index == other.index
    }
}

impl<T: Timeline> Eq for Cursor<'_, T> {}

impl<T: Timeline> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("target", &self.target())
            .field("node", &self.node())
            .field("index", &self.index)
            .field("end", &self.is_end())
            .finish()
    }
}

/// Samples of an effective timeline, oldest first.
pub struct Samples<'a, T: Timeline> {
    front: Cursor<'a, T>,
    back: Cursor<'a, T>,
}

impl<'a, T: Timeline> Iterator for Samples<'a, T> {
    type Item = &'a T::Sample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let sample = self.front.sample();
        self.front.move_next();
        Some(sample)
    }
}

impl<T: Timeline> DoubleEndedIterator for Samples<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back.move_prev();
        Some(self.back.sample())
    }
}

impl<T: Timeline> FusedIterator for Samples<'_, T> {}

impl<T: Timeline> Forest<T> {
    /// The first sample of history as seen from `target`, or
    /// [`Forest::end`] if the whole lineage is empty.
    pub fn begin(&self, target: ForkId) -> Cursor<'_, T> {
        Cursor::new(self, self.segments(target), 0, 0)
    }

    /// One past the last local sample of `target`.
    pub fn end(&self, target: ForkId) -> Cursor<'_, T> {
        let segments = self.segments(target);
        let last = segments.len() - 1;
        let len = segments[last].len;
        Cursor::new(self, segments, last, len)
    }

    /// The sample at exactly `time` in the effective timeline of `target`,
    /// or its end.
    pub fn find(&self, target: ForkId, time: T::Time) -> Cursor<'_, T> {
        let segments = self.segments(target);
        for depth in (0..segments.len()).rev() {
            let segment = segments[depth];
            let timeline = &self.node(segment.node).timeline;
            match timeline.first_time() {
                Some(first) if segment.len > 0 && time >= first => {
                    return match timeline.find(time) {
                        Some(index) if index < segment.len => {
                            Cursor::new(self, segments, depth, index)
                        }
                        _ => self.end(target),
                    };
                }
                _ => {}
            }
        }
        self.end(target)
    }

    /// The first sample at or after `time` in the effective timeline of
    /// `target`, or its end.
    pub fn lower_bound(&self, target: ForkId, time: T::Time) -> Cursor<'_, T> {
        let segments = self.segments(target);
        for depth in (0..segments.len()).rev() {
            let segment = segments[depth];
            let timeline = &self.node(segment.node).timeline;
            match timeline.first_time() {
                Some(first) if segment.len > 0 && time >= first => {
                    let index = timeline.lower_bound(time).min(segment.len);
                    return Cursor::new(self, segments, depth, index);
                }
                _ => {}
            }
        }
        self.begin(target)
    }

    /// Cursor at the last sample `id` shares with its ancestors.
    pub fn fork_point(&self, id: ForkId) -> Cursor<'_, T> {
        if self.is_root(id) {
            fault(ForkableError::RootHasNoParent(id));
        }
        let segments = self.segments(id);
        let last = segments.len() - 1;
        match (0..last).rev().find(|&depth| segments[depth].len > 0) {
            Some(depth) => {
                let index = segments[depth].len - 1;
                Cursor::new(self, segments, depth, index)
            }
            None => fault(ForkableError::DecrementPastBegin(id)),
        }
    }

    /// Every sample of the effective timeline of `target`.
    pub fn samples(&self, target: ForkId) -> Samples<'_, T> {
        self.begin(target).into_samples()
    }

    /// Number of samples in the effective timeline of `target`.
    pub fn effective_len(&self, target: ForkId) -> usize {
        self.segments(target).iter().map(|s| s.len).sum()
    }

    /// Time of the last sample in the effective timeline of `target`.
    pub fn last_time(&self, target: ForkId) -> Option<T::Time> {
        self.samples(target).next_back().map(T::time_of)
    }

    fn segments(&self, target: ForkId) -> Vec<Segment> {
        let lineage = self.lineage(target);
        let mut segments: Vec<Segment> = lineage
            .windows(2)
            .map(|pair| Segment {
                node: pair[0],
                len: self.shared_len(pair[0], pair[1]),
            })
            .collect();
        segments.push(Segment {
            node: target,
            len: self.node(target).timeline.len(),
        });
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::tests::{TestForest, at, history, t, t1, t2, t3, t4, times};
    use crate::timeline::LocalPosition;

    fn after(forest: &TestForest, id: ForkId, time: crate::Instant) -> Vec<crate::Instant> {
        forest.find(id, time).into_samples().map(|s| s.time).collect()
    }

    #[test]
    fn test_begin_equals_end_on_empty_root() {
        let mut forest = TestForest::new();
        let root = forest.new_root();
        assert_eq!(forest.begin(root), forest.end(root));
        assert!(forest.begin(root).is_end());
        assert_eq!(forest.samples(root).count(), 0);
    }

    #[test]
    fn test_increment_no_fork() {
        let (forest, root) = history();
        let mut it = forest.begin(root);
        assert_eq!(it.time(), t1());
        it.move_next();
        assert_eq!(it.time(), t2());
        it.move_next();
        assert_eq!(it.time(), t3());
        it.move_next();
        assert_eq!(it, forest.end(root));
    }

    #[test]
    fn test_increment_across_fork() {
        let mut forest = TestForest::new();
        let root = forest.new_root();
        forest.push_back(root, at(t1()));
        forest.push_back(root, at(t2()));
        let fork = forest.fork(root, forest.timeline_find(root, t1()));
        forest.push_back(root, at(t4()));
        forest.push_back(fork, at(t3()));

        let mut it = forest.begin(fork);
        assert_eq!(it.time(), t1());
        it.move_next();
        assert_eq!(it.time(), t3());
        assert_eq!(it.node(), fork);
        it.move_next();
        assert_eq!(it, forest.end(fork));
    }

    #[test]
    fn test_increment_through_empty_forks() {
        let mut forest = TestForest::new();
        let root = forest.new_root();
        forest.push_back(root, at(t1()));
        forest.push_back(root, at(t2()));
        let fork1 = forest.fork(root, forest.timeline_find(root, t2()));
        let fork2 = forest.fork(fork1, forest.timeline_find(fork1, t2()));
        let fork3 = forest.fork(fork2, forest.timeline_find(fork2, t2()));

        let mut it = forest.begin(fork3);
        assert_eq!(it.time(), t1());
        it.move_next();
        assert_eq!(it.time(), t2());
        it.move_next();
        assert_eq!(it, forest.end(fork3));

        forest.push_back(fork3, at(t3()));
        let mut it = forest.end(fork3);
        it.move_prev();
        assert_eq!(it.time(), t3());
        assert_eq!(times(&forest, fork3), vec![t1(), t2(), t3()]);
    }

    #[test]
    fn test_decrement_no_fork() {
        let (forest, root) = history();
        let mut it = forest.end(root);
        it.move_prev();
        assert_eq!(it.time(), t3());
        it.move_prev();
        assert_eq!(it.time(), t2());
        it.move_prev();
        assert_eq!(it.time(), t1());
        assert_eq!(it, forest.begin(root));
    }

    #[test]
    fn test_decrement_across_fork() {
        let mut forest = TestForest::new();
        let root = forest.new_root();
        forest.push_back(root, at(t1()));
        forest.push_back(root, at(t2()));
        let fork = forest.fork(root, forest.timeline_find(root, t1()));
        forest.push_back(root, at(t4()));
        forest.push_back(fork, at(t3()));

        let mut it = forest.end(fork);
        it.move_prev();
        assert_eq!(it.time(), t3());
        it.move_prev();
        assert_eq!(it.time(), t1());
        assert_eq!(it.node(), root);
    }

    #[test]
    fn test_decrement_skips_samples_of_inherited_ancestors() {
        let mut forest = TestForest::new();
        let root = forest.new_root();
        forest.push_back(root, at(t1()));
        forest.push_back(root, at(t2()));
        let fork1 = forest.fork(root, forest.timeline_find(root, t2()));
        let fork2 = forest.fork(fork1, forest.timeline_find(fork1, t2()));
        let fork3 = forest.fork(fork2, forest.timeline_find(fork2, t2()));
        forest.push_back(fork2, at(t3()));

        let mut it = forest.end(fork3);
        it.move_prev();
        assert_eq!(it.time(), t2());
        it.move_prev();
        assert_eq!(it.time(), t1());
        assert_eq!(it, forest.begin(fork3));
    }

    #[test]
    #[should_panic(expected = "cannot decrement before the beginning")]
    fn test_decrement_empty_root_faults() {
        let mut forest = TestForest::new();
        let root = forest.new_root();
        let mut it = forest.end(root);
        it.move_prev();
    }

    #[test]
    #[should_panic(expected = "cannot decrement before the beginning")]
    fn test_decrement_before_first_sample_faults() {
        let (mut forest, root) = history();
        let fork = forest.fork(root, LocalPosition::Index(2));
        let mut it = forest.begin(fork);
        it.move_prev();
    }

    #[test]
    #[should_panic(expected = "current != end")]
    fn test_increment_at_end_faults() {
        let mut forest = TestForest::new();
        let root = forest.new_root();
        let mut it = forest.begin(root);
        it.move_next();
    }

    #[test]
    #[should_panic(expected = "dereference the end")]
    fn test_dereference_end_faults() {
        let (forest, root) = history();
        forest.end(root).sample();
    }

    #[test]
    fn test_end_cursors_of_siblings_differ() {
        let mut forest = TestForest::new();
        let root = forest.new_root();
        forest.push_back(root, at(t1()));
        forest.push_back(root, at(t2()));
        let fork1 = forest.fork(root, forest.timeline_find(root, t1()));
        let fork2 = forest.fork(root, forest.timeline_find(root, t2()));
        assert_ne!(forest.end(fork1), forest.end(fork2));

        let twin = forest.fork(root, forest.timeline_find(root, t2()));
        assert_ne!(forest.end(fork2), forest.end(twin));
    }

    #[test]
    fn test_begin_from_fork() {
        let (mut forest, root) = history();
        let fork = forest.fork(root, forest.timeline_find(root, t2()));
        forest.push_back(fork, at(t4()));

        let mut it = forest.begin(fork);
        assert_ne!(it, forest.end(fork));
        assert_eq!(it.time(), t1());
        it.move_next();
        assert_eq!(it.time(), t2());
        it.move_next();
        assert_eq!(it.time(), t4());
        it.move_next();
        assert_eq!(it, forest.end(fork));
    }

    #[test]
    fn test_find() {
        let mut forest = TestForest::new();
        let root = forest.new_root();
        assert_eq!(forest.find(root, t(0.0)), forest.end(root));

        for time in [t1(), t2(), t3()] {
            forest.push_back(root, at(time));
        }
        assert_eq!(forest.find(root, t(0.0)), forest.end(root));
        assert_eq!(forest.find(root, t1()).time(), t1());
        assert_eq!(forest.find(root, t2()).time(), t2());
        assert_eq!(forest.find(root, t4()), forest.end(root));

        let fork = forest.fork(root, forest.timeline_find(root, t2()));
        forest.push_back(fork, at(t4()));
        assert_eq!(forest.find(fork, t(0.0)), forest.end(fork));
        assert_eq!(forest.find(fork, t1()).time(), t1());
        assert_eq!(forest.find(fork, t2()).time(), t2());
        assert_eq!(forest.find(fork, t4()).time(), t4());
        assert_eq!(forest.find(fork, t4().plus_seconds(1.0)), forest.end(fork));
        // t3 is on the parent, past the fork point.
        assert_eq!(forest.find(fork, t3()), forest.end(fork));
    }

    #[test]
    fn test_lower_bound() {
        let mut forest = TestForest::new();
        let root = forest.new_root();
        assert_eq!(forest.lower_bound(root, t(0.0)), forest.end(root));

        for time in [t1(), t2(), t3()] {
            forest.push_back(root, at(time));
        }
        assert_eq!(forest.lower_bound(root, t(0.0)).time(), t1());
        assert_eq!(forest.lower_bound(root, t1()).time(), t1());
        assert_eq!(forest.lower_bound(root, t2()).time(), t2());
        assert_eq!(forest.lower_bound(root, t4()), forest.end(root));

        let fork = forest.fork(root, forest.timeline_find(root, t2()));
        forest.push_back(fork, at(t4()));
        assert_eq!(forest.lower_bound(fork, t(0.0)).time(), t1());
        assert_eq!(forest.lower_bound(fork, t1()).time(), t1());
        assert_eq!(forest.lower_bound(fork, t2()).time(), t2());
        // Between the fork point and the fork's first sample.
        assert_eq!(forest.lower_bound(fork, t3()).time(), t4());
        assert_eq!(forest.lower_bound(fork, t4()).time(), t4());
        assert_eq!(forest.lower_bound(fork, t4().plus_seconds(1.0)), forest.end(fork));
    }

    #[test]
    fn test_fork_point() {
        let (mut forest, root) = history();
        let fork1 = forest.fork(root, forest.timeline_find(root, t3()));
        let fork2 = forest.fork(fork1, LocalPosition::End);
        let fork3 = forest.fork(fork2, LocalPosition::End);

        assert_eq!(forest.fork_point(fork1).time(), t3());
        assert_eq!(forest.fork_point(fork2).time(), t3());
        assert_eq!(forest.fork_point(fork3).node(), root);

        assert_eq!(after(&forest, fork3, t3()), vec![t3()]);
        assert_eq!(after(&forest, fork2, t3()), vec![t3()]);

        forest.push_back(fork1, at(t4()));
        assert_eq!(after(&forest, fork1, t3()), vec![t3(), t4()]);
        assert_eq!(after(&forest, fork3, t2()), vec![t2(), t3()]);
    }

    #[test]
    #[should_panic(expected = "!is_root")]
    fn test_fork_point_of_root_faults() {
        let (forest, root) = history();
        forest.fork_point(root);
    }

    #[test]
    fn test_samples_double_ended() {
        let (mut forest, root) = history();
        let fork = forest.fork(root, forest.timeline_find(root, t2()));
        forest.push_back(fork, at(t4()));

        let backwards: Vec<_> = forest.samples(fork).rev().map(|s| s.time).collect();
        assert_eq!(backwards, vec![t4(), t2(), t1()]);

        let mut samples = forest.samples(fork);
        assert_eq!(samples.next().map(|s| s.time), Some(t1()));
        assert_eq!(samples.next_back().map(|s| s.time), Some(t4()));
        assert_eq!(samples.next().map(|s| s.time), Some(t2()));
        assert_eq!(samples.next_back(), None);
        assert_eq!(samples.next(), None);
    }

    #[test]
    fn test_effective_len_and_last_time() {
        let (mut forest, root) = history();
        let fork = forest.fork(root, forest.timeline_find(root, t1()));
        assert_eq!(forest.effective_len(root), 3);
        assert_eq!(forest.effective_len(fork), 1);
        assert_eq!(forest.last_time(fork), Some(t1()));
        forest.push_back(fork, at(t4()));
        assert_eq!(forest.last_time(fork), Some(t4()));

        let empty = forest.new_root();
        assert_eq!(forest.last_time(empty), None);
    }
}
