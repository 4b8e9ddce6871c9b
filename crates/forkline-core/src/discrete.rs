//! The stock timeline: discrete samples in a deque.

use std::collections::VecDeque;

use crate::Instant;
use crate::error::{ForkableError, fault};
use crate::timeline::Timeline;

/// A value tagged with the instant it describes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timestamped<V> {
    pub time: Instant,
    pub value: V,
}

impl<V> Timestamped<V> {
    pub fn new(time: Instant, value: V) -> Self {
        Self { time, value }
    }
}

/// Discrete samples ordered by time, searched by bisection.
///
/// Front and back insertion are O(1), which is what copied-begin handling
/// and history trimming need.
#[derive(Debug, Clone)]
pub struct DiscreteTimeline<V> {
    samples: VecDeque<Timestamped<V>>,
}

impl<V> Default for DiscreteTimeline<V> {
    fn default() -> Self {
        Self {
            samples: VecDeque::new(),
        }
    }
}

impl<V> DiscreteTimeline<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from samples that are already strictly increasing in time.
    ///
    /// Faults if two consecutive samples are not strictly increasing.
    pub fn from_samples(samples: impl IntoIterator<Item = Timestamped<V>>) -> Self {
        let mut timeline = Self::new();
        for sample in samples {
            timeline.push_back(sample);
        }
        timeline
    }

    /// Times of the local samples, oldest first.
    pub fn times(&self) -> Vec<Instant> {
        self.samples.iter().map(|s| s.time).collect()
    }
}

impl<V> Timeline for DiscreteTimeline<V> {
    type Time = Instant;
    type Sample = Timestamped<V>;

    fn time_of(sample: &Timestamped<V>) -> Instant {
        sample.time
    }

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn get(&self, index: usize) -> Option<&Timestamped<V>> {
        self.samples.get(index)
    }

    fn find(&self, time: Instant) -> Option<usize> {
        self.samples.binary_search_by(|s| s.time.cmp(&time)).ok()
    }

    fn lower_bound(&self, time: Instant) -> usize {
        self.samples.partition_point(|s| s.time < time)
    }

    fn push_front(&mut self, sample: Timestamped<V>) {
        if let Some(first) = self.samples.front()
            && sample.time >= first.time
        {
            unordered(sample.time, "not before the first local sample");
        }
        self.samples.push_front(sample);
    }

    fn push_back(&mut self, sample: Timestamped<V>) {
        if let Some(last) = self.samples.back()
            && sample.time <= last.time
        {
            unordered(sample.time, "not after the last local sample");
        }
        self.samples.push_back(sample);
    }

    fn pop_front(&mut self) -> Option<Timestamped<V>> {
        self.samples.pop_front()
    }
}

#[track_caller]
fn unordered(time: Instant, reason: &'static str) -> ! {
    fault(ForkableError::UnorderedTimeline {
        time: format!("{time:?}"),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(seconds: f64) -> Instant {
        Instant::from_seconds(seconds)
    }

    fn timeline(times: &[f64]) -> DiscreteTimeline<()> {
        DiscreteTimeline::from_samples(times.iter().map(|&s| Timestamped::new(t(s), ())))
    }

    #[test]
    fn test_find_exact_only() {
        let tl = timeline(&[7.0, 17.0, 27.0]);
        assert_eq!(tl.find(t(17.0)), Some(1));
        assert_eq!(tl.find(t(18.0)), None);
        assert_eq!(tl.find(t(0.0)), None);
    }

    #[test]
    fn test_lower_bound() {
        let tl = timeline(&[7.0, 17.0, 27.0]);
        assert_eq!(tl.lower_bound(t(0.0)), 0);
        assert_eq!(tl.lower_bound(t(7.0)), 0);
        assert_eq!(tl.lower_bound(t(8.0)), 1);
        assert_eq!(tl.lower_bound(t(27.0)), 2);
        assert_eq!(tl.lower_bound(t(37.0)), 3);
    }

    #[test]
    fn test_front_and_back_insertion() {
        let mut tl = timeline(&[17.0]);
        tl.push_front(Timestamped::new(t(7.0), ()));
        tl.push_back(Timestamped::new(t(27.0), ()));
        assert_eq!(tl.times(), vec![t(7.0), t(17.0), t(27.0)]);
        assert_eq!(tl.first_time(), Some(t(7.0)));
        assert_eq!(tl.last_time(), Some(t(27.0)));
        assert_eq!(tl.pop_front().map(|s| s.time), Some(t(7.0)));
        assert_eq!(tl.len(), 2);
    }

    #[test]
    fn test_empty() {
        let tl = DiscreteTimeline::<()>::new();
        assert!(tl.is_empty());
        assert_eq!(tl.last_time(), None);
        assert_eq!(tl.lower_bound(t(1.0)), 0);
    }

    #[test]
    #[should_panic(expected = "not after the last local sample")]
    fn test_push_back_out_of_order() {
        let mut tl = timeline(&[17.0]);
        tl.push_back(Timestamped::new(t(17.0), ()));
    }

    #[test]
    #[should_panic(expected = "not before the first local sample")]
    fn test_push_front_out_of_order() {
        let mut tl = timeline(&[17.0]);
        tl.push_front(Timestamped::new(t(27.0), ()));
    }

    #[test]
    #[should_panic(expected = "breaks time ordering of the timeline")]
    fn test_from_unordered_samples_faults() {
        timeline(&[7.0, 27.0, 17.0]);
    }
}
