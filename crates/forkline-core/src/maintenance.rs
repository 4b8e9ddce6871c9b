//! Whole-tree upkeep: pruning forks after a cutoff and checking that
//! history can be trimmed.
//!
//! Walks use an explicit stack; fork chains can be deep.

use crate::error::{ForkableError, fault};
use crate::forest::Forest;
use crate::timeline::Timeline;
use crate::ForkId;

impl<T: Timeline> Forest<T> {
    /// Every node below `id`, in depth-first pre-order. `id` itself is not
    /// included.
    pub fn descendants(&self, id: ForkId) -> Vec<ForkId> {
        let mut result = Vec::new();
        let mut stack: Vec<ForkId> = self.node(id).children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            // Push children in reverse to keep creation order.
            stack.extend(self.node(current).children.iter().rev().copied());
        }
        result
    }

    /// Destroy every fork below `id` whose fork time is after `time`.
    ///
    /// Forks at or before `time` are kept and their own forks filtered the
    /// same way. `time` may not precede the fork time of `id` itself.
    pub fn delete_all_forks_after(&mut self, id: ForkId, time: T::Time) {
        if let Some(fork) = self.fork_time(id)
            && time < fork
        {
            fault(ForkableError::PruneBeforeForkTime {
                node: id,
                time: format!("{time:?}"),
                fork: format!("{fork:?}"),
            });
        }

        let mut doomed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            for &child in &self.node(current).children {
                match self.fork_time(child) {
                    Some(fork) if fork > time => doomed.push((current, child)),
                    _ => stack.push(child),
                }
            }
        }

        let mut removed = 0;
        for (parent, child) in doomed {
            self.node_mut(parent).children.retain(|&c| c != child);
            removed += self.remove_subtree(child);
        }
        tracing::debug!(?id, ?time, removed, "deleted forks after cutoff");
    }

    /// Number of forks in the tree of `root` whose fork time is at or
    /// before `time`.
    pub fn count_forks_at_or_before(&self, root: ForkId, time: T::Time) -> usize {
        self.descendants(root)
            .into_iter()
            .filter(|&fork| matches!(self.fork_time(fork), Some(t) if t <= time))
            .count()
    }

    /// Ensure no fork of the tree rooted at `root` hangs off a sample at or
    /// before `time`, so that history up to `time` can be trimmed.
    pub fn check_no_forks_before(&self, root: ForkId, time: T::Time) {
        if !self.is_root(root) {
            fault(ForkableError::NonRootCheck(root));
        }
        let count = self.count_forks_at_or_before(root, time);
        if count > 0 {
            fault(ForkableError::ForksBeforeTime {
                root,
                count,
                time: format!("{time:?}"),
            });
        }
    }
}
