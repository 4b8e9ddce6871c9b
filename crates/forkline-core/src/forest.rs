//! Fork nodes and the arena that owns them.
//!
//! A [`Forest`] holds any number of trees. Each node owns its local
//! [`Timeline`] and, through its `children` list, the nodes forked from it.
//! The `parent` link is a plain id and never owns anything.
//!
//! A child's fork position always refers to its parent's *local* timeline.

use std::collections::HashMap;

use crate::error::{ForkableError, fault};
use crate::timeline::{LocalPosition, Timeline};
use crate::ForkId;

/// Where a child's lineage leaves its parent's local timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkPosition<Time> {
    /// The child shares the parent's local samples up to and including the
    /// one at this time.
    Sample(Time),
    /// The child shares none of the parent's local samples. Its fork time is
    /// the parent's own fork time.
    Inherited,
}

/// One node of a fork tree.
#[derive(Debug)]
pub(crate) struct ForkNode<T: Timeline> {
    /// `None` for a root.
    pub(crate) parent: Option<ForkId>,
    /// `None` exactly when `parent` is `None`.
    pub(crate) fork_position: Option<ForkPosition<T::Time>>,
    pub(crate) timeline: T,
    /// Exclusively owned; removing an id from here destroys that subtree.
    pub(crate) children: Vec<ForkId>,
}

impl<T: Timeline> ForkNode<T> {
    fn root(timeline: T) -> Self {
        Self {
            parent: None,
            fork_position: None,
            timeline,
            children: Vec::new(),
        }
    }
}

/// Arena owning every node of a set of fork trees.
///
/// Roots belong to the caller: the forest keeps them alive until
/// [`Forest::delete_tree`] or until they are attached under another node.
/// Everything else is owned by its parent.
#[derive(Debug)]
pub struct Forest<T: Timeline> {
    pub(crate) nodes: HashMap<ForkId, ForkNode<T>>,
}

impl<T: Timeline> Default for Forest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Timeline> Forest<T> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Create a root with an empty timeline.
    pub fn new_root(&mut self) -> ForkId {
        self.new_root_with(T::default())
    }

    /// Create a root owning an existing timeline.
    pub fn new_root_with(&mut self, timeline: T) -> ForkId {
        let id = ForkId::new();
        self.nodes.insert(id, ForkNode::root(timeline));
        tracing::debug!(root = ?id, "created root");
        id
    }

    /// Destroy a root and everything forked from it.
    pub fn delete_tree(&mut self, root: ForkId) {
        if self.node(root).parent.is_some() {
            fault(ForkableError::NotARoot(root));
        }
        let removed = self.remove_subtree(root);
        tracing::debug!(?root, removed, "deleted tree");
    }

    pub fn contains(&self, id: ForkId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes across all trees.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Ids of every root in the forest, in no particular order.
    pub fn roots(&self) -> impl Iterator<Item = ForkId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| *id)
    }

    // ── Navigation ──────────────────────────────────────────────────────

    pub fn is_root(&self, id: ForkId) -> bool {
        self.node(id).parent.is_none()
    }

    pub fn parent(&self, id: ForkId) -> Option<ForkId> {
        self.node(id).parent
    }

    pub fn children(&self, id: ForkId) -> &[ForkId] {
        &self.node(id).children
    }

    /// The root of the tree `id` belongs to.
    pub fn root(&self, id: ForkId) -> ForkId {
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            current = parent;
        }
        current
    }

    /// Path from the root down to `id`, both inclusive.
    pub fn lineage(&self, id: ForkId) -> Vec<ForkId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    pub fn fork_position(&self, id: ForkId) -> Option<ForkPosition<T::Time>> {
        self.node(id).fork_position
    }

    /// Time of the last sample `id` shares with its parent, `None` for a root.
    ///
    /// `Inherited` positions resolve upward to the first ancestor that forks
    /// at an actual sample.
    pub fn fork_time(&self, id: ForkId) -> Option<T::Time> {
        let mut current = id;
        loop {
            let node = self.node(current);
            match (node.fork_position, node.parent) {
                (Some(ForkPosition::Sample(time)), _) => return Some(time),
                (Some(ForkPosition::Inherited), Some(parent)) => current = parent,
                _ => return None,
            }
        }
    }

    /// The samples `id` owns locally, excluding anything inherited.
    pub fn timeline(&self, id: ForkId) -> &T {
        &self.node(id).timeline
    }

    /// Local position of the sample at exactly `time`, `End` if absent.
    pub fn timeline_find(&self, id: ForkId, time: T::Time) -> LocalPosition {
        self.node(id).timeline.find(time).into()
    }

    /// Local position of the first sample at or after `time`.
    pub fn timeline_lower_bound(&self, id: ForkId, time: T::Time) -> LocalPosition {
        let timeline = &self.node(id).timeline;
        let index = timeline.lower_bound(time);
        if index < timeline.len() {
            LocalPosition::Index(index)
        } else {
            LocalPosition::End
        }
    }

    // ── Structure ───────────────────────────────────────────────────────

    /// Create a child of `parent` diverging after `position` in the parent's
    /// local timeline.
    ///
    /// `End` forks after the last local sample. On a node with no local
    /// samples it forks where that node itself forked, sharing nothing local.
    /// `End` on a root faults: a missed [`Forest::timeline_find`] must not
    /// silently fork at another sample. The child starts empty and is owned
    /// by `parent`.
    pub fn fork(&mut self, parent: ForkId, position: LocalPosition) -> ForkId {
        let fork_position = match position {
            LocalPosition::Index(index) => {
                let timeline = &self.node(parent).timeline;
                match timeline.time_at(index) {
                    Some(time) => ForkPosition::Sample(time),
                    None => fault(ForkableError::PositionOutOfRange {
                        node: parent,
                        index,
                        len: timeline.len(),
                    }),
                }
            }
            LocalPosition::End => self.fork_end_position(parent),
        };

        let child = ForkId::new();
        self.nodes.insert(
            child,
            ForkNode {
                parent: Some(parent),
                fork_position: Some(fork_position),
                timeline: T::default(),
                children: Vec::new(),
            },
        );
        self.node_mut(parent).children.push(child);
        tracing::debug!(?parent, ?child, ?fork_position, "created fork");
        child
    }

    /// Destroy `child` and its whole subtree. `child` must be a direct child
    /// of `parent`.
    pub fn delete_fork(&mut self, parent: ForkId, child: ForkId) {
        match self.node(child).parent {
            None => fault(ForkableError::RootHasNoParent(child)),
            Some(actual) if actual != parent => {
                fault(ForkableError::NotAChild { parent, child })
            }
            Some(_) => {}
        }
        self.node_mut(parent).children.retain(|&c| c != child);
        let removed = self.remove_subtree(child);
        tracing::debug!(?parent, ?child, removed, "deleted fork");
    }

    /// Make the root `node` a child of `parent`, forking after the parent's
    /// current last local sample.
    ///
    /// `node` must start with a copy of that sample (the copied begin). The
    /// duplicate stays visible until the caller removes it with
    /// [`Forest::pop_front`].
    pub fn attach_fork_to_copied_begin(&mut self, parent: ForkId, node: ForkId) {
        let attached = self.node(node);
        if attached.parent.is_some() {
            fault(ForkableError::NotARoot(node));
        }
        let Some(begin) = attached.timeline.first_time() else {
            fault(ForkableError::EmptyAttachment(node));
        };
        if self.root(parent) == node {
            fault(ForkableError::CycleAttachment { parent, node });
        }

        let fork_position = self.attach_position(parent);
        let Some(fork) = self.position_time(parent, fork_position) else {
            fault(ForkableError::EmptyRootFork(parent));
        };
        if begin != fork {
            fault(ForkableError::CopiedBeginMismatch {
                node,
                begin: format!("{begin:?}"),
                fork: format!("{fork:?}"),
            });
        }

        let attached = self.node_mut(node);
        attached.parent = Some(parent);
        attached.fork_position = Some(fork_position);
        self.node_mut(parent).children.push(node);
        tracing::debug!(?parent, ?node, ?fork_position, "attached fork");
    }

    /// Cut `node` loose from its parent and hand it back as a new root.
    ///
    /// `node` must already start with a copy of its fork-point sample: once
    /// detached, the ancestor that held it is unreachable. Descendants stay
    /// attached beneath `node`.
    pub fn detach_fork_with_copied_begin(&mut self, node: ForkId) -> ForkId {
        let Some(parent) = self.node(node).parent else {
            fault(ForkableError::RootHasNoParent(node));
        };
        let Some(fork) = self.fork_time(node) else {
            fault(ForkableError::RootHasNoParent(node));
        };
        let begin = self.node(node).timeline.first_time();
        if begin != Some(fork) {
            fault(ForkableError::MissingCopiedBegin {
                node,
                fork: format!("{fork:?}"),
            });
        }

        self.node_mut(parent).children.retain(|&c| c != node);
        let detached = self.node_mut(node);
        detached.parent = None;
        detached.fork_position = None;

        // Children that shared nothing local now fork at the copied begin,
        // since there is no ancestor left to resolve their fork time against.
        let children = detached.children.clone();
        for child in children {
            let child_node = self.node_mut(child);
            if child_node.fork_position == Some(ForkPosition::Inherited) {
                child_node.fork_position = Some(ForkPosition::Sample(fork));
            }
        }
        tracing::debug!(?parent, ?node, "detached fork");
        node
    }

    // ── Samples ─────────────────────────────────────────────────────────

    /// Append a sample after everything `id` stores locally.
    pub fn push_back(&mut self, id: ForkId, sample: T::Sample) {
        let time = T::time_of(&sample);
        match self.node(id).timeline.last_time() {
            Some(last) if time <= last => self.unordered(id, time, "not after the last local sample"),
            Some(_) => {}
            None => self.check_not_before_fork(id, time),
        }
        tracing::trace!(?id, ?time, "push_back");
        self.node_mut(id).timeline.push_back(sample);
    }

    /// Insert a sample before everything `id` stores locally.
    ///
    /// A sample at exactly the fork time is the copied begin.
    pub fn push_front(&mut self, id: ForkId, sample: T::Sample) {
        let time = T::time_of(&sample);
        if let Some(first) = self.node(id).timeline.first_time()
            && time >= first
        {
            self.unordered(id, time, "not before the first local sample");
        }
        self.check_not_before_fork(id, time);
        tracing::trace!(?id, ?time, "push_front");
        self.node_mut(id).timeline.push_front(sample);
    }

    /// Remove the earliest local sample of `id`.
    ///
    /// Removing the copied begin of a non-root re-points the children forked
    /// at it to the inherited fork point, which holds the same time. Removing
    /// any other sample a child forks at is a fault.
    pub fn pop_front(&mut self, id: ForkId) -> Option<T::Sample> {
        let first = self.node(id).timeline.first_time()?;
        let forked_here: Vec<ForkId> = self
            .node(id)
            .children
            .iter()
            .copied()
            .filter(|&c| self.node(c).fork_position == Some(ForkPosition::Sample(first)))
            .collect();

        if let Some(&child) = forked_here.first() {
            if self.fork_time(id) != Some(first) {
                fault(ForkableError::DanglingForkPosition {
                    parent: id,
                    child,
                    fork: format!("{first:?}"),
                });
            }
            for child in forked_here {
                self.node_mut(child).fork_position = Some(ForkPosition::Inherited);
            }
        }
        tracing::trace!(?id, time = ?first, "pop_front");
        self.node_mut(id).timeline.pop_front()
    }

    // ── Internals ───────────────────────────────────────────────────────

    #[track_caller]
    pub(crate) fn node(&self, id: ForkId) -> &ForkNode<T> {
        match self.nodes.get(&id) {
            Some(node) => node,
            None => fault(ForkableError::UnknownFork(id)),
        }
    }

    #[track_caller]
    pub(crate) fn node_mut(&mut self, id: ForkId) -> &mut ForkNode<T> {
        match self.nodes.get_mut(&id) {
            Some(node) => node,
            None => fault(ForkableError::UnknownFork(id)),
        }
    }

    /// How many of `parent`'s local samples the lineage through `child`
    /// covers.
    pub(crate) fn shared_len(&self, parent: ForkId, child: ForkId) -> usize {
        match self.node(child).fork_position {
            Some(ForkPosition::Sample(time)) => match self.node(parent).timeline.find(time) {
                Some(index) => index + 1,
                None => fault(ForkableError::DanglingForkPosition {
                    parent,
                    child,
                    fork: format!("{time:?}"),
                }),
            },
            Some(ForkPosition::Inherited) | None => 0,
        }
    }

    /// Remove `id` and its descendants from the arena. The caller unlinks
    /// `id` from its parent.
    pub(crate) fn remove_subtree(&mut self, id: ForkId) -> usize {
        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                removed += 1;
                stack.extend(node.children);
            }
        }
        removed
    }

    /// The position `End` denotes when forking from `parent`.
    fn fork_end_position(&self, parent: ForkId) -> ForkPosition<T::Time> {
        let node = self.node(parent);
        if node.parent.is_none() {
            fault(ForkableError::RootHasNoParent(parent));
        }
        match node.timeline.last_time() {
            Some(last) => ForkPosition::Sample(last),
            None => ForkPosition::Inherited,
        }
    }

    /// Where a node attached under `parent` forks: after its last local
    /// sample, or where `parent` itself forked if it has none.
    fn attach_position(&self, parent: ForkId) -> ForkPosition<T::Time> {
        let node = self.node(parent);
        match node.timeline.last_time() {
            Some(last) => ForkPosition::Sample(last),
            None if node.parent.is_some() => ForkPosition::Inherited,
            None => fault(ForkableError::EmptyRootFork(parent)),
        }
    }

    /// The time a child of `parent` at `position` forks at.
    fn position_time(
        &self,
        parent: ForkId,
        position: ForkPosition<T::Time>,
    ) -> Option<T::Time> {
        match position {
            ForkPosition::Sample(time) => Some(time),
            ForkPosition::Inherited => self.fork_time(parent),
        }
    }

    fn check_not_before_fork(&self, id: ForkId, time: T::Time) {
        if let Some(fork) = self.fork_time(id)
            && time < fork
        {
            self.unordered(id, time, "before the fork time");
        }
    }

    #[track_caller]
    fn unordered(&self, node: ForkId, time: T::Time, reason: &'static str) -> ! {
        fault(ForkableError::UnorderedSample {
            node,
            time: format!("{time:?}"),
            reason,
        })
    }
}
