//! Object-lifetime graph: per-object nodes with parent edges, in-use
//! queries, and cascading invalidation.
//!
//! "Parent" follows the tracked-object convention: the parents of a node are
//! the objects that depend on it (a framebuffer is a parent of each image
//! view it was built from; a command buffer is a parent of the pipelines and
//! framebuffers it recorded). Destroying an object therefore notifies its
//! parents, and their parents, up to the roots. The object model guarantees
//! this graph is a DAG -- edges may only point at objects that already
//! existed when the edge was added -- so no cycle detection is performed; a
//! depth cap bounds the damage if a caller breaks that contract.
//!
//! Nodes live in an arena and edges are generation-checked indices, so a
//! stale edge to a freed slot is skipped rather than dereferenced.

use parking_lot::RwLock;
use tracing::warn;
use vkguard_types::ObjectHandle;

use crate::external::SubmissionTracker;

/// Traversal depth cap for in-use queries and invalidation cascades.
/// Deep enough for any real object hierarchy.
const MAX_TRAVERSAL_DEPTH: usize = 64;

/// Index-based weak reference to a node. Stale after the node is freed;
/// the generation check makes dereferencing a stale id a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

struct Node {
    handle: ObjectHandle,
    destroyed: bool,
    /// Objects that depend on this one
    parents: Vec<NodeId>,
    /// One entry per invalidation notification received, carrying the path
    /// from the destroyed object up to (and including) this node. Diamond
    /// shapes produce one entry per path; that duplication is the observed
    /// contract and is deliberately not deduplicated.
    invalidation_paths: Vec<Vec<ObjectHandle>>,
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Default)]
struct GraphInner {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl GraphInner {
    fn node(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    fn notify_invalidate(&mut self, id: NodeId, path: &[ObjectHandle], unlink: bool, depth: usize) {
        if depth == 0 {
            warn!("invalidation cascade exceeded depth cap; graph is not a DAG?");
            return;
        }
        let Some(node) = self.node_mut(id) else {
            return;
        };

        let mut extended = path.to_vec();
        extended.push(node.handle);
        node.invalidation_paths.push(extended.clone());

        let parents = node.parents.clone();
        for parent in parents {
            self.notify_invalidate(parent, &extended, unlink, depth - 1);
        }
        if unlink {
            if let Some(node) = self.node_mut(id) {
                node.parents.clear();
            }
        }
    }

    fn in_use(&self, id: NodeId, tracker: &dyn SubmissionTracker, depth: usize) -> bool {
        if depth == 0 {
            warn!("in-use traversal exceeded depth cap; graph is not a DAG?");
            return false;
        }
        let Some(node) = self.node(id) else {
            return false;
        };
        if tracker.is_queued(node.handle) {
            return true;
        }
        node.parents
            .iter()
            .any(|&parent| self.in_use(parent, tracker, depth - 1))
    }
}

/// The shared lifetime graph of one device context. In-use queries take the
/// read lock; all mutation, including a full invalidation cascade, holds the
/// write lock so concurrent readers never observe a half-invalidated graph.
#[derive(Default)]
pub struct LifetimeGraph {
    inner: RwLock<GraphInner>,
}

impl LifetimeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node for a freshly created object.
    pub fn insert(&self, handle: ObjectHandle) -> NodeId {
        let mut inner = self.inner.write();
        let node = Node {
            handle,
            destroyed: false,
            parents: Vec::new(),
            invalidation_paths: Vec::new(),
        };
        if let Some(index) = inner.free.pop() {
            let slot = &mut inner.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = inner.slots.len() as u32;
            inner.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Free a node's slot. Call only after its invalidation cascade has run;
    /// edges still pointing here become stale and are skipped thereafter.
    pub fn remove(&self, id: NodeId) {
        let mut inner = self.inner.write();
        let Some(slot) = inner.slots.get_mut(id.index as usize) else {
            return;
        };
        if slot.generation == id.generation && slot.node.take().is_some() {
            slot.generation = slot.generation.wrapping_add(1);
            inner.free.push(id.index);
        }
    }

    /// Record that `parent` depends on `child`. Idempotent; returns whether
    /// the edge was newly added.
    pub fn add_parent(&self, child: NodeId, parent: NodeId) -> bool {
        let mut inner = self.inner.write();
        let Some(node) = inner.node_mut(child) else {
            return false;
        };
        if node.parents.contains(&parent) {
            return false;
        }
        node.parents.push(parent);
        true
    }

    /// Remove a parent edge. No error if the edge is absent.
    pub fn remove_parent(&self, child: NodeId, parent: NodeId) {
        let mut inner = self.inner.write();
        if let Some(node) = inner.node_mut(child) {
            node.parents.retain(|&p| p != parent);
        }
    }

    /// True once `invalidate` has run for this node.
    pub fn destroyed(&self, id: NodeId) -> bool {
        self.inner.read().node(id).is_some_and(|n| n.destroyed)
    }

    pub fn handle_of(&self, id: NodeId) -> Option<ObjectHandle> {
        self.inner.read().node(id).map(|n| n.handle)
    }

    /// True if this node, or any transitive parent, is queued for execution.
    pub fn in_use(&self, id: NodeId, tracker: &dyn SubmissionTracker) -> bool {
        self.inner.read().in_use(id, tracker, MAX_TRAVERSAL_DEPTH)
    }

    /// Mark the node destroyed and notify every direct parent with the path
    /// list seeded with this node. The whole cascade runs under one write
    /// lock. If `unlink`, the node's own parent set is cleared afterwards.
    pub fn invalidate(&self, id: NodeId, unlink: bool) {
        let mut inner = self.inner.write();
        let Some(node) = inner.node_mut(id) else {
            return;
        };
        node.destroyed = true;
        let path = vec![node.handle];
        let parents = node.parents.clone();
        for parent in parents {
            inner.notify_invalidate(parent, &path, unlink, MAX_TRAVERSAL_DEPTH);
        }
        if unlink {
            if let Some(node) = inner.node_mut(id) {
                node.parents.clear();
            }
        }
    }

    /// Invalidation paths recorded at this node, oldest first.
    pub fn invalidation_paths(&self, id: NodeId) -> Vec<Vec<ObjectHandle>> {
        self.inner
            .read()
            .node(id)
            .map(|n| n.invalidation_paths.clone())
            .unwrap_or_default()
    }

    /// Number of invalidation notifications this node has received.
    pub fn invalidation_count(&self, id: NodeId) -> usize {
        self.inner
            .read()
            .node(id)
            .map(|n| n.invalidation_paths.len())
            .unwrap_or(0)
    }

    pub fn parent_count(&self, id: NodeId) -> usize {
        self.inner
            .read()
            .node(id)
            .map(|n| n.parents.len())
            .unwrap_or(0)
    }
}
