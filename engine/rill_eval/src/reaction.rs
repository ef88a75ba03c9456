//! Reaction cache.
//!
//! Gives reactive expressions persistent identity-scoped state across
//! evaluation passes: a reaction node (or stream input node) creates its
//! underlying stream once per program run, and every later pass finds and
//! reuses it. The cache is an index from node identity into the stream
//! registry arena - never a direct back-pointer.

use rustc_hash::FxHashMap;

use rill_ir::NodeId;
use rill_value::StreamId;

/// Node identity → stream slot.
#[derive(Default)]
pub struct ReactionCache {
    slots: FxHashMap<NodeId, StreamId>,
}

impl ReactionCache {
    pub fn new() -> Self {
        ReactionCache::default()
    }

    /// The stream a node already produced this run, if any.
    pub fn get(&self, node: NodeId) -> Option<StreamId> {
        self.slots.get(&node).copied()
    }

    /// Whether a node already has a stream (the jump-if-stream-exists
    /// check).
    pub fn contains(&self, node: NodeId) -> bool {
        self.slots.contains_key(&node)
    }

    /// Associate a node with its stream. A node never produces a second
    /// stream while a run is alive; the first association wins.
    pub fn insert(&mut self, node: NodeId, stream: StreamId) {
        self.slots.entry(node).or_insert(stream);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
