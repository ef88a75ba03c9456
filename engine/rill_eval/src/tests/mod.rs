//! Engine-level tests: streams, reactions, and history navigation driven
//! through the host surface.

mod reaction_tests;
mod stream_tests;

use std::sync::Arc;

use rill_ir::{NodeArena, NodeId};

use crate::engine::EngineHandle;

/// Build a tree and an engine over it.
pub(crate) fn engine(build: impl FnOnce(&mut NodeArena) -> NodeId) -> EngineHandle {
    let mut arena = NodeArena::new();
    let root = build(&mut arena);
    EngineHandle::new(Arc::new(arena), root)
}

/// Build a tree, keeping a node of interest alongside the root.
pub(crate) fn engine_with_node(
    build: impl FnOnce(&mut NodeArena) -> (NodeId, NodeId),
) -> (EngineHandle, NodeId) {
    let mut arena = NodeArena::new();
    let (root, node) = build(&mut arena);
    (EngineHandle::new(Arc::new(arena), root), node)
}
