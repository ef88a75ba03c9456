//! Rill IR - syntax tree types shared by the parser and the engine.
//!
//! The parser produces a flat [`NodeArena`] of expression nodes; the engine
//! compiles and evaluates them. Node kinds form a closed variant set
//! ([`ExprKind`]) so the step compiler can match exhaustively - new kinds are
//! added by extending the variant and the match, not by subclassing.
//!
//! # Design
//!
//! - No `Box<Expr>`; children are [`NodeId`] (u32) indices into the arena
//! - Child lists are [`NodeRange`] (start + len) into side arrays
//! - Identifiers are interned [`Name`]s for O(1) comparison

mod arena;
mod interner;
mod name;
mod node;
mod node_id;
mod span;

pub use arena::{NodeArena, SharedArena};
pub use interner::{SharedInterner, StringInterner};
pub use name::Name;
pub use node::{BinaryOp, Expr, ExprKind, FieldSpec, StreamSource, TypeTag, UnaryOp};
pub use node_id::{FieldRange, NameRange, NodeId, NodeRange};
pub use span::Span;
