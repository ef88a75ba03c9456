//! Rill Eval - the execution engine for the Rill language.
//!
//! # Architecture
//!
//! - [`StepCompiler`]: post-order tree-to-step translation with a per-node
//!   cache
//! - [`Evaluator`]: a resumable stack machine that executes steps, records
//!   every one in [`History`], and navigates that record forward and
//!   backward without re-execution
//! - [`StreamRegistry`] / [`ReactionCache`]: typed external inputs and the
//!   identity-scoped state that makes reactions reuse their streams across
//!   passes
//! - [`EngineHandle`]: the host surface; one handle owns one program run
//!
//! # Re-exports
//!
//! Value types are re-exported from `rill_value` for convenience:
//! `Value`, `NumberValue`, `StructValue`, `Exception`, `StreamId`.

mod builtins;
mod compiler;
mod engine;
mod environment;
pub mod evaluator;
mod history;
mod observer;
mod reaction;
mod step;
mod stream;

pub use compiler::StepCompiler;
pub use engine::EngineHandle;
pub use environment::{Environment, LocalScope, Scope};
pub use evaluator::{Evaluator, RunState, StreamChange};
pub use history::{History, HistoryEntry, PassRecord, PassTrigger};
pub use observer::{Notice, ObserverHandle, ObserverRegistry};
pub use reaction::ReactionCache;
pub use step::{Step, StepOp};
pub use stream::{Edge, Stream, StreamConfig, StreamOrigin, StreamRegistry};

pub use builtins::{binary_native, unary_native};

// Re-export value types from rill_value
pub use rill_value::{Exception, ExceptionKind, NumberValue, StreamId, StructValue, Value};

#[cfg(test)]
mod tests;
