//! Atomic execution steps.
//!
//! A step is tied to exactly one syntax node and is stateless: it reads
//! values already on the evaluation stack, optionally consults evaluator
//! state (scopes, the reaction cache), and either pushes a value, requests a
//! jump, or halts the pass with an exception value. All mutable state lives
//! in the evaluator and the stream subsystem.

use std::fmt;

use rill_ir::{Name, NameRange, NodeId, StreamSource, TypeTag};
use rill_value::Value;

/// One compiled instruction.
#[derive(Clone, Debug)]
pub struct Step {
    /// Syntax node this step computes (part of).
    pub node: NodeId,
    pub op: StepOp,
}

impl Step {
    pub fn new(node: NodeId, op: StepOp) -> Self {
        Step { node, op }
    }
}

/// Step operations.
///
/// Jump offsets are relative and forward-only: after a taken jump with
/// offset `k`, execution resumes `k` steps past the instruction that would
/// otherwise run next.
#[derive(Clone, Debug)]
pub enum StepOp {
    /// Push a precomputed value (literals, operator functions, and
    /// compile-time exceptions).
    PushValue(Value),
    /// Push the value bound to a name.
    Resolve(Name),
    /// Pop a value and bind it, then push it back (a binding evaluates to
    /// its value).
    BindName(Name),
    /// Pop and record a block statement's unused result.
    Discard,
    EnterScope,
    ExitScope,
    /// Pop `n` values into an ordered list.
    MakeList(u16),
    /// Pop `n` values into a unique-member set.
    MakeSet(u16),
    /// Pop `2n` values into unique-key entries.
    MakeMap(u16),
    /// Build a closure over the current environment from a function
    /// definition node.
    MakeFunction(NodeId),
    /// Build a structure definition value (evaluating function members).
    MakeStructureDef(NodeId),
    /// Pop `args` inputs and a callee; evaluate the callee on them.
    Apply { args: u8 },
    /// Pop a subject and push one of its fields.
    GetProperty(Name),
    /// Pop a new value and a subject; push the evolved instance.
    EvolveProperty(NameRange),
    /// Pop a subject and push its conversion to the target kind.
    Convert(TypeTag),
    Jump(u32),
    /// Pop a boolean; jump when false.
    JumpIfFalse(u32),
    /// Jump when the reaction cache already holds a stream for this step's
    /// node (skipping initial-value creation).
    JumpIfStreamExists(u32),
    /// Pop the initial value; create and register this node's reaction
    /// stream; push its current value.
    CreateStream,
    /// Push this node's stream's current value.
    ReadStream,
    /// Pop the next value; replace this node's stream's current value; push
    /// it.
    UpdateStream,
    /// Push the named reaction's value from before the current update
    /// (threaded explicitly, not an ambient binding).
    PushPrevious(NodeId),
    /// Pop a stream handle; push whether its change triggered this pass.
    StreamChanged,
    /// Pop `args` configuration values; reuse or create this node's input
    /// stream and push its handle.
    InitStream { source: StreamSource, args: u8 },
}

impl fmt::Display for StepOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOp::PushValue(v) => write!(f, "push {v}"),
            StepOp::Resolve(_) => write!(f, "resolve"),
            StepOp::BindName(_) => write!(f, "bind"),
            StepOp::Discard => write!(f, "discard"),
            StepOp::EnterScope => write!(f, "enter scope"),
            StepOp::ExitScope => write!(f, "exit scope"),
            StepOp::MakeList(n) => write!(f, "list({n})"),
            StepOp::MakeSet(n) => write!(f, "set({n})"),
            StepOp::MakeMap(n) => write!(f, "map({n})"),
            StepOp::MakeFunction(_) => write!(f, "function"),
            StepOp::MakeStructureDef(_) => write!(f, "structure"),
            StepOp::Apply { args } => write!(f, "apply({args})"),
            StepOp::GetProperty(_) => write!(f, "get property"),
            StepOp::EvolveProperty(_) => write!(f, "evolve property"),
            StepOp::Convert(tag) => write!(f, "convert to {}", tag.label()),
            StepOp::Jump(n) => write!(f, "jump +{n}"),
            StepOp::JumpIfFalse(n) => write!(f, "jump +{n} unless"),
            StepOp::JumpIfStreamExists(n) => write!(f, "jump +{n} if stream exists"),
            StepOp::CreateStream => write!(f, "create stream"),
            StepOp::ReadStream => write!(f, "read stream"),
            StepOp::UpdateStream => write!(f, "update stream"),
            StepOp::PushPrevious(_) => write!(f, "previous"),
            StepOp::StreamChanged => write!(f, "changed?"),
            StepOp::InitStream { source, .. } => write!(f, "input {}", source.label()),
        }
    }
}
