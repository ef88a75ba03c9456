//! Step compiler.
//!
//! Translates syntax nodes into ordered step sequences using post-order
//! traversal: operands compile before operators, so an operator's inputs are
//! already on the evaluation stack when its step executes. Sequences are
//! deterministic per node, compiled once, and cached for the arena's
//! lifetime (function bodies are fetched from the cache when a call step
//! executes).
//!
//! Name validation happens here: a reference to a name that is not
//! statically in scope, a duplicate binding, or a malformed map literal
//! compiles to a step that pushes the corresponding exception value - the
//! pass halts when it executes, and no host-level error is ever raised.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::rc::Rc;
use std::sync::Arc;

use rill_ir::{ExprKind, Name, NodeId, SharedArena};
use rill_value::exception::{duplicate_name, malformed_container, unbound_name, Exception};
use rill_value::{NumberValue, Value};

use crate::builtins::{binary_native, unary_native};
use crate::step::{Step, StepOp};

/// Static compile context: declared names per scope, plus the enclosing
/// reaction stack (for resolving `Previous`).
struct Ctx {
    scopes: Vec<FxHashSet<Name>>,
    reactions: Vec<NodeId>,
}

impl Ctx {
    fn new() -> Self {
        Ctx {
            scopes: vec![FxHashSet::default()],
            reactions: Vec::new(),
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(FxHashSet::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declare a name in the current scope; `false` on a duplicate.
    fn declare(&mut self, name: Name) -> bool {
        self.scopes
            .last_mut()
            .map_or(false, |scope| scope.insert(name))
    }

    /// Whether a name is visible from the current scope (declared before
    /// this point in read order).
    fn in_scope(&self, name: Name) -> bool {
        self.scopes.iter().rev().any(|scope| scope.contains(&name))
    }
}

/// Compiles nodes to step sequences, owning the per-node cache.
pub struct StepCompiler {
    arena: SharedArena,
    cache: FxHashMap<NodeId, Rc<[Step]>>,
}

impl StepCompiler {
    pub fn new(arena: SharedArena) -> Self {
        StepCompiler {
            arena,
            cache: FxHashMap::default(),
        }
    }

    /// Compile a whole program. Function bodies reached from the root are
    /// compiled and cached along the way; repeated calls return the cache.
    pub fn compile_program(&mut self, root: NodeId) -> Rc<[Step]> {
        if let Some(steps) = self.cache.get(&root) {
            return steps.clone();
        }
        let mut ctx = Ctx::new();
        let steps: Rc<[Step]> = self.compile_node(root, &mut ctx).into();
        self.cache.insert(root, steps.clone());
        steps
    }

    /// Cached steps for a node (function bodies, the program root).
    pub fn cached(&self, node: NodeId) -> Option<Rc<[Step]>> {
        self.cache.get(&node).cloned()
    }

    fn exception_step(node: NodeId, exception: Exception) -> Vec<Step> {
        vec![Step::new(
            node,
            StepOp::PushValue(Value::exception(exception.at(node))),
        )]
    }

    fn compile_node(&mut self, node: NodeId, ctx: &mut Ctx) -> Vec<Step> {
        let arena = Arc::clone(&self.arena);
        let kind = arena.kind(node);
        let mut seq = Vec::new();
        match kind {
            ExprKind::Number { bits, unit } => {
                let value = Value::Number(NumberValue::with_unit(
                    f64::from_bits(bits),
                    arena.resolve(unit),
                ));
                seq.push(Step::new(node, StepOp::PushValue(value)));
            }
            ExprKind::Text(text) => {
                let value = Value::text(arena.resolve(text));
                seq.push(Step::new(node, StepOp::PushValue(value)));
            }
            ExprKind::Bool(b) => {
                seq.push(Step::new(node, StepOp::PushValue(Value::bool(b))));
            }
            ExprKind::NoneLiteral => {
                seq.push(Step::new(node, StepOp::PushValue(Value::none())));
            }
            ExprKind::ListLiteral(items) => {
                let count = self.compile_children(items, ctx, &mut seq);
                seq.push(Step::new(node, StepOp::MakeList(count)));
            }
            ExprKind::SetLiteral(items) => {
                let count = self.compile_children(items, ctx, &mut seq);
                seq.push(Step::new(node, StepOp::MakeSet(count)));
            }
            ExprKind::MapLiteral(entries) => {
                if entries.len() % 2 != 0 {
                    return Self::exception_step(
                        node,
                        malformed_container("map entry is missing its value"),
                    );
                }
                let count = self.compile_children(entries, ctx, &mut seq);
                seq.push(Step::new(node, StepOp::MakeMap(count / 2)));
            }
            ExprKind::Ref(name) => {
                if ctx.in_scope(name) {
                    seq.push(Step::new(node, StepOp::Resolve(name)));
                } else {
                    return Self::exception_step(node, unbound_name(arena.resolve(name)));
                }
            }
            ExprKind::Bind { name, value } => {
                // The bound value cannot see the name; compile it first,
                // then declare.
                let value_seq = self.compile_node(value, ctx);
                if !ctx.declare(name) {
                    return Self::exception_step(node, duplicate_name(arena.resolve(name)));
                }
                seq.extend(value_seq);
                seq.push(Step::new(node, StepOp::BindName(name)));
            }
            ExprKind::Block { body } => {
                seq.push(Step::new(node, StepOp::EnterScope));
                ctx.push_scope();
                let children: SmallVec<[NodeId; 8]> =
                    arena.nodes(body).iter().copied().collect();
                if children.is_empty() {
                    seq.push(Step::new(node, StepOp::PushValue(Value::none())));
                } else {
                    let last = children.len() - 1;
                    for (i, child) in children.iter().enumerate() {
                        seq.extend(self.compile_node(*child, ctx));
                        if i != last {
                            seq.push(Step::new(*child, StepOp::Discard));
                        }
                    }
                }
                ctx.pop_scope();
                seq.push(Step::new(node, StepOp::ExitScope));
            }
            ExprKind::Conditional { condition, yes, no } => {
                let cond_seq = self.compile_node(condition, ctx);
                let yes_seq = self.compile_node(yes, ctx);
                let no_seq = self.compile_node(no, ctx);
                seq.extend(cond_seq);
                seq.push(Step::new(node, StepOp::JumpIfFalse(offset(yes_seq.len() + 1))));
                seq.extend(yes_seq);
                seq.push(Step::new(node, StepOp::Jump(offset(no_seq.len()))));
                seq.extend(no_seq);
            }
            ExprKind::Binary { op, left, right } => {
                seq.push(Step::new(node, StepOp::PushValue(binary_native(op))));
                seq.extend(self.compile_node(left, ctx));
                seq.extend(self.compile_node(right, ctx));
                seq.push(Step::new(node, StepOp::Apply { args: 2 }));
            }
            ExprKind::Unary { op, operand } => {
                seq.push(Step::new(node, StepOp::PushValue(unary_native(op))));
                seq.extend(self.compile_node(operand, ctx));
                seq.push(Step::new(node, StepOp::Apply { args: 1 }));
            }
            ExprKind::Evaluate { callee, args } => {
                seq.extend(self.compile_node(callee, ctx));
                let count = self.compile_children(args, ctx, &mut seq);
                seq.push(Step::new(
                    node,
                    StepOp::Apply {
                        args: u8::try_from(count).unwrap_or(u8::MAX),
                    },
                ));
            }
            ExprKind::FunctionDef { name, params, body } => {
                if !name.is_empty() && !ctx.declare(name) {
                    return Self::exception_step(node, duplicate_name(arena.resolve(name)));
                }
                self.compile_function_body(params_of(&arena, params), body, ctx);
                seq.push(Step::new(node, StepOp::MakeFunction(node)));
            }
            ExprKind::StructureDef {
                name,
                fields,
                members,
            } => {
                if !ctx.declare(name) {
                    return Self::exception_step(node, duplicate_name(arena.resolve(name)));
                }
                let mut seen = FxHashSet::default();
                for spec in arena.fields(fields) {
                    if !seen.insert(spec.name) {
                        return Self::exception_step(
                            node,
                            duplicate_name(arena.resolve(spec.name)),
                        );
                    }
                }
                let member_nodes: SmallVec<[NodeId; 4]> =
                    arena.nodes(members).iter().copied().collect();
                for member in member_nodes {
                    match arena.kind(member) {
                        ExprKind::FunctionDef { params, body, .. } => {
                            self.compile_function_body(params_of(&arena, params), body, ctx);
                        }
                        _ => {
                            return Self::exception_step(
                                node,
                                malformed_container("structure members must be functions"),
                            );
                        }
                    }
                }
                seq.push(Step::new(node, StepOp::MakeStructureDef(node)));
            }
            ExprKind::PropertyRead { subject, field } => {
                seq.extend(self.compile_node(subject, ctx));
                seq.push(Step::new(node, StepOp::GetProperty(field)));
            }
            ExprKind::PropertyBind {
                subject,
                path,
                value,
            } => {
                seq.extend(self.compile_node(subject, ctx));
                seq.extend(self.compile_node(value, ctx));
                seq.push(Step::new(node, StepOp::EvolveProperty(path)));
            }
            ExprKind::Reaction {
                initial,
                condition,
                next,
            } => {
                // Initial values exist before the stream does, so they
                // cannot see `Previous`.
                let initial_seq = self.compile_node(initial, ctx);
                ctx.reactions.push(node);
                let condition_seq = self.compile_node(condition, ctx);
                let next_seq = self.compile_node(next, ctx);
                ctx.reactions.pop();
                seq.extend(compile_reaction(
                    node,
                    initial_seq,
                    condition_seq,
                    next_seq,
                ));
            }
            ExprKind::Previous => match ctx.reactions.last() {
                Some(reaction) => {
                    seq.push(Step::new(node, StepOp::PushPrevious(*reaction)));
                }
                None => {
                    return Self::exception_step(node, unbound_name("previous"));
                }
            },
            ExprKind::StreamInput { source, config } => {
                let count = self.compile_children(config, ctx, &mut seq);
                seq.push(Step::new(
                    node,
                    StepOp::InitStream {
                        source,
                        args: u8::try_from(count).unwrap_or(u8::MAX),
                    },
                ));
            }
            ExprKind::Changed { subject } => {
                seq.extend(self.compile_node(subject, ctx));
                seq.push(Step::new(node, StepOp::StreamChanged));
            }
            ExprKind::Convert { subject, target } => {
                seq.extend(self.compile_node(subject, ctx));
                seq.push(Step::new(node, StepOp::Convert(target)));
            }
        }
        seq
    }

    /// Compile a child list in order; returns the child count.
    fn compile_children(
        &mut self,
        range: rill_ir::NodeRange,
        ctx: &mut Ctx,
        seq: &mut Vec<Step>,
    ) -> u16 {
        let arena = Arc::clone(&self.arena);
        let children: SmallVec<[NodeId; 8]> = arena.nodes(range).iter().copied().collect();
        for child in &children {
            seq.extend(self.compile_node(*child, ctx));
        }
        u16::try_from(children.len()).unwrap_or(u16::MAX)
    }

    /// Compile a function body in its own scope (parameters declared) and
    /// cache it under the body node for call steps to fetch.
    fn compile_function_body(&mut self, params: Vec<Name>, body: NodeId, ctx: &mut Ctx) {
        if self.cache.contains_key(&body) {
            return;
        }
        ctx.push_scope();
        for param in params {
            ctx.declare(param);
        }
        let steps: Rc<[Step]> = self.compile_node(body, ctx).into();
        ctx.pop_scope();
        self.cache.insert(body, steps);
    }
}

fn params_of(arena: &SharedArena, params: rill_ir::NameRange) -> Vec<Name> {
    arena.names(params).to_vec()
}

fn offset(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Lay out a reaction's step sequence.
///
/// ```text
/// 0                  jump-if-stream-exists  → C
/// 1..=i              initial
/// i+1                create stream          (seeds and registers)
/// i+2                jump                   → end
/// C   = i+3..=i+c+2  condition
/// i+c+3              jump-if-false          → R
/// i+c+4..=i+c+n+3    next                   (previous value threaded)
/// i+c+n+4            update stream
/// i+c+n+5            jump                   → end
/// R   = i+c+n+6      read stream            (condition did not fire)
/// end
/// ```
fn compile_reaction(
    node: NodeId,
    initial: Vec<Step>,
    condition: Vec<Step>,
    next: Vec<Step>,
) -> Vec<Step> {
    let (i, c, n) = (initial.len(), condition.len(), next.len());
    let mut seq = Vec::with_capacity(i + c + n + 7);
    seq.push(Step::new(node, StepOp::JumpIfStreamExists(offset(i + 2))));
    seq.extend(initial);
    seq.push(Step::new(node, StepOp::CreateStream));
    seq.push(Step::new(node, StepOp::Jump(offset(c + n + 4))));
    seq.extend(condition);
    seq.push(Step::new(node, StepOp::JumpIfFalse(offset(n + 2))));
    seq.extend(next);
    seq.push(Step::new(node, StepOp::UpdateStream));
    seq.push(Step::new(node, StepOp::Jump(offset(1))));
    seq.push(Step::new(node, StepOp::ReadStream));
    seq
}
