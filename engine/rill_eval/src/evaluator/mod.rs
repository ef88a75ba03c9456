//! The evaluator: a resumable stack machine over compiled steps.
//!
//! # Architecture
//!
//! One evaluator owns everything for one program run: the value stack, the
//! call stack of activation frames, the environment, the stream registry,
//! the reaction cache, the history, and the observer list. Nothing is
//! process-global; hosts hold an `EngineHandle` and tear it down explicitly.
//!
//! Execution is single-threaded and cooperative. External sources push
//! values at any time, but pushes are queued and drained strictly in
//! observed order between passes - a push never interrupts a pass in
//! progress. A pass runs to completion or to its first exception value;
//! a halt stops the remainder of that pass only, and everything already
//! recorded stays inspectable.
//!
//! # Time travel
//!
//! Every executed step is recorded in [`History`] with the value it
//! produced. Navigation moves a cursor over the record and replays stored
//! values; rewinding never re-executes a step. Advancing past the end of
//! the record executes new steps only while a pass is live.

use smallvec::SmallVec;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use rill_ir::{ExprKind, NodeId, SharedArena};
use rill_value::exception::{
    custom, duplicate_name, malformed_container, missing_input, not_invocable, type_mismatch,
    unbound_name, Exception,
};
use rill_value::{FunctionValue, LayoutField, StreamId, StructDefValue, Value};
use rustc_hash::FxHashMap;

use crate::compiler::StepCompiler;
use crate::environment::{CallToken, Environment};
use crate::history::{History, HistoryEntry, PassTrigger};
use crate::observer::{Notice, ObserverHandle, ObserverRegistry};
use crate::reaction::ReactionCache;
use crate::step::{Step, StepOp};
use crate::stream::{StreamConfig, StreamRegistry};

/// Run state of one evaluator.
///
/// `Paused` is not a state: it is an orthogonal flag that suppresses
/// automatic passes on stream changes until `play()` or a manual step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Created, no pass yet.
    Idle,
    /// A pass is live; new steps can execute.
    Running,
    /// The latest pass ran to its end.
    Completed,
    /// The latest pass stopped on an exception value.
    Halted,
    /// Torn down; streams stopped, no further passes.
    Stopped,
}

/// One observed stream change: which stream, what it pushed, which pass it
/// triggered.
#[derive(Clone, Debug)]
pub struct StreamChange {
    pub stream: StreamId,
    pub value: Value,
    pub pass: u32,
}

/// An activation frame: a step sequence with a program counter, plus the
/// caller's scopes to restore on return.
struct Frame {
    steps: Rc<[Step]>,
    pc: usize,
    token: Option<CallToken>,
}

enum Outcome {
    /// The step produced a value.
    Pushed(Value),
    /// The step popped a block statement's unused result.
    Ignored(Value),
    /// Bookkeeping only (scopes, jumps, calls).
    Quiet,
}

/// A resumable, reversible stack machine for one program run.
pub struct Evaluator {
    arena: SharedArena,
    compiler: StepCompiler,
    root: NodeId,

    // The live machine (reset at every pass start).
    values: Vec<Value>,
    frames: Vec<Frame>,
    env: Environment,
    state: RunState,
    paused: bool,
    /// Stream whose change triggered the live pass.
    trigger: Option<StreamId>,

    history: History,
    /// Navigation cursor: an index into `0..=history.len()`.
    cursor: usize,

    streams: StreamRegistry,
    reactions: ReactionCache,
    pending: VecDeque<(StreamId, Value)>,
    changed: Vec<StreamChange>,
    observers: ObserverRegistry,

    executed_steps: u64,
}

impl Evaluator {
    /// Compile a program and prepare an idle evaluator for it.
    pub fn new(arena: SharedArena, root: NodeId) -> Self {
        let mut compiler = StepCompiler::new(Arc::clone(&arena));
        compiler.compile_program(root);
        Evaluator {
            arena,
            compiler,
            root,
            values: Vec::new(),
            frames: Vec::new(),
            env: Environment::new(),
            state: RunState::Idle,
            paused: false,
            trigger: None,
            history: History::new(),
            cursor: 0,
            streams: StreamRegistry::new(),
            reactions: ReactionCache::new(),
            pending: VecDeque::new(),
            changed: Vec::new(),
            observers: ObserverRegistry::new(),
            executed_steps: 0,
        }
    }

    // Host surface

    /// Run to completion (or first halt) and return the program's value.
    ///
    /// Starts the first pass if none has run; then drains any queued stream
    /// changes (unless paused).
    pub fn evaluate(&mut self) -> Value {
        if self.state == RunState::Idle {
            self.start_pass(PassTrigger::Start);
        }
        if self.state == RunState::Running {
            self.run_to_completion();
        }
        self.drain_pending();
        self.latest_value()
    }

    /// The latest closed pass's value.
    pub fn latest_value(&self) -> Value {
        self.history.latest_value().cloned().unwrap_or(Value::None)
    }

    /// Push a raw value into a stream.
    ///
    /// Reactive streams queue an evaluation pass; the queue drains between
    /// passes, in observed order, unless paused. Pushes to stopped streams
    /// are dropped.
    pub fn push(&mut self, id: StreamId, value: Value) {
        if self.state == RunState::Stopped {
            return;
        }
        let Some(stream) = self.streams.get(id) else {
            return;
        };
        if !stream.is_active() {
            tracing::trace!(stream = id.raw(), "push to stopped stream dropped");
            return;
        }
        if stream.is_reactive() {
            self.pending.push_back((id, value));
        } else if let Some(stream) = self.streams.get_mut(id) {
            stream.emit(value);
        }
        self.observers.notify(Notice::StreamChanged(id));
        self.drain_pending();
    }

    /// Resume automatic passes and drain the queue.
    pub fn play(&mut self) {
        self.paused = false;
        self.observers.notify(Notice::PlayChanged(true));
        self.drain_pending();
    }

    /// Suppress automatic passes; queued changes wait for `play()` or
    /// manual pass steps.
    pub fn pause(&mut self) {
        self.paused = true;
        self.observers.notify(Notice::PlayChanged(false));
    }

    pub fn is_playing(&self) -> bool {
        !self.paused && self.state != RunState::Stopped
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Tear down: stop every stream and refuse further passes. Idempotent.
    pub fn stop(&mut self) {
        if self.state == RunState::Stopped {
            return;
        }
        tracing::debug!("engine stopped");
        self.streams.stop_all();
        self.pending.clear();
        self.frames.clear();
        self.values.clear();
        self.state = RunState::Stopped;
        self.observers.notify(Notice::Stopped);
    }

    // Navigation

    /// Advance one step: replay a recorded step, or execute a new one at
    /// the frontier of a live pass. Returns whether anything moved.
    pub fn step_forward(&mut self) -> bool {
        if self.cursor < self.history.len() {
            self.cursor += 1;
            self.observers.notify(Notice::Stepped);
            return true;
        }
        if self.state == RunState::Running {
            self.execute_step();
            self.cursor = self.history.len();
            self.observers.notify(Notice::Stepped);
            return true;
        }
        false
    }

    /// Rewind one step, replaying the recorded value. Never re-executes.
    pub fn step_backward(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.observers.notify(Notice::Stepped);
        true
    }

    /// Scrub to an arbitrary step index.
    pub fn jump_to_step(&mut self, index: usize) {
        self.cursor = index.min(self.history.len());
        self.observers.notify(Notice::Stepped);
    }

    pub fn step_to_start(&mut self) {
        self.jump_to_step(0);
    }

    pub fn step_to_end(&mut self) {
        self.jump_to_step(self.history.len());
    }

    /// Step at pass granularity: jump to the next pass boundary, or - when
    /// already at the frontier - begin the next queued pass (running it to
    /// completion only when playing, so a paused host can fine-step it).
    pub fn next_pass(&mut self) -> bool {
        if let Some(pass) = self.history.pass_of_step(self.cursor) {
            if let Some(record) = self.history.pass(pass) {
                if let Some(end) = record.end {
                    if self.cursor < end {
                        self.jump_to_step(end);
                        return true;
                    }
                }
            }
        }
        if self.cursor < self.history.len() {
            self.jump_to_step(self.history.len());
            return true;
        }
        // At the frontier: a queued change can begin a new pass manually.
        if self.state != RunState::Running {
            if let Some((id, value)) = self.pending.pop_front() {
                self.begin_stream_pass(id, value);
                if self.is_playing() {
                    self.run_to_completion();
                }
                return true;
            }
        }
        false
    }

    /// Jump to the start of the current pass (or the previous pass when
    /// already at a boundary).
    pub fn previous_pass(&mut self) -> bool {
        let Some(pass) = self.history.pass_of_step(self.cursor.saturating_sub(1)) else {
            return false;
        };
        let Some(record) = self.history.pass(pass) else {
            return false;
        };
        if self.cursor > record.start {
            self.jump_to_step(record.start);
        } else if pass > 0 {
            if let Some(previous) = self.history.pass(pass - 1) {
                self.jump_to_step(previous.start);
            }
        } else {
            return false;
        }
        true
    }

    /// The most recently passed step at the cursor, if any.
    pub fn current_step(&self) -> Option<&HistoryEntry> {
        self.cursor.checked_sub(1).and_then(|i| self.history.entry(i))
    }

    /// The recorded value at the cursor.
    pub fn value_at_cursor(&self) -> Option<&Value> {
        self.current_step().and_then(|entry| entry.value.as_ref())
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    // Read accessors

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Ordered stream changes and the passes they triggered.
    pub fn changed_streams(&self) -> &[StreamChange] {
        &self.changed
    }

    /// The stream a reaction or input node produced this run.
    pub fn stream_for_node(&self, node: NodeId) -> Option<StreamId> {
        self.reactions.get(node)
    }

    pub fn streams(&self) -> &StreamRegistry {
        &self.streams
    }

    /// Steps actually executed (navigation does not count).
    pub fn executed_steps(&self) -> u64 {
        self.executed_steps
    }

    /// Streams created over the run's lifetime.
    pub fn streams_created(&self) -> u64 {
        self.streams.created()
    }

    pub fn observe(&mut self, callback: Box<dyn FnMut(&Notice)>) -> ObserverHandle {
        self.observers.observe(callback)
    }

    pub fn ignore(&mut self, handle: ObserverHandle) -> bool {
        self.observers.ignore(handle)
    }

    // Pass machinery

    fn begin_stream_pass(&mut self, id: StreamId, value: Value) {
        if let Some(stream) = self.streams.get_mut(id) {
            stream.emit(value.clone());
        }
        self.start_pass(PassTrigger::StreamChange { stream: id, value });
    }

    fn start_pass(&mut self, trigger: PassTrigger) {
        self.trigger = match &trigger {
            PassTrigger::StreamChange { stream, .. } => Some(*stream),
            PassTrigger::Start => None,
        };
        let pass = self.history.begin_pass(trigger.clone());
        if let PassTrigger::StreamChange { stream, value } = trigger {
            self.changed.push(StreamChange {
                stream,
                value,
                pass,
            });
        }
        tracing::debug!(pass, "pass started");
        self.values.clear();
        self.env = Environment::new();
        let steps = self
            .compiler
            .cached(self.root)
            .unwrap_or_else(|| self.compiler.compile_program(self.root));
        self.frames = vec![Frame {
            steps,
            pc: 0,
            token: None,
        }];
        self.state = RunState::Running;
        self.cursor = self.history.len();
        self.observers.notify(Notice::PassStarted(pass));
    }

    fn run_to_completion(&mut self) {
        while self.state == RunState::Running {
            self.execute_step();
        }
        self.cursor = self.history.len();
    }

    /// Drain queued stream changes, one pass each, in observed order.
    fn drain_pending(&mut self) {
        while self.is_playing() && self.state != RunState::Running {
            let Some((id, value)) = self.pending.pop_front() else {
                return;
            };
            self.begin_stream_pass(id, value);
            self.run_to_completion();
        }
    }

    /// Execute exactly one step at the frontier.
    fn execute_step(&mut self) {
        let Some(frame) = self.frames.last_mut() else {
            self.finish_pass();
            return;
        };
        if frame.pc >= frame.steps.len() {
            self.return_from_frame();
            return;
        }
        let step = frame.steps[frame.pc].clone();
        frame.pc += 1;
        self.executed_steps += 1;

        let pass = self.history.pass_count().saturating_sub(1) as u32;
        match self.exec_op(&step) {
            Ok(Outcome::Pushed(value)) => {
                let halts = value.is_exception();
                self.history.record(HistoryEntry {
                    pass,
                    node: step.node,
                    op: step.op.clone(),
                    value: Some(value.clone()),
                    ignored: false,
                });
                if halts {
                    self.halt(value, pass);
                } else {
                    self.values.push(value);
                }
            }
            Ok(Outcome::Ignored(value)) => {
                self.history.record(HistoryEntry {
                    pass,
                    node: step.node,
                    op: step.op.clone(),
                    value: Some(value),
                    ignored: true,
                });
            }
            Ok(Outcome::Quiet) => {
                self.history.record(HistoryEntry {
                    pass,
                    node: step.node,
                    op: step.op.clone(),
                    value: None,
                    ignored: false,
                });
            }
            Err(exception) => {
                let value = Value::exception(exception.at(step.node));
                self.history.record(HistoryEntry {
                    pass,
                    node: step.node,
                    op: step.op.clone(),
                    value: Some(value.clone()),
                    ignored: false,
                });
                self.halt(value, pass);
            }
        }
    }

    fn return_from_frame(&mut self) {
        if let Some(frame) = self.frames.pop() {
            if let Some(token) = frame.token {
                self.env.exit_call(token);
            }
        }
        if self.frames.is_empty() {
            self.finish_pass();
        }
    }

    fn finish_pass(&mut self) {
        let value = match self.values.pop() {
            Some(v) => self.unwrap_stream(v),
            None => Value::None,
        };
        let pass = self.history.pass_count().saturating_sub(1) as u32;
        tracing::debug!(pass, value = %value, "pass completed");
        self.history.finish_pass(Some(value), false);
        self.state = RunState::Completed;
        self.cursor = self.history.len();
        self.observers.notify(Notice::PassEnded(pass));
    }

    /// Stop the pass on an exception value. Earlier steps of this pass and
    /// all prior passes stay recorded and inspectable.
    fn halt(&mut self, value: Value, pass: u32) {
        tracing::debug!(pass, value = %value, "pass halted");
        self.frames.clear();
        self.values.clear();
        self.history.finish_pass(Some(value), true);
        self.state = RunState::Halted;
        self.cursor = self.history.len();
        self.observers.notify(Notice::Halted(pass));
    }

    // Step execution

    fn pop(&mut self) -> Result<Value, Exception> {
        self.values
            .pop()
            .ok_or_else(|| custom("evaluation stack underflow"))
    }

    /// Read a stream handle's current value; any other value passes
    /// through. Consumers of values call this; `Changed` and bindings keep
    /// the handle.
    fn unwrap_stream(&mut self, value: Value) -> Value {
        match value {
            Value::Stream(id) => self.streams.read_current(id),
            other => other,
        }
    }

    fn pop_args(&mut self, count: usize) -> Result<SmallVec<[Value; 4]>, Exception> {
        let mut args: SmallVec<[Value; 4]> = SmallVec::with_capacity(count);
        for _ in 0..count {
            let value = self.pop()?;
            args.push(self.unwrap_stream(value));
        }
        args.reverse();
        Ok(args)
    }

    fn jump(&mut self, offset: u32) {
        if let Some(frame) = self.frames.last_mut() {
            frame.pc += offset as usize;
        }
    }

    fn resolve_text(&self, name: rill_ir::Name) -> &'static str {
        self.arena.interner().resolve(name)
    }

    fn exec_op(&mut self, step: &Step) -> Result<Outcome, Exception> {
        match &step.op {
            StepOp::PushValue(value) => Ok(Outcome::Pushed(value.clone())),
            StepOp::Resolve(name) => match self.env.lookup(*name) {
                Some(value) => Ok(Outcome::Pushed(value)),
                None => Err(unbound_name(self.resolve_text(*name))),
            },
            StepOp::BindName(name) => {
                let value = self.pop()?;
                if self.env.define(*name, value.clone()) {
                    Ok(Outcome::Pushed(value))
                } else {
                    Err(duplicate_name(self.resolve_text(*name)))
                }
            }
            StepOp::Discard => {
                let value = self.pop()?;
                Ok(Outcome::Ignored(value))
            }
            StepOp::EnterScope => {
                self.env.push_scope();
                Ok(Outcome::Quiet)
            }
            StepOp::ExitScope => {
                self.env.pop_scope();
                Ok(Outcome::Quiet)
            }
            StepOp::MakeList(count) => {
                let items = self.pop_args(*count as usize)?;
                Ok(Outcome::Pushed(Value::list(items.into_vec())))
            }
            StepOp::MakeSet(count) => {
                let items = self.pop_args(*count as usize)?;
                Ok(Outcome::Pushed(Value::set(items.into_vec())))
            }
            StepOp::MakeMap(count) => {
                let flat = self.pop_args(*count as usize * 2)?;
                let mut entries: Vec<(Value, Value)> = Vec::with_capacity(*count as usize);
                let mut flat = flat.into_iter();
                while let (Some(key), Some(value)) = (flat.next(), flat.next()) {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(malformed_container("duplicate map key"));
                    }
                    entries.push((key, value));
                }
                Ok(Outcome::Pushed(Value::map(entries)))
            }
            StepOp::MakeFunction(def) => {
                let value = self.make_function(*def)?;
                Ok(Outcome::Pushed(value))
            }
            StepOp::MakeStructureDef(def) => {
                let value = self.make_structure_def(*def)?;
                Ok(Outcome::Pushed(value))
            }
            StepOp::Apply { args } => self.apply(*args as usize),
            StepOp::GetProperty(field) => {
                let subject = self.pop()?;
                let subject = self.unwrap_stream(subject);
                match subject {
                    Value::Structure(s) => match s.get(*field) {
                        Some(value) => Ok(Outcome::Pushed(value.clone())),
                        None => Err(unbound_name(format!(
                            "{}.{}",
                            s.type_text,
                            self.resolve_text(*field)
                        ))),
                    },
                    other => Err(type_mismatch("structure", other.kind_label())),
                }
            }
            StepOp::EvolveProperty(path) => {
                let value = self.pop()?;
                let value = self.unwrap_stream(value);
                let subject = self.pop()?;
                let subject = self.unwrap_stream(subject);
                match subject {
                    Value::Structure(s) => {
                        let segments: Vec<(rill_ir::Name, &'static str)> = self
                            .arena
                            .names(*path)
                            .iter()
                            .map(|n| (*n, self.resolve_text(*n)))
                            .collect();
                        Ok(Outcome::Pushed(Value::structure(
                            s.evolve(&segments, value)?,
                        )))
                    }
                    other => Err(type_mismatch("structure", other.kind_label())),
                }
            }
            StepOp::Convert(target) => {
                let subject = self.pop()?;
                let subject = self.unwrap_stream(subject);
                Ok(Outcome::Pushed(rill_value::convert(&subject, *target)?))
            }
            StepOp::Jump(offset) => {
                self.jump(*offset);
                Ok(Outcome::Quiet)
            }
            StepOp::JumpIfFalse(offset) => {
                let condition = self.pop()?;
                match self.unwrap_stream(condition) {
                    Value::Bool(true) => Ok(Outcome::Quiet),
                    Value::Bool(false) => {
                        self.jump(*offset);
                        Ok(Outcome::Quiet)
                    }
                    other => Err(type_mismatch("boolean", other.kind_label())),
                }
            }
            StepOp::JumpIfStreamExists(offset) => {
                if self.reactions.contains(step.node) {
                    self.jump(*offset);
                }
                Ok(Outcome::Quiet)
            }
            StepOp::CreateStream => {
                let initial = self.pop()?;
                let initial = self.unwrap_stream(initial);
                let id = self.streams.create_reaction(step.node, initial.clone());
                self.reactions.insert(step.node, id);
                Ok(Outcome::Pushed(initial))
            }
            StepOp::ReadStream => {
                let id = self
                    .reactions
                    .get(step.node)
                    .ok_or_else(|| custom("reaction stream missing"))?;
                Ok(Outcome::Pushed(self.streams.read_current(id)))
            }
            StepOp::UpdateStream => {
                let next = self.pop()?;
                let next = self.unwrap_stream(next);
                let id = self
                    .reactions
                    .get(step.node)
                    .ok_or_else(|| custom("reaction stream missing"))?;
                if let Some(stream) = self.streams.get_mut(id) {
                    stream.emit(next.clone());
                }
                Ok(Outcome::Pushed(next))
            }
            StepOp::PushPrevious(reaction) => {
                let id = self
                    .reactions
                    .get(*reaction)
                    .ok_or_else(|| custom("reaction stream missing"))?;
                Ok(Outcome::Pushed(self.streams.read_current(id)))
            }
            StepOp::StreamChanged => {
                let subject = self.pop()?;
                match subject {
                    Value::Stream(id) => Ok(Outcome::Pushed(Value::bool(
                        self.trigger == Some(id),
                    ))),
                    other => Err(type_mismatch("stream", other.kind_label())),
                }
            }
            StepOp::InitStream { source, args } => {
                let config_args = self.pop_args(*args as usize)?;
                if let Some(id) = self.reactions.get(step.node) {
                    return Ok(Outcome::Pushed(Value::stream(id)));
                }
                match StreamConfig::parse(*source, &config_args) {
                    Ok(config) => {
                        let id = self.streams.create_input(step.node, *source, config);
                        self.reactions.insert(step.node, id);
                        Ok(Outcome::Pushed(Value::stream(id)))
                    }
                    Err(reason) => {
                        // A stream that cannot be created reads as none
                        // rather than halting the program.
                        tracing::debug!(
                            source = source.label(),
                            %reason,
                            "stream creation failed"
                        );
                        Ok(Outcome::Pushed(Value::None))
                    }
                }
            }
        }
    }

    fn make_function(&mut self, def: NodeId) -> Result<Value, Exception> {
        let ExprKind::FunctionDef { name, params, body } = self.arena.kind(def) else {
            return Err(custom("function step on a non-function node"));
        };
        let function = FunctionValue::new(
            def,
            name,
            self.resolve_text(name),
            self.arena.names(params).to_vec(),
            body,
            self.env.capture(),
        );
        let value = Value::function(function);
        if !name.is_empty() && !self.env.define(name, value.clone()) {
            return Err(duplicate_name(self.resolve_text(name)));
        }
        Ok(value)
    }

    fn make_structure_def(&mut self, def: NodeId) -> Result<Value, Exception> {
        let ExprKind::StructureDef {
            name,
            fields,
            members,
        } = self.arena.kind(def)
        else {
            return Err(custom("structure step on a non-structure node"));
        };
        let layout: Vec<LayoutField> = self
            .arena
            .fields(fields)
            .iter()
            .map(|spec| LayoutField::new(spec.name, self.resolve_text(spec.name), spec.ty))
            .collect();
        let member_nodes: SmallVec<[NodeId; 4]> =
            self.arena.nodes(members).iter().copied().collect();
        let mut member_values = Vec::with_capacity(member_nodes.len());
        for member in member_nodes {
            let ExprKind::FunctionDef {
                name: member_name,
                params,
                body,
            } = self.arena.kind(member)
            else {
                return Err(malformed_container("structure members must be functions"));
            };
            let function = FunctionValue::new(
                member,
                member_name,
                self.resolve_text(member_name),
                self.arena.names(params).to_vec(),
                body,
                self.env.capture(),
            );
            member_values.push((member_name, Value::function(function)));
        }
        let value = Value::structure_def(StructDefValue::new(
            def,
            name,
            self.resolve_text(name),
            layout,
            member_values,
        ));
        if !self.env.define(name, value.clone()) {
            return Err(duplicate_name(self.resolve_text(name)));
        }
        Ok(value)
    }

    /// Evaluate a callee on its inputs: the single execution form behind
    /// operator sugar, explicit calls, and named-argument calls.
    fn apply(&mut self, arg_count: usize) -> Result<Outcome, Exception> {
        let args = self.pop_args(arg_count)?;
        let callee = self.pop()?;
        let callee = self.unwrap_stream(callee);
        match callee {
            Value::Native(f, _) => Ok(Outcome::Pushed(f(&args)?)),
            Value::Function(function) => {
                let params = &*function.params;
                if args.len() < params.len() {
                    return Err(missing_input(self.resolve_text(params[args.len()])));
                }
                if args.len() > params.len() {
                    return Err(missing_input(format!(
                        "{} takes {} inputs, got {}",
                        function.name_text,
                        params.len(),
                        args.len()
                    )));
                }
                let steps = self
                    .compiler
                    .cached(function.body)
                    .ok_or_else(|| custom("uncompiled function body"))?;
                let mut bindings: FxHashMap<rill_ir::Name, Value> =
                    function.captures().clone();
                for (param, arg) in params.iter().zip(args) {
                    bindings.insert(*param, arg);
                }
                let token = self.env.enter_call(bindings);
                self.frames.push(Frame {
                    steps,
                    pc: 0,
                    token: Some(token),
                });
                Ok(Outcome::Quiet)
            }
            Value::StructureDef(def) => Ok(Outcome::Pushed(Value::structure(
                def.instantiate(args.into_vec())?,
            ))),
            other => Err(not_invocable(other.kind_label())),
        }
    }
}
