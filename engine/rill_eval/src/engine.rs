//! Host-facing engine handle.
//!
//! An `EngineHandle` owns one evaluator for one program run. There is no
//! process-wide current engine: hosts create handles, pass them to whatever
//! needs them, and tear them down explicitly (dropping a handle tears it
//! down too).

use rill_ir::{NodeId, SharedArena};
use rill_value::{StreamId, Value};

use crate::evaluator::{Evaluator, RunState, StreamChange};
use crate::history::{History, HistoryEntry};
use crate::observer::{Notice, ObserverHandle};

/// Owning handle for one program run.
pub struct EngineHandle {
    evaluator: Evaluator,
}

impl EngineHandle {
    /// Compile `root` and prepare an idle engine.
    pub fn new(arena: SharedArena, root: NodeId) -> Self {
        EngineHandle {
            evaluator: Evaluator::new(arena, root),
        }
    }

    /// Run to completion (or first halt) and return the program's value.
    pub fn evaluate(&mut self) -> Value {
        self.evaluator.evaluate()
    }

    /// The latest pass's resulting value.
    pub fn latest_value(&self) -> Value {
        self.evaluator.latest_value()
    }

    // Stepping controls

    pub fn step_forward(&mut self) -> bool {
        self.evaluator.step_forward()
    }

    pub fn step_backward(&mut self) -> bool {
        self.evaluator.step_backward()
    }

    pub fn step_to_start(&mut self) {
        self.evaluator.step_to_start();
    }

    pub fn step_to_end(&mut self) {
        self.evaluator.step_to_end();
    }

    pub fn jump_to_step(&mut self, index: usize) {
        self.evaluator.jump_to_step(index);
    }

    /// Coarse stepping: move to the next pass boundary (beginning a queued
    /// pass when already at the frontier).
    pub fn next_pass(&mut self) -> bool {
        self.evaluator.next_pass()
    }

    pub fn previous_pass(&mut self) -> bool {
        self.evaluator.previous_pass()
    }

    // Play state

    pub fn play(&mut self) {
        self.evaluator.play();
    }

    pub fn pause(&mut self) {
        self.evaluator.pause();
    }

    pub fn is_playing(&self) -> bool {
        self.evaluator.is_playing()
    }

    pub fn state(&self) -> RunState {
        self.evaluator.state()
    }

    // Observable state

    pub fn current_step(&self) -> Option<&HistoryEntry> {
        self.evaluator.current_step()
    }

    pub fn value_at_cursor(&self) -> Option<&Value> {
        self.evaluator.value_at_cursor()
    }

    /// The navigation cursor: an index into `0..=history().len()`.
    pub fn cursor(&self) -> usize {
        self.evaluator.cursor()
    }

    pub fn history(&self) -> &History {
        self.evaluator.history()
    }

    pub fn changed_streams(&self) -> &[StreamChange] {
        self.evaluator.changed_streams()
    }

    pub fn observe(&mut self, callback: Box<dyn FnMut(&Notice)>) -> ObserverHandle {
        self.evaluator.observe(callback)
    }

    pub fn ignore(&mut self, handle: ObserverHandle) -> bool {
        self.evaluator.ignore(handle)
    }

    // Stream subsystem

    /// Push a raw value from a host input source.
    pub fn push(&mut self, stream: StreamId, value: Value) {
        self.evaluator.push(stream, value);
    }

    /// The stream a reaction or input node produced this run.
    pub fn stream_for_node(&self, node: NodeId) -> Option<StreamId> {
        self.evaluator.stream_for_node(node)
    }

    /// Read access to the stream registry.
    pub fn streams(&self) -> &crate::stream::StreamRegistry {
        self.evaluator.streams()
    }

    pub fn streams_created(&self) -> u64 {
        self.evaluator.streams_created()
    }

    pub fn executed_steps(&self) -> u64 {
        self.evaluator.executed_steps()
    }

    /// Tear down: stop every stream and refuse further passes. Idempotent.
    pub fn stop(&mut self) {
        self.evaluator.stop();
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.evaluator.stop();
    }
}
