//! Execution history.
//!
//! An append-only, indexed log of every executed step and the value it
//! produced, partitioned into evaluation passes delimited by the stream
//! change (or initial start) that triggered them. History is created at
//! program start, appended to on every pass, and never truncated or
//! rebuilt - only navigated.

use rill_ir::NodeId;
use rill_value::{StreamId, Value};

use crate::step::StepOp;

/// What began an evaluation pass.
#[derive(Clone, Debug, PartialEq)]
pub enum PassTrigger {
    /// Program start.
    Start,
    /// An external stream pushed a new value.
    StreamChange { stream: StreamId, value: Value },
}

/// One executed step.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    /// Pass this step ran in.
    pub pass: u32,
    /// Syntax node the step belongs to.
    pub node: NodeId,
    /// The operation that ran.
    pub op: StepOp,
    /// Value the step produced, if it produced one.
    pub value: Option<Value>,
    /// A computed-but-discarded block statement result.
    pub ignored: bool,
}

/// One evaluation pass.
#[derive(Clone, Debug)]
pub struct PassRecord {
    pub trigger: PassTrigger,
    /// Index of the pass's first entry.
    pub start: usize,
    /// One past the last entry; `None` while the pass is still running.
    pub end: Option<usize>,
    /// The pass's resulting value (the halting exception when halted).
    pub final_value: Option<Value>,
    pub halted: bool,
}

/// Append-only step log with pass partitions.
#[derive(Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    passes: Vec<PassRecord>,
}

impl History {
    pub fn new() -> Self {
        History::default()
    }

    /// Begin a new pass; returns its index.
    pub fn begin_pass(&mut self, trigger: PassTrigger) -> u32 {
        let index = u32::try_from(self.passes.len()).unwrap_or(u32::MAX);
        self.passes.push(PassRecord {
            trigger,
            start: self.entries.len(),
            end: None,
            final_value: None,
            halted: false,
        });
        index
    }

    /// Record an executed step; returns its index.
    pub fn record(&mut self, entry: HistoryEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Close the running pass.
    pub fn finish_pass(&mut self, final_value: Option<Value>, halted: bool) {
        if let Some(pass) = self.passes.last_mut() {
            pass.end = Some(self.entries.len());
            pass.final_value = final_value;
            pass.halted = halted;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn passes(&self) -> &[PassRecord] {
        &self.passes
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn pass(&self, index: u32) -> Option<&PassRecord> {
        self.passes.get(index as usize)
    }

    /// The pass a step index falls in.
    pub fn pass_of_step(&self, step: usize) -> Option<u32> {
        self.entries
            .get(step)
            .map(|e| e.pass)
            .or_else(|| self.entries.last().map(|e| e.pass))
    }

    /// Entries of one pass (up to its recorded end, or the log frontier for
    /// a running pass).
    pub fn pass_entries(&self, index: u32) -> &[HistoryEntry] {
        let Some(pass) = self.passes.get(index as usize) else {
            return &[];
        };
        let end = pass.end.unwrap_or(self.entries.len());
        &self.entries[pass.start..end]
    }

    /// Final value of the most recent closed pass.
    pub fn latest_value(&self) -> Option<&Value> {
        self.passes
            .iter()
            .rev()
            .find_map(|p| p.final_value.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_ir::NodeId;

    fn entry(pass: u32, value: Option<Value>) -> HistoryEntry {
        HistoryEntry {
            pass,
            node: NodeId::new(0),
            op: StepOp::Discard,
            value,
            ignored: false,
        }
    }

    #[test]
    fn test_pass_partitioning() {
        let mut history = History::new();
        let p0 = history.begin_pass(PassTrigger::Start);
        history.record(entry(p0, Some(Value::number(1.0))));
        history.record(entry(p0, Some(Value::number(2.0))));
        history.finish_pass(Some(Value::number(2.0)), false);

        let p1 = history.begin_pass(PassTrigger::StreamChange {
            stream: StreamId::new(0),
            value: Value::number(9.0),
        });
        history.record(entry(p1, Some(Value::number(3.0))));
        history.finish_pass(Some(Value::number(3.0)), false);

        assert_eq!(history.pass_count(), 2);
        assert_eq!(history.pass_entries(0).len(), 2);
        assert_eq!(history.pass_entries(1).len(), 1);
        assert_eq!(history.latest_value(), Some(&Value::number(3.0)));
    }

    #[test]
    fn test_running_pass_has_open_end() {
        let mut history = History::new();
        let p0 = history.begin_pass(PassTrigger::Start);
        history.record(entry(p0, None));
        assert_eq!(history.passes()[0].end, None);
        assert_eq!(history.pass_entries(0).len(), 1);
    }
}
