//! Runtime values for the Rill engine.
//!
//! Values are immutable: every transforming operation returns a new value,
//! and heap contents are shared structurally through [`Heap`]. All heap
//! allocations go through factory methods on `Value` (the `Heap`
//! constructor is crate-private), so external code cannot build values that
//! bypass the immutability contract.
//!
//! Structural equality is recursive on tag and contents, except functions,
//! structure definitions, and streams, which compare by identity.

mod composite;
mod heap;
mod number;

use std::fmt;

use rill_ir::{NodeId, TypeTag};

use crate::exception::Exception;

pub use composite::{FunctionValue, LayoutField, StructDefValue, StructLayout, StructValue};
pub use heap::Heap;
pub use number::NumberValue;

/// Result of evaluating one operation.
pub type EvalResult = Result<Value, Exception>;

/// Native (built-in) function signature. Operator sugar collapses to these.
pub type NativeFn = fn(&[Value]) -> EvalResult;

/// Identity of a stream owned by an evaluator's registry.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct StreamId(u32);

impl StreamId {
    /// Invalid stream ID (sentinel value).
    pub const INVALID: StreamId = StreamId(u32::MAX);

    #[inline]
    pub const fn new(index: u32) -> Self {
        StreamId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "StreamId({})", self.0)
        } else {
            write!(f, "StreamId::INVALID")
        }
    }
}

/// Runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    /// Number with optional unit.
    Number(NumberValue),
    /// Text value.
    Text(Heap<String>),
    /// Boolean value.
    Bool(bool),
    /// The none value.
    None,
    /// Ordered sequence.
    List(Heap<Vec<Value>>),
    /// Structurally unique members; insertion order is irrelevant for
    /// equality.
    Set(Heap<Vec<Value>>),
    /// Unique-key association pairs.
    Map(Heap<Vec<(Value, Value)>>),
    /// Function value (closure over the defining environment).
    Function(FunctionValue),
    /// Built-in function.
    Native(NativeFn, &'static str),
    /// Structure definition (callable constructor).
    StructureDef(Heap<StructDefValue>),
    /// Structure instance.
    Structure(StructValue),
    /// Stream handle; consumers read the stream's current value on demand.
    Stream(StreamId),
    /// Diagnostic payload; halts the pass that produced it.
    Exception(Heap<Exception>),
}

// Factory methods (the only way to construct heap values)

impl Value {
    /// Unitless number.
    #[inline]
    pub fn number(magnitude: f64) -> Self {
        Value::Number(NumberValue::new(magnitude))
    }

    /// Number with a unit, e.g. `100ms`.
    #[inline]
    pub fn number_with_unit(magnitude: f64, unit: &str) -> Self {
        Value::Number(NumberValue::with_unit(magnitude, unit))
    }

    #[inline]
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(Heap::new(s.into()))
    }

    #[inline]
    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    #[inline]
    pub fn none() -> Self {
        Value::None
    }

    #[inline]
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Heap::new(items))
    }

    /// Set from members; structurally duplicate members are dropped.
    pub fn set(items: Vec<Value>) -> Self {
        let mut unique: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Value::Set(Heap::new(unique))
    }

    /// Map from entries. Callers guarantee key uniqueness; the step that
    /// builds map literals raises a malformed-container exception first.
    #[inline]
    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        Value::Map(Heap::new(entries))
    }

    #[inline]
    pub fn function(f: FunctionValue) -> Self {
        Value::Function(f)
    }

    #[inline]
    pub fn native(f: NativeFn, name: &'static str) -> Self {
        Value::Native(f, name)
    }

    #[inline]
    pub fn structure_def(def: StructDefValue) -> Self {
        Value::StructureDef(Heap::new(def))
    }

    #[inline]
    pub fn structure(instance: StructValue) -> Self {
        Value::Structure(instance)
    }

    #[inline]
    pub fn stream(id: StreamId) -> Self {
        Value::Stream(id)
    }

    #[inline]
    pub fn exception(e: Exception) -> Self {
        Value::Exception(Heap::new(e))
    }
}

impl Value {
    /// Kind label for diagnostics.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Bool(_) => "boolean",
            Value::None => "none",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Function(_) | Value::Native(..) => "function",
            Value::StructureDef(_) => "structure definition",
            Value::Structure(_) => "structure",
            Value::Stream(_) => "stream",
            Value::Exception(_) => "exception",
        }
    }

    /// Whether the value halts a pass.
    #[inline]
    pub fn is_exception(&self) -> bool {
        matches!(self, Value::Exception(_))
    }

    /// Whether the value satisfies a declared type tag.
    pub fn matches_tag(&self, tag: TypeTag) -> bool {
        match tag {
            TypeTag::Any => true,
            TypeTag::Number => matches!(self, Value::Number(_)),
            TypeTag::Text => matches!(self, Value::Text(_)),
            TypeTag::Bool => matches!(self, Value::Bool(_)),
            TypeTag::List => matches!(self, Value::List(_)),
            TypeTag::Set => matches!(self, Value::Set(_)),
            TypeTag::Map => matches!(self, Value::Map(_)),
            TypeTag::NoneType => matches!(self, Value::None),
            TypeTag::Function => matches!(self, Value::Function(_) | Value::Native(..)),
            TypeTag::Stream => matches!(self, Value::Stream(_)),
            TypeTag::Structure(name) => {
                matches!(self, Value::Structure(s) if s.type_name == name)
            }
        }
    }

    /// The defining-node identity for identity-compared values.
    pub fn definition_node(&self) -> Option<NodeId> {
        match self {
            Value::Function(f) => Some(f.node),
            Value::StructureDef(d) => Some(d.node),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::List(a), Value::List(b)) => a == b,
            // Membership comparison; members are unique by construction.
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.contains(x))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter().any(|(bk, bv)| bk == k && bv == v)
                    })
            }
            // Identity comparisons.
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Native(_, a), Value::Native(_, b)) => a == b,
            (Value::StructureDef(a), Value::StructureDef(b)) => a == b,
            (Value::Structure(a), Value::Structure(b)) => a == b,
            (Value::Stream(a), Value::Stream(b)) => a == b,
            (Value::Exception(a), Value::Exception(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => n.fmt(f),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::Bool(b) => write!(f, "{}", if *b { "⊤" } else { "⊥" }),
            Value::None => write!(f, "ø"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Set(items) => {
                write!(f, "{{")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "}}")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => write!(f, "ƒ{}", func.name_text),
            Value::Native(_, name) => write!(f, "ƒ{name}"),
            Value::StructureDef(def) => write!(f, "•{}", def.name_text),
            Value::Structure(s) => s.fmt(f),
            Value::Stream(id) => write!(f, "…{}", id.raw()),
            Value::Exception(e) => write!(f, "!{e}"),
        }
    }
}
