//! Rill Value - immutable runtime value model for the Rill engine.
//!
//! # Architecture
//!
//! - [`Value`]: tagged union of every runtime value kind, with factory
//!   methods as the only way to allocate heap contents
//! - [`NumberValue`]: f64 magnitude plus optional unit, unit-checked
//!   arithmetic
//! - [`StructDefValue`] / [`StructValue`]: structure definitions and
//!   instances, including the structural-update ("evolve") operation
//! - [`Exception`] / [`ExceptionKind`]: the structured failure taxonomy;
//!   every engine failure is a value, never a host-level panic
//! - [`convert`]: the registered value-kind conversion paths

mod convert;
pub mod exception;
mod value;

pub use convert::convert;
pub use exception::{Exception, ExceptionKind};
pub use value::{
    EvalResult, FunctionValue, Heap, LayoutField, NativeFn, NumberValue, StreamId, StructDefValue,
    StructLayout, StructValue, Value,
};

// Factory constructors, re-exported for `use rill_value::exception::*`-free
// call sites (canonical path is rill_value::exception::*).
pub use exception::{
    custom, division_by_zero, duplicate_name, incompatible_units, malformed_container,
    missing_input, not_invocable, type_mismatch, unbound_name, unknown_conversion,
};
