//! Exception values.
//!
//! Every engine failure is an `Exception` carried inside a `Value`, never a
//! host-level panic. A halting exception stops the remainder of the current
//! evaluation pass only; history before it is untouched.
//!
//! Factory functions (e.g. [`unbound_name`]) are the public constructors -
//! they populate the structured [`ExceptionKind`], and `Display` renders the
//! message from the kind.

use std::fmt;

use rill_ir::NodeId;

/// Typed exception category.
///
/// Each variant carries the data for its condition, so hosts can match on
/// the kind instead of parsing message strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExceptionKind {
    /// An operation received a value of an unexpected kind.
    TypeMismatch { expected: String, got: String },
    /// Arithmetic or comparison over disagreeing units.
    IncompatibleUnits { left: String, right: String },
    /// A reference resolved to nothing (or was read before its binding).
    UnboundName { name: String },
    /// A name was bound twice in the same scope.
    DuplicateName { name: String },
    /// A required function input or structure field is absent.
    MissingInput { name: String },
    /// The callee of an evaluation is not a function or structure
    /// definition.
    NotInvocable { got: String },
    /// No registered path converts between the requested kinds.
    UnknownConversion { from: String, to: String },
    /// Ordering or delimiter errors in list/set/map construction.
    MalformedContainer { reason: String },
    DivisionByZero,
    /// Catch-all for conditions without a structured kind.
    Custom { message: String },
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, got } => {
                write!(f, "expected {expected}, got {got}")
            }
            Self::IncompatibleUnits { left, right } => {
                write!(f, "incompatible units {left} and {right}")
            }
            Self::UnboundName { name } => write!(f, "{name} is not bound here"),
            Self::DuplicateName { name } => write!(f, "{name} is already bound in this scope"),
            Self::MissingInput { name } => write!(f, "required input {name} is missing"),
            Self::NotInvocable { got } => write!(f, "{got} cannot be evaluated on inputs"),
            Self::UnknownConversion { from, to } => {
                write!(f, "no conversion from {from} to {to}")
            }
            Self::MalformedContainer { reason } => write!(f, "malformed container: {reason}"),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// Diagnostic payload of an exception value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exception {
    /// Structured category.
    pub kind: ExceptionKind,
    /// Syntax node the failure is tied to. Factories leave this INVALID;
    /// the evaluator attaches the executing step's node.
    pub node: NodeId,
}

impl Exception {
    pub fn new(kind: ExceptionKind) -> Self {
        Exception {
            kind,
            node: NodeId::INVALID,
        }
    }

    /// Attach the node the failure occurred at, keeping an already-attached
    /// node (the innermost location wins).
    #[must_use]
    pub fn at(mut self, node: NodeId) -> Self {
        if !self.node.is_valid() {
            self.node = node;
        }
        self
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for Exception {}

// Factory constructors

pub fn type_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Exception {
    Exception::new(ExceptionKind::TypeMismatch {
        expected: expected.into(),
        got: got.into(),
    })
}

pub fn incompatible_units(left: impl Into<String>, right: impl Into<String>) -> Exception {
    Exception::new(ExceptionKind::IncompatibleUnits {
        left: left.into(),
        right: right.into(),
    })
}

pub fn unbound_name(name: impl Into<String>) -> Exception {
    Exception::new(ExceptionKind::UnboundName { name: name.into() })
}

pub fn duplicate_name(name: impl Into<String>) -> Exception {
    Exception::new(ExceptionKind::DuplicateName { name: name.into() })
}

pub fn missing_input(name: impl Into<String>) -> Exception {
    Exception::new(ExceptionKind::MissingInput { name: name.into() })
}

pub fn not_invocable(got: impl Into<String>) -> Exception {
    Exception::new(ExceptionKind::NotInvocable { got: got.into() })
}

pub fn unknown_conversion(from: impl Into<String>, to: impl Into<String>) -> Exception {
    Exception::new(ExceptionKind::UnknownConversion {
        from: from.into(),
        to: to.into(),
    })
}

pub fn malformed_container(reason: impl Into<String>) -> Exception {
    Exception::new(ExceptionKind::MalformedContainer {
        reason: reason.into(),
    })
}

pub fn division_by_zero() -> Exception {
    Exception::new(ExceptionKind::DivisionByZero)
}

pub fn custom(message: impl Into<String>) -> Exception {
    Exception::new(ExceptionKind::Custom {
        message: message.into(),
    })
}
