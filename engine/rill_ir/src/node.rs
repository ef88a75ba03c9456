//! Expression nodes and the closed kind variant.
//!
//! Every construct the engine can compile is one `ExprKind` variant. The
//! step compiler matches on the kind; there is exactly one compile rule per
//! variant.

use std::fmt;

use crate::{FieldRange, Name, NameRange, NodeId, NodeRange, Span};

/// Expression node.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// Expression variants.
///
/// All children are indices, not boxes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ExprKind {
    /// Number literal with optional unit: 1, 2.5, 100ms
    /// (magnitude stored as f64 bits for Eq/Hash)
    Number { bits: u64, unit: Name },

    /// Text literal (interned)
    Text(Name),

    /// Boolean literal
    Bool(bool),

    /// The none value
    NoneLiteral,

    /// Ordered list literal: [a b c]
    ListLiteral(NodeRange),

    /// Set literal: {a b c}
    SetLiteral(NodeRange),

    /// Map literal: {k: v ...} - even-length key/value interleave
    MapLiteral(NodeRange),

    /// Name reference
    Ref(Name),

    /// Single static binding: name: value
    Bind { name: Name, value: NodeId },

    /// Block; evaluates to its last expression, earlier results are
    /// discarded (recorded as ignored for diagnostic display)
    Block { body: NodeRange },

    /// Conditional: condition ? yes no
    Conditional {
        condition: NodeId,
        yes: NodeId,
        no: NodeId,
    },

    /// Binary operator sugar; compiles to the same apply step as a call
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },

    /// Unary operator sugar
    Unary { op: UnaryOp, operand: NodeId },

    /// Explicit evaluation: callee(args...). Named-argument forms are
    /// resolved to positional order by the parser.
    Evaluate { callee: NodeId, args: NodeRange },

    /// Function definition; evaluates to a closure over the defining
    /// environment
    FunctionDef {
        name: Name,
        params: NameRange,
        body: NodeId,
    },

    /// Structure definition: ordered (field, declared type) pairs plus
    /// function members
    StructureDef {
        name: Name,
        fields: FieldRange,
        members: NodeRange,
    },

    /// Field access: subject.field
    PropertyRead { subject: NodeId, field: Name },

    /// Structural update ("evolve"): subject.path: value derives a new
    /// instance with one (possibly nested) field replaced
    PropertyBind {
        subject: NodeId,
        path: NameRange,
        value: NodeId,
    },

    /// Reaction: initial ... condition ... next
    Reaction {
        initial: NodeId,
        condition: NodeId,
        next: NodeId,
    },

    /// The enclosing reaction's prior value. Resolved to the innermost
    /// enclosing reaction by the step compiler.
    Previous,

    /// Program-level external input stream with configuration arguments
    StreamInput {
        source: StreamSource,
        config: NodeRange,
    },

    /// Did the subject stream's change trigger the current pass?
    Changed { subject: NodeId },

    /// Value-kind conversion: subject -> target
    Convert { subject: NodeId, target: TypeTag },
}

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    /// Operator text, as the builtin function it desugars to is named.
    pub fn label(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
        }
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn label(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "~",
        }
    }
}

/// Declared type tag for structure fields and conversion targets.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeTag {
    Number,
    Text,
    Bool,
    List,
    Set,
    Map,
    NoneType,
    Function,
    Structure(Name),
    Stream,
    Any,
}

impl TypeTag {
    pub fn label(self) -> &'static str {
        match self {
            TypeTag::Number => "number",
            TypeTag::Text => "text",
            TypeTag::Bool => "boolean",
            TypeTag::List => "list",
            TypeTag::Set => "set",
            TypeTag::Map => "map",
            TypeTag::NoneType => "none",
            TypeTag::Function => "function",
            TypeTag::Structure(_) => "structure",
            TypeTag::Stream => "stream",
            TypeTag::Any => "any",
        }
    }
}

/// External input stream sources.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum StreamSource {
    /// Clock ticks; configuration: tick interval in milliseconds.
    Time,
    /// Keyboard; configuration: optional target key, edge direction.
    Key,
    /// Pointer position.
    Pointer,
    /// Primary button; configuration: edge direction.
    Button,
    /// Microphone amplitude (0-100).
    Mic,
    /// Random numbers; configuration: min, max, optional seed. Changes per
    /// read rather than per external event and never triggers a pass.
    Random,
    /// Motion simulation (position/velocity).
    Motion,
}

impl StreamSource {
    pub fn label(self) -> &'static str {
        match self {
            StreamSource::Time => "Time",
            StreamSource::Key => "Key",
            StreamSource::Pointer => "Pointer",
            StreamSource::Button => "Button",
            StreamSource::Mic => "Mic",
            StreamSource::Random => "Random",
            StreamSource::Motion => "Motion",
        }
    }

    /// Whether a change pushed into this source requests a new evaluation
    /// pass. Random is the one non-reactive source.
    pub fn is_reactive(self) -> bool {
        !matches!(self, StreamSource::Random)
    }
}

/// A structure definition field: name plus declared type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FieldSpec {
    pub name: Name,
    pub ty: TypeTag,
}

impl FieldSpec {
    pub fn new(name: Name, ty: TypeTag) -> Self {
        FieldSpec { name, ty }
    }
}
