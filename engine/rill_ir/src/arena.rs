//! Flat node arena.
//!
//! All nodes of one program live in a single contiguous array; child lists
//! and name lists live in side arrays addressed by ranges. The arena also
//! owns the interner handle, so builders can take `&str` directly.
//!
//! The builder methods construct trees the way the parser would; the
//! engine's tests use them in place of a parser.

use std::sync::Arc;

use crate::{
    BinaryOp, Expr, ExprKind, FieldRange, FieldSpec, Name, NameRange, NodeId, NodeRange,
    SharedInterner, Span, StreamSource, StringInterner, TypeTag, UnaryOp,
};

/// Arena shared between the compiler and the evaluator for one program run.
pub type SharedArena = Arc<NodeArena>;

/// Flat expression arena.
pub struct NodeArena {
    exprs: Vec<Expr>,
    node_lists: Vec<NodeId>,
    name_lists: Vec<Name>,
    field_lists: Vec<FieldSpec>,
    interner: SharedInterner,
}

impl NodeArena {
    /// Create an empty arena with its own interner.
    pub fn new() -> Self {
        Self::with_interner(Arc::new(StringInterner::new()))
    }

    /// Create an empty arena sharing an existing interner.
    pub fn with_interner(interner: SharedInterner) -> Self {
        NodeArena {
            exprs: Vec::new(),
            node_lists: Vec::new(),
            name_lists: Vec::new(),
            field_lists: Vec::new(),
            interner,
        }
    }

    /// The interner backing this arena's names.
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Intern an identifier.
    pub fn intern(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    /// Resolve a name to its text.
    pub fn resolve(&self, name: Name) -> &'static str {
        self.interner.resolve(name)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    /// Whether the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Allocate a node.
    pub fn push(&mut self, kind: ExprKind, span: Span) -> NodeId {
        let id = NodeId::new(u32::try_from(self.exprs.len()).unwrap_or(u32::MAX));
        self.exprs.push(Expr::new(kind, span));
        id
    }

    /// Node by ID.
    ///
    /// # Panics
    /// Panics on an ID from a different arena (an engine bug, not a program
    /// error).
    pub fn node(&self, id: NodeId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// Node kind by ID.
    pub fn kind(&self, id: NodeId) -> ExprKind {
        self.exprs[id.index()].kind
    }

    /// Store a child list, returning its range.
    pub fn node_list(&mut self, items: &[NodeId]) -> NodeRange {
        let start = u32::try_from(self.node_lists.len()).unwrap_or(u32::MAX);
        let len = u16::try_from(items.len()).unwrap_or(u16::MAX);
        self.node_lists.extend_from_slice(items);
        NodeRange::new(start, len)
    }

    /// Child nodes in a range.
    pub fn nodes(&self, range: NodeRange) -> &[NodeId] {
        &self.node_lists[range.bounds()]
    }

    /// Store a name list, returning its range.
    pub fn name_list(&mut self, items: &[Name]) -> NameRange {
        let start = u32::try_from(self.name_lists.len()).unwrap_or(u32::MAX);
        let len = u16::try_from(items.len()).unwrap_or(u16::MAX);
        self.name_lists.extend_from_slice(items);
        NameRange::new(start, len)
    }

    /// Names in a range.
    pub fn names(&self, range: NameRange) -> &[Name] {
        &self.name_lists[range.bounds()]
    }

    /// Store a field-spec list, returning its range.
    pub fn field_list(&mut self, items: &[FieldSpec]) -> FieldRange {
        let start = u32::try_from(self.field_lists.len()).unwrap_or(u32::MAX);
        let len = u16::try_from(items.len()).unwrap_or(u16::MAX);
        self.field_lists.extend_from_slice(items);
        FieldRange::new(start, len)
    }

    /// Field specs in a range.
    pub fn fields(&self, range: FieldRange) -> &[FieldSpec] {
        &self.field_lists[range.bounds()]
    }
}

// Tree builders. Spans are dummy; a parser supplies real ones via `push`.

impl NodeArena {
    /// Unitless number literal.
    pub fn number(&mut self, magnitude: f64) -> NodeId {
        self.push(
            ExprKind::Number {
                bits: magnitude.to_bits(),
                unit: Name::EMPTY,
            },
            Span::DUMMY,
        )
    }

    /// Number literal with a unit, e.g. `100ms`.
    pub fn number_with_unit(&mut self, magnitude: f64, unit: &str) -> NodeId {
        let unit = self.intern(unit);
        self.push(
            ExprKind::Number {
                bits: magnitude.to_bits(),
                unit,
            },
            Span::DUMMY,
        )
    }

    pub fn text(&mut self, s: &str) -> NodeId {
        let name = self.intern(s);
        self.push(ExprKind::Text(name), Span::DUMMY)
    }

    pub fn boolean(&mut self, b: bool) -> NodeId {
        self.push(ExprKind::Bool(b), Span::DUMMY)
    }

    pub fn none(&mut self) -> NodeId {
        self.push(ExprKind::NoneLiteral, Span::DUMMY)
    }

    pub fn list_of(&mut self, items: &[NodeId]) -> NodeId {
        let range = self.node_list(items);
        self.push(ExprKind::ListLiteral(range), Span::DUMMY)
    }

    pub fn set_of(&mut self, items: &[NodeId]) -> NodeId {
        let range = self.node_list(items);
        self.push(ExprKind::SetLiteral(range), Span::DUMMY)
    }

    /// Map literal from an even-length key/value interleave.
    pub fn map_of(&mut self, entries: &[NodeId]) -> NodeId {
        let range = self.node_list(entries);
        self.push(ExprKind::MapLiteral(range), Span::DUMMY)
    }

    pub fn reference(&mut self, name: &str) -> NodeId {
        let name = self.intern(name);
        self.push(ExprKind::Ref(name), Span::DUMMY)
    }

    pub fn bind(&mut self, name: &str, value: NodeId) -> NodeId {
        let name = self.intern(name);
        self.push(ExprKind::Bind { name, value }, Span::DUMMY)
    }

    pub fn block(&mut self, body: &[NodeId]) -> NodeId {
        let body = self.node_list(body);
        self.push(ExprKind::Block { body }, Span::DUMMY)
    }

    pub fn conditional(&mut self, condition: NodeId, yes: NodeId, no: NodeId) -> NodeId {
        self.push(ExprKind::Conditional { condition, yes, no }, Span::DUMMY)
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.push(ExprKind::Binary { op, left, right }, Span::DUMMY)
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeId) -> NodeId {
        self.push(ExprKind::Unary { op, operand }, Span::DUMMY)
    }

    pub fn evaluate(&mut self, callee: NodeId, args: &[NodeId]) -> NodeId {
        let args = self.node_list(args);
        self.push(ExprKind::Evaluate { callee, args }, Span::DUMMY)
    }

    pub fn function(&mut self, name: &str, params: &[&str], body: NodeId) -> NodeId {
        let name = self.intern(name);
        let params: Vec<Name> = params.iter().map(|p| self.intern(p)).collect();
        let params = self.name_list(&params);
        self.push(ExprKind::FunctionDef { name, params, body }, Span::DUMMY)
    }

    pub fn structure(
        &mut self,
        name: &str,
        fields: &[(&str, TypeTag)],
        members: &[NodeId],
    ) -> NodeId {
        let name = self.intern(name);
        let specs: Vec<FieldSpec> = fields
            .iter()
            .map(|(f, ty)| FieldSpec::new(self.intern(f), *ty))
            .collect();
        let fields = self.field_list(&specs);
        let members = self.node_list(members);
        self.push(
            ExprKind::StructureDef {
                name,
                fields,
                members,
            },
            Span::DUMMY,
        )
    }

    pub fn property_read(&mut self, subject: NodeId, field: &str) -> NodeId {
        let field = self.intern(field);
        self.push(ExprKind::PropertyRead { subject, field }, Span::DUMMY)
    }

    /// Structural update; `path` is the dotted field path, outermost first.
    pub fn property_bind(&mut self, subject: NodeId, path: &[&str], value: NodeId) -> NodeId {
        let names: Vec<Name> = path.iter().map(|p| self.intern(p)).collect();
        let path = self.name_list(&names);
        self.push(
            ExprKind::PropertyBind {
                subject,
                path,
                value,
            },
            Span::DUMMY,
        )
    }

    pub fn reaction(&mut self, initial: NodeId, condition: NodeId, next: NodeId) -> NodeId {
        self.push(
            ExprKind::Reaction {
                initial,
                condition,
                next,
            },
            Span::DUMMY,
        )
    }

    pub fn previous(&mut self) -> NodeId {
        self.push(ExprKind::Previous, Span::DUMMY)
    }

    pub fn stream(&mut self, source: StreamSource, config: &[NodeId]) -> NodeId {
        let config = self.node_list(config);
        self.push(ExprKind::StreamInput { source, config }, Span::DUMMY)
    }

    pub fn changed(&mut self, subject: NodeId) -> NodeId {
        self.push(ExprKind::Changed { subject }, Span::DUMMY)
    }

    pub fn convert(&mut self, subject: NodeId, target: TypeTag) -> NodeId {
        self.push(ExprKind::Convert { subject, target }, Span::DUMMY)
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}
