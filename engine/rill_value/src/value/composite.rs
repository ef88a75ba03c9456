//! Composite value types: structure definitions, instances, and functions.
//!
//! Instances are immutable; the structural-update operation ("evolve")
//! derives a new instance with one (possibly nested) field replaced, sharing
//! every other field with the source.

use rustc_hash::FxHashMap;
use std::fmt;

use rill_ir::{Name, NodeId, TypeTag};

use crate::exception::{missing_input, type_mismatch, unbound_name, Exception};
use crate::value::heap::Heap;
use crate::value::Value;

/// A declared field with its resolved display text.
#[derive(Clone, Debug)]
pub struct LayoutField {
    pub name: Name,
    /// Resolved field text, kept so diagnostics and rendering never need the
    /// interner.
    pub text: &'static str,
    pub ty: TypeTag,
}

impl LayoutField {
    pub fn new(name: Name, text: &'static str, ty: TypeTag) -> Self {
        LayoutField { name, text, ty }
    }
}

/// Field layout of a structure definition, in declaration order.
#[derive(Clone, Debug)]
pub struct StructLayout {
    fields: Vec<LayoutField>,
    index: FxHashMap<Name, usize>,
}

impl StructLayout {
    pub fn new(fields: Vec<LayoutField>) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name, i))
            .collect();
        StructLayout { fields, index }
    }

    /// Index of a field by name.
    pub fn get_index(&self, field: Name) -> Option<usize> {
        self.index.get(&field).copied()
    }

    /// Field spec by name.
    pub fn get(&self, field: Name) -> Option<&LayoutField> {
        self.get_index(field).map(|i| &self.fields[i])
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[LayoutField] {
        &self.fields
    }
}

/// A structure definition as a value: callable to construct instances.
///
/// Compares by defining-node identity.
#[derive(Clone, Debug)]
pub struct StructDefValue {
    /// Defining syntax node; the definition's identity.
    pub node: NodeId,
    pub name: Name,
    /// Resolved type text for rendering and diagnostics.
    pub name_text: &'static str,
    pub layout: Heap<StructLayout>,
    /// Function members, evaluated once at definition time.
    pub members: Heap<Vec<(Name, Value)>>,
}

impl StructDefValue {
    pub fn new(
        node: NodeId,
        name: Name,
        name_text: &'static str,
        fields: Vec<LayoutField>,
        members: Vec<(Name, Value)>,
    ) -> Self {
        StructDefValue {
            node,
            name,
            name_text,
            layout: Heap::new(StructLayout::new(fields)),
            members: Heap::new(members),
        }
    }

    /// Construct an instance, binding every declared field once.
    ///
    /// Missing inputs and declared-type disagreements are exceptions.
    pub fn instantiate(&self, args: Vec<Value>) -> Result<StructValue, Exception> {
        let layout = &*self.layout;
        if args.len() < layout.len() {
            let missing = &layout.fields()[args.len()];
            return Err(missing_input(missing.text));
        }
        if args.len() > layout.len() {
            return Err(missing_input(format!(
                "{} takes {} inputs, got {}",
                self.name_text,
                layout.len(),
                args.len()
            )));
        }
        for (field, value) in layout.fields().iter().zip(&args) {
            if !value.matches_tag(field.ty) {
                return Err(type_mismatch(field.ty.label(), value.kind_label()));
            }
        }
        Ok(StructValue {
            def_node: self.node,
            type_name: self.name,
            type_text: self.name_text,
            layout: self.layout.clone(),
            fields: Heap::new(args),
            members: self.members.clone(),
        })
    }
}

impl PartialEq for StructDefValue {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

/// Structure instance: definition identity plus ordered field values.
#[derive(Clone, Debug)]
pub struct StructValue {
    pub def_node: NodeId,
    pub type_name: Name,
    pub type_text: &'static str,
    pub layout: Heap<StructLayout>,
    pub fields: Heap<Vec<Value>>,
    members: Heap<Vec<(Name, Value)>>,
}

impl StructValue {
    /// Field value by name, falling back to the definition's function
    /// members.
    pub fn get(&self, field: Name) -> Option<&Value> {
        if let Some(i) = self.layout.get_index(field) {
            return self.fields.get(i);
        }
        self.members
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, v)| v)
    }

    /// Field value along a nested path.
    pub fn get_path(&self, path: &[Name]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let value = self.get(*first)?;
        if rest.is_empty() {
            return Some(value);
        }
        match value {
            Value::Structure(inner) => inner.get_path(rest),
            _ => None,
        }
    }

    /// Derive a new instance with the field at `path` replaced.
    ///
    /// Path segments carry their resolved text for diagnostics. Every other
    /// field is shared with the source; nested paths produce a new inner
    /// instance inside a new outer instance. The source instance is never
    /// touched.
    pub fn evolve(
        &self,
        path: &[(Name, &'static str)],
        value: Value,
    ) -> Result<StructValue, Exception> {
        let Some(((first, first_text), rest)) = path.split_first() else {
            return Err(unbound_name("(empty field path)"));
        };
        let Some(index) = self.layout.get_index(*first) else {
            return Err(unbound_name(format!("{}.{}", self.type_text, first_text)));
        };
        let spec = &self.layout.fields()[index];
        let replacement = if rest.is_empty() {
            if !value.matches_tag(spec.ty) {
                return Err(type_mismatch(spec.ty.label(), value.kind_label()));
            }
            value
        } else {
            match &self.fields[index] {
                Value::Structure(inner) => Value::Structure(inner.evolve(rest, value)?),
                other => {
                    return Err(type_mismatch("structure", other.kind_label()));
                }
            }
        };
        let mut fields = (*self.fields).clone();
        fields[index] = replacement;
        tracing::trace!(structure = self.type_text, field = *first_text, "evolve");
        Ok(StructValue {
            def_node: self.def_node,
            type_name: self.type_name,
            type_text: self.type_text,
            layout: self.layout.clone(),
            fields: Heap::new(fields),
            members: self.members.clone(),
        })
    }
}

impl PartialEq for StructValue {
    fn eq(&self, other: &Self) -> bool {
        self.def_node == other.def_node && *self.fields == *other.fields
    }
}

impl fmt::Display for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.type_text)?;
        for (i, value) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}

/// Function value (closure).
///
/// Captures are frozen at creation; compares by defining-node identity.
#[derive(Clone, Debug)]
pub struct FunctionValue {
    /// Defining syntax node; the function's identity.
    pub node: NodeId,
    pub name: Name,
    pub name_text: &'static str,
    pub params: Heap<Vec<Name>>,
    pub body: NodeId,
    captures: Heap<FxHashMap<Name, Value>>,
}

impl FunctionValue {
    pub fn new(
        node: NodeId,
        name: Name,
        name_text: &'static str,
        params: Vec<Name>,
        body: NodeId,
        captures: FxHashMap<Name, Value>,
    ) -> Self {
        FunctionValue {
            node,
            name,
            name_text,
            params: Heap::new(params),
            body,
            captures: Heap::new(captures),
        }
    }

    /// Captured environment, frozen at creation.
    pub fn captures(&self) -> &FxHashMap<Name, Value> {
        &self.captures
    }
}

impl PartialEq for FunctionValue {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

#[cfg(test)]
mod tests;
