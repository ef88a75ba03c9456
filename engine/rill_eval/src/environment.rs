//! Environment for name scoping.
//!
//! Uses a scope stack (not cloning) for efficient scope management. Rill
//! bindings are single static bindings: a name is defined once per scope and
//! never reassigned, so scopes only grow.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use rill_ir::Name;
use rill_value::Value;

/// A single-threaded scope wrapper for reference-counted interior
/// mutability.
///
/// Scopes are shared between the scope stack and closures' parent chains;
/// `Rc` (not `Arc`) because one evaluation pass is ever live at a time.
#[repr(transparent)]
pub struct LocalScope<T>(Rc<RefCell<T>>);

impl<T> LocalScope<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        LocalScope(Rc::new(RefCell::new(value)))
    }
}

impl<T> Clone for LocalScope<T> {
    #[inline]
    fn clone(&self) -> Self {
        LocalScope(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for LocalScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalScope").field(&self.0).finish()
    }
}

impl<T> Deref for LocalScope<T> {
    type Target = RefCell<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A single scope containing name bindings.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: FxHashMap<Name, Value>,
    /// Parent scope (for lexical scoping).
    parent: Option<LocalScope<Scope>>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn with_parent(parent: LocalScope<Scope>) -> Self {
        Scope {
            bindings: FxHashMap::default(),
            parent: Some(parent),
        }
    }

    /// Seed a scope with a frozen binding map (closure captures, call
    /// arguments).
    pub fn from_bindings(bindings: FxHashMap<Name, Value>) -> Self {
        Scope {
            bindings,
            parent: None,
        }
    }

    /// Define a name in this scope. Returns `false` if the name is already
    /// bound here (single static binding).
    #[inline]
    pub fn define(&mut self, name: Name, value: Value) -> bool {
        use std::collections::hash_map::Entry;
        match self.bindings.entry(name) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Look up a name through the parent chain.
    pub fn lookup(&self, name: Name) -> Option<Value> {
        if let Some(value) = self.bindings.get(&name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.borrow().lookup(name))
    }
}

/// Saved local scopes of a suspended caller, restored on function return.
pub struct CallToken {
    saved: Vec<LocalScope<Scope>>,
}

/// Environment using a scope stack.
pub struct Environment {
    /// Stack of scopes, current scope at the top.
    scopes: Vec<LocalScope<Scope>>,
    /// Global scope (always at the bottom).
    global: LocalScope<Scope>,
}

impl Environment {
    pub fn new() -> Self {
        let global = LocalScope::new(Scope::new());
        Environment {
            scopes: vec![global.clone()],
            global,
        }
    }

    /// Current scope depth.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    #[inline]
    pub fn push_scope(&mut self) {
        let parent = self.current_scope();
        self.scopes.push(LocalScope::new(Scope::with_parent(parent)));
    }

    #[inline]
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    #[inline]
    fn current_scope(&self) -> LocalScope<Scope> {
        self.scopes.last().unwrap_or(&self.global).clone()
    }

    /// Define a name in the current scope. Returns `false` on a duplicate
    /// binding.
    #[inline]
    pub fn define(&mut self, name: Name, value: Value) -> bool {
        self.scopes
            .last()
            .unwrap_or(&self.global)
            .borrow_mut()
            .define(name, value)
    }

    /// Look up a name through the lexical chain.
    #[inline]
    pub fn lookup(&self, name: Name) -> Option<Value> {
        self.scopes
            .last()
            .unwrap_or(&self.global)
            .borrow()
            .lookup(name)
    }

    /// Enter a function call: the callee sees its frozen bindings and the
    /// global scope, not the caller's locals.
    pub fn enter_call(&mut self, bindings: FxHashMap<Name, Value>) -> CallToken {
        let mut call_scope = Scope::from_bindings(bindings);
        call_scope.parent = Some(self.global.clone());
        let saved = std::mem::replace(&mut self.scopes, vec![LocalScope::new(call_scope)]);
        CallToken { saved }
    }

    /// Return from a function call, restoring the caller's scopes.
    pub fn exit_call(&mut self, token: CallToken) {
        self.scopes = token.saved;
    }

    /// Capture every visible binding for a closure.
    ///
    /// Inner bindings shadow outer ones.
    pub fn capture(&self) -> FxHashMap<Name, Value> {
        fn collect(scope: &Scope, captures: &mut FxHashMap<Name, Value>) {
            for (name, value) in &scope.bindings {
                captures.entry(*name).or_insert_with(|| value.clone());
            }
            if let Some(parent) = &scope.parent {
                collect(&parent.borrow(), captures);
            }
        }
        let mut captures = FxHashMap::default();
        collect(&self.current_scope().borrow(), &mut captures);
        captures
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
