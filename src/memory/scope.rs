//! Lexical environments
//!
//! A [`Scope`] maps names to [`Binding`]s and points at its enclosing scope.
//! Scopes are reference counted because closures keep the scope they were
//! created in alive after the creating call returns.
//!
//! `let`/`const` bind in the innermost scope; `var` and function parameters
//! bind in the nearest [`ScopeKind::Function`] (or the global scope).

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::value::Value;

/// A variable slot
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Value,
    pub mutable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    Block,
}

/// Why an assignment was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignError {
    Undeclared,
    Constant,
}

#[derive(Debug)]
pub struct Scope {
    vars: RefCell<FxHashMap<String, Binding>>,
    parent: Option<Rc<Scope>>,
    kind: ScopeKind,
}

impl Scope {
    /// Create the root scope of a run
    pub fn global() -> Rc<Self> {
        Rc::new(Scope {
            vars: RefCell::new(FxHashMap::default()),
            parent: None,
            kind: ScopeKind::Global,
        })
    }

    /// Create a scope nested in `parent`
    pub fn child(parent: &Rc<Scope>, kind: ScopeKind) -> Rc<Self> {
        Rc::new(Scope {
            vars: RefCell::new(FxHashMap::default()),
            parent: Some(Rc::clone(parent)),
            kind,
        })
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&Rc<Scope>> {
        self.parent.as_ref()
    }

    /// Bind `name` in this scope.
    ///
    /// Returns `false` (and leaves the old binding) if the name already
    /// exists here.
    pub fn declare(&self, name: &str, value: Value, mutable: bool) -> bool {
        let mut vars = self.vars.borrow_mut();
        if vars.contains_key(name) {
            return false;
        }
        vars.insert(name.to_string(), Binding { value, mutable });
        true
    }

    /// Bind `name` in this scope, replacing any existing binding
    pub fn define(&self, name: &str, value: Value) {
        self.vars.borrow_mut().insert(
            name.to_string(),
            Binding {
                value,
                mutable: true,
            },
        );
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.vars.borrow().contains_key(name)
    }

    /// Value bound to `name` in this scope only
    pub fn get_own(&self, name: &str) -> Option<Value> {
        self.vars.borrow().get(name).map(|b| b.value.clone())
    }

    /// Resolve `name` through the scope chain
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut scope = self;
        loop {
            if let Some(binding) = scope.vars.borrow().get(name) {
                return Some(binding.value.clone());
            }
            scope = scope.parent.as_deref()?;
        }
    }

    /// Overwrite the nearest binding of `name`
    pub fn assign(&self, name: &str, value: Value) -> Result<(), AssignError> {
        let mut scope = self;
        loop {
            if let Some(binding) = scope.vars.borrow_mut().get_mut(name) {
                if !binding.mutable {
                    return Err(AssignError::Constant);
                }
                binding.value = value;
                return Ok(());
            }
            scope = scope.parent.as_deref().ok_or(AssignError::Undeclared)?;
        }
    }

    /// A sibling scope starting with copies of this scope's bindings
    pub fn fork(&self) -> Rc<Self> {
        Rc::new(Scope {
            vars: RefCell::new(self.vars.borrow().clone()),
            parent: self.parent.clone(),
            kind: self.kind,
        })
    }

    /// The scope `var` declarations land in
    pub fn function_scope(self: &Rc<Self>) -> Rc<Scope> {
        let mut scope = Rc::clone(self);
        while scope.kind == ScopeKind::Block {
            match &scope.parent {
                Some(parent) => scope = Rc::clone(parent),
                None => break,
            }
        }
        scope
    }

    /// Drop every binding in this scope and its ancestors.
    ///
    /// Closures stored in a scope they capture form `Rc` cycles; clearing
    /// the chain once a run is over lets them be freed.
    pub fn clear_chain(&self) {
        let mut scope = Some(self);
        while let Some(current) = scope {
            // Take the map out first: dropping values may drop other scopes
            let vars = std::mem::take(&mut *current.vars.borrow_mut());
            drop(vars);
            scope = current.parent.as_deref();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_parents() {
        let global = Scope::global();
        global.declare("x", Value::number(1.0), true);
        let block = Scope::child(&global, ScopeKind::Block);
        block.declare("y", Value::number(2.0), true);

        assert_eq!(block.lookup("x").and_then(|v| v.as_number()), Some(1.0));
        assert_eq!(block.lookup("y").and_then(|v| v.as_number()), Some(2.0));
        assert!(global.lookup("y").is_none());
    }

    #[test]
    fn test_shadowing_and_redeclaration() {
        let global = Scope::global();
        assert!(global.declare("x", Value::number(1.0), true));
        assert!(!global.declare("x", Value::number(5.0), true));

        let block = Scope::child(&global, ScopeKind::Block);
        assert!(block.declare("x", Value::number(2.0), true));
        assert_eq!(block.lookup("x").and_then(|v| v.as_number()), Some(2.0));
        assert_eq!(global.lookup("x").and_then(|v| v.as_number()), Some(1.0));
    }

    #[test]
    fn test_assign_respects_const() {
        let global = Scope::global();
        global.declare("n", Value::number(3.0), false);
        global.declare("m", Value::number(3.0), true);
        let block = Scope::child(&global, ScopeKind::Block);

        assert_eq!(
            block.assign("n", Value::number(4.0)),
            Err(AssignError::Constant)
        );
        assert_eq!(block.assign("m", Value::number(4.0)), Ok(()));
        assert_eq!(global.get_own("m").and_then(|v| v.as_number()), Some(4.0));
        assert_eq!(
            block.assign("missing", Value::Null),
            Err(AssignError::Undeclared)
        );
    }

    #[test]
    fn test_fork_copies_bindings() {
        let global = Scope::global();
        let block = Scope::child(&global, ScopeKind::Block);
        block.declare("i", Value::number(0.0), true);

        let next = block.fork();
        next.assign("i", Value::number(1.0)).unwrap();
        assert_eq!(block.get_own("i").and_then(|v| v.as_number()), Some(0.0));
        assert_eq!(next.get_own("i").and_then(|v| v.as_number()), Some(1.0));
        assert!(Rc::ptr_eq(next.parent().unwrap(), &global));
        assert_eq!(next.kind(), ScopeKind::Block);
    }

    #[test]
    fn test_function_scope_skips_blocks() {
        let global = Scope::global();
        let function = Scope::child(&global, ScopeKind::Function);
        let inner = Scope::child(&function, ScopeKind::Block);
        let innermost = Scope::child(&inner, ScopeKind::Block);

        assert!(Rc::ptr_eq(&innermost.function_scope(), &function));
        assert!(Rc::ptr_eq(&global.function_scope(), &global));
    }

    #[test]
    fn test_clear_chain() {
        let global = Scope::global();
        global.declare("x", Value::number(1.0), true);
        let block = Scope::child(&global, ScopeKind::Block);
        block.declare("y", Value::number(1.0), true);

        block.clear_chain();
        assert!(!block.has_own("y"));
        assert!(!global.has_own("x"));
    }
}
