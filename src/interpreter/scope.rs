//==================================================
// File: scope.rs
//==================================================
// Author: Violet Contributors
// License: Duality Public License (DPL v1.0)
// Goal: Lexical scope chain for the violet runtime
// Objective: Arena-backed nested environments with const/shadow/reassign rules
//==================================================

use std::collections::HashMap;

use super::errors::RuntimeError;
use super::types;
use super::value::Value;

/// Index of a scope in the arena. The global scope is always index zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
}

/// One environment: mutable bindings, const bindings, one optional parent.
#[derive(Debug, Default)]
struct Scope {
    vars: HashMap<String, Value>,
    consts: HashMap<String, Value>,
    parent: Option<ScopeId>,
}

/// All scopes of one module run, addressed by index. Block entry/exit is a
/// strict push/pop on the single active pointer; scopes are only ever pushed
/// as children of the active scope and popped in reverse order, so the arena
/// behaves as a stack and popped scopes are freed immediately.
#[derive(Debug)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
    active: ScopeId,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            active: ScopeId::GLOBAL,
        }
    }

    pub fn active(&self) -> ScopeId {
        self.active
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Enter a new child of the active scope and make it active.
    pub fn push_child(&mut self) -> ScopeId {
        let child = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(self.active),
            ..Scope::default()
        });
        self.active = child;
        child
    }

    /// Leave the active scope, restoring its parent. Misuse is an engine
    /// invariant violation, not a user-level error.
    pub fn pop(&mut self) -> Result<(), RuntimeError> {
        if self.active.0 != self.scopes.len() - 1 {
            return Err(RuntimeError::Panic(
                "scope pop does not match the active scope".to_string(),
            ));
        }
        let Some(parent) = self.scopes[self.active.0].parent else {
            return Err(RuntimeError::Panic(
                "attempted to pop the global scope".to_string(),
            ));
        };
        self.scopes.pop();
        self.active = parent;
        Ok(())
    }

    fn scope(&self, id: ScopeId) -> Result<&Scope, RuntimeError> {
        self.scopes
            .get(id.0)
            .ok_or_else(|| RuntimeError::Panic(format!("invalid scope index {}", id.0)))
    }

    fn scope_mut(&mut self, id: ScopeId) -> Result<&mut Scope, RuntimeError> {
        self.scopes
            .get_mut(id.0)
            .ok_or_else(|| RuntimeError::Panic(format!("invalid scope index {}", id.0)))
    }

    /// Walk from the active scope to the root, returning the first match.
    /// Built-in type names resolve ahead of the chain as an implicit
    /// outermost layer.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(tag) = types::resolve(name) {
            return Some(Value::Type(tag));
        }
        let mut current = Some(self.active);
        while let Some(id) = current {
            let scope = self.scopes.get(id.0)?;
            if let Some(value) = scope.vars.get(name).or_else(|| scope.consts.get(name)) {
                return Some(value.clone());
            }
            current = scope.parent;
        }
        None
    }

    /// Whether `name` resolves from the active scope (used for the shadowing
    /// warning; includes built-in type names).
    pub fn is_visible(&self, name: &str) -> bool {
        types::is_builtin_type(name) || self.lookup(name).is_some()
    }

    /// Introduce a binding in the given scope. Shadowing is allowed — the
    /// caller decides whether to warn. An existing binding of the same name
    /// in that scope is replaced outright, const or not.
    pub fn bind(
        &mut self,
        target: ScopeId,
        name: &str,
        value: Value,
        constant: bool,
    ) -> Result<(), RuntimeError> {
        let scope = self.scope_mut(target)?;
        scope.vars.remove(name);
        scope.consts.remove(name);
        if constant {
            scope.consts.insert(name.to_string(), value);
        } else {
            scope.vars.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Plain `=` reassignment: walk the chain from the active scope; a const
    /// binding anywhere wins with the const error; the first mutable binding
    /// is type-checked nominally and overwritten in place.
    pub fn reassign(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let mut current = Some(self.active);
        while let Some(id) = current {
            let scope = self.scope(id)?;
            if scope.consts.contains_key(name) {
                return Err(RuntimeError::ConstReassignment(name.to_string()));
            }
            if let Some(previous) = scope.vars.get(name) {
                if previous.tag() != value.tag() {
                    return Err(RuntimeError::TypeMismatch {
                        found: value.type_name(),
                        expected: previous.type_name(),
                    });
                }
                self.scope_mut(id)?.vars.insert(name.to_string(), value);
                return Ok(());
            }
            current = scope.parent;
        }
        Err(RuntimeError::VariableNotFound(name.to_string()))
    }

    /// Look a name up in the global scope only — the exported surface of a
    /// finished module run.
    pub fn export(&self, name: &str) -> Option<Value> {
        let global = self.scopes.first()?;
        global
            .vars
            .get(name)
            .or_else(|| global.consts.get(name))
            .cloned()
    }

    /// Every binding of the global scope, for `*` imports.
    pub fn exported_bindings(&self) -> Vec<(String, Value)> {
        let Some(global) = self.scopes.first() else {
            return Vec::new();
        };
        let mut bindings: Vec<(String, Value)> = global
            .vars
            .iter()
            .chain(global.consts.iter())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}
