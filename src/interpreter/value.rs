//==================================================
// File: value.rs
//==================================================
// Author: Violet Contributors
// License: Duality Public License (DPL v1.0)
// Goal: Violet runtime value model
// Objective: Define value variants and the operator capability dispatch
//            (arithmetic, comparison, cast, attribute access)
//==================================================

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{BinaryOp, FunctionDecl, Parameter, Stmt, StmtKind};

use super::Interpreter;
use super::errors::RuntimeError;
use super::types::{self, TypeTag};

/// A violet runtime value. Values are immutable once constructed; operators
/// produce new values.
#[derive(Debug, Clone)]
pub enum Value {
    Void,
    Boolean(bool),
    Integer(i64),
    String(String),
    List(Vec<Value>),
    Function(Rc<Function>),
    Module(Rc<ModuleValue>),
    Native(NativeCallable),
    Type(TypeTag),
}

/// A user-defined function. Shared through `Rc` so every binding that holds
/// the function observes the same inferred return type.
#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub params: Vec<Parameter>,
    /// `None` until declared or inferred from the first executed return.
    pub return_type: Cell<Option<TypeTag>>,
    pub body: Vec<Stmt>,
}

impl Function {
    /// Build a function object from its definition. A body whose last
    /// statement is not a return gets an implicit `return nil;` appended, so
    /// every call path yields a value.
    pub fn from_decl(decl: &FunctionDecl) -> Result<Self, RuntimeError> {
        let return_type = match &decl.return_type {
            Some(annotation) => Some(types::resolve_annotation(annotation)?),
            None => None,
        };
        Ok(Self {
            name: decl.name.clone(),
            params: decl.params.clone(),
            return_type: Cell::new(return_type),
            body: Self::with_implicit_return(decl.body.clone()),
        })
    }

    /// Anonymous function wrapping a single expression: `params => expr`.
    pub fn lambda(params: Vec<Parameter>, body_expr: crate::ast::Expr) -> Self {
        let line = body_expr.line;
        Self {
            name: "<lambda>".to_string(),
            params,
            return_type: Cell::new(None),
            body: vec![Stmt {
                kind: StmtKind::Return(Some(body_expr)),
                line,
            }],
        }
    }

    fn with_implicit_return(mut body: Vec<Stmt>) -> Vec<Stmt> {
        let needs_return = !matches!(
            body.last(),
            Some(Stmt {
                kind: StmtKind::Return(_),
                ..
            })
        );
        if needs_return {
            let line = body.last().map(|stmt| stmt.line).unwrap_or(0);
            body.push(Stmt {
                kind: StmtKind::Return(None),
                line,
            });
        }
        body
    }
}

/// A module value: named bag of exported bindings, reachable through
/// attribute access only.
#[derive(Debug, Clone)]
pub struct ModuleValue {
    pub name: String,
    pub exports: HashMap<String, Value>,
}

/// Externally supplied callable. The two calling conventions are a closed
/// set chosen at registration time: engine-aware callables receive the
/// active engine, plain callables receive the argument values alone.
#[derive(Clone, Copy)]
pub enum NativeCallable {
    EngineAware {
        name: &'static str,
        func: fn(&[Value], &mut Interpreter) -> Result<Value, RuntimeError>,
    },
    Plain {
        name: &'static str,
        func: fn(&[Value]) -> Result<Value, RuntimeError>,
    },
}

impl NativeCallable {
    pub fn name(&self) -> &'static str {
        match self {
            NativeCallable::EngineAware { name, .. } | NativeCallable::Plain { name, .. } => name,
        }
    }
}

impl fmt::Debug for NativeCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let convention = match self {
            NativeCallable::EngineAware { .. } => "engine-aware",
            NativeCallable::Plain { .. } => "plain",
        };
        write!(f, "NativeCallable({}, {convention})", self.name())
    }
}

impl Value {
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Void => TypeTag::Void,
            Value::Boolean(_) => TypeTag::Boolean,
            Value::Integer(_) => TypeTag::Integer,
            Value::String(_) => TypeTag::String,
            Value::List(_) => TypeTag::List,
            Value::Function(_) => TypeTag::Function,
            Value::Module(_) => TypeTag::Module,
            Value::Native(_) => TypeTag::Native,
            Value::Type(_) => TypeTag::Type,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.tag().name()
    }

    /// Construct a homogeneous list from already-evaluated elements. The
    /// element variant is inferred from the first element, so an empty list
    /// cannot be constructed from a literal.
    pub fn list_from(elements: Vec<Value>) -> Result<Value, RuntimeError> {
        let Some(first) = elements.first() else {
            return Err(RuntimeError::EmptyListLiteral);
        };
        let expected = first.tag();
        for element in &elements {
            if element.tag() != expected {
                return Err(RuntimeError::MixedListLiteral {
                    found: element.type_name(),
                    expected: expected.name(),
                });
            }
        }
        Ok(Value::List(elements))
    }

    /// Dotted attribute lookup. Only module values expose attributes.
    pub fn attribute(&self, name: &str) -> Result<Value, RuntimeError> {
        match self {
            Value::Module(module) => {
                module
                    .exports
                    .get(name)
                    .cloned()
                    .ok_or_else(|| RuntimeError::NoAttribute {
                        subject: format!("module '{}'", module.name),
                        attribute: name.to_string(),
                    })
            }
            other => Err(RuntimeError::NoAttribute {
                subject: format!("'{}'", other.type_name()),
                attribute: name.to_string(),
            }),
        }
    }
}

//==================================================
// Section 1.0 - Operator Dispatch
//==================================================
// One dispatch table per operator family, consulted by the evaluator's
// generic binary entry point. A variant absent from a family's table fails
// with the capability error.

pub fn apply_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Add
        | BinaryOp::Subtract
        | BinaryOp::Multiply
        | BinaryOp::Divide
        | BinaryOp::Modulo => apply_arithmetic(op, lhs, rhs),
        BinaryOp::Equal | BinaryOp::NotEqual => apply_equality(op, lhs, rhs),
        BinaryOp::Greater | BinaryOp::GreaterEqual | BinaryOp::Less | BinaryOp::LessEqual => {
            apply_ordering(op, lhs, rhs)
        }
        // Parsed by the grammar; no variant declares a handler for it.
        BinaryOp::Range => Err(RuntimeError::OperatorNotApplicable {
            operator: op.symbol(),
            operand: lhs.type_name(),
        }),
    }
}

fn apply_arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => integer_arithmetic(op, *a, *b),
        // The generic primitive '+' covers same-variant concatenation.
        (Value::String(a), Value::String(b)) if op == BinaryOp::Add => {
            Ok(Value::String(format!("{a}{b}")))
        }
        (Value::List(a), Value::List(b)) if op == BinaryOp::Add => {
            let mut joined = a.clone();
            joined.extend(b.iter().cloned());
            Ok(Value::List(joined))
        }
        (lhs, rhs) if lhs.tag() == rhs.tag() => Err(RuntimeError::OperatorNotApplicable {
            operator: op.symbol(),
            operand: lhs.type_name(),
        }),
        (lhs, rhs) => Err(RuntimeError::OperatorMismatch {
            operator: op.symbol(),
            lhs: lhs.type_name(),
            rhs: rhs.type_name(),
        }),
    }
}

fn integer_arithmetic(op: BinaryOp, a: i64, b: i64) -> Result<Value, RuntimeError> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Subtract => a.checked_sub(b),
        BinaryOp::Multiply => a.checked_mul(b),
        // Truncating division toward zero.
        BinaryOp::Divide => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            a.checked_div(b)
        }
        BinaryOp::Modulo => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            a.checked_rem(b)
        }
        _ => None,
    };
    result
        .map(Value::Integer)
        .ok_or(RuntimeError::IntegerOverflow {
            operator: op.symbol(),
        })
}

/// Equality is defined for every primitive variant and for type objects;
/// mismatched variants compare unequal rather than failing.
fn apply_equality(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    for operand in [lhs, rhs] {
        if !operand.tag().is_primitive() && operand.tag() != TypeTag::Type {
            return Err(RuntimeError::OperatorNotApplicable {
                operator: op.symbol(),
                operand: operand.type_name(),
            });
        }
    }
    let equal = primitive_eq(lhs, rhs);
    Ok(Value::Boolean(if op == BinaryOp::Equal {
        equal
    } else {
        !equal
    }))
}

fn primitive_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Void, Value::Void) => true,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| primitive_eq(x, y))
        }
        (Value::Type(a), Value::Type(b)) => a == b,
        _ => false,
    }
}

fn apply_ordering(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    let ordering = match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (lhs, rhs) if lhs.tag().is_primitive() && rhs.tag().is_primitive() => {
            if lhs.tag() == rhs.tag() {
                // Same variant, but not an orderable one (Void, List).
                return Err(RuntimeError::OperatorNotApplicable {
                    operator: op.symbol(),
                    operand: lhs.type_name(),
                });
            }
            return Err(RuntimeError::OperatorMismatch {
                operator: op.symbol(),
                lhs: lhs.type_name(),
                rhs: rhs.type_name(),
            });
        }
        (lhs, rhs) => {
            let operand = if lhs.tag().is_primitive() { rhs } else { lhs };
            return Err(RuntimeError::OperatorNotApplicable {
                operator: op.symbol(),
                operand: operand.type_name(),
            });
        }
    };
    let result = match op {
        BinaryOp::Greater => ordering.is_gt(),
        BinaryOp::GreaterEqual => ordering.is_ge(),
        BinaryOp::Less => ordering.is_lt(),
        BinaryOp::LessEqual => ordering.is_le(),
        _ => false,
    };
    Ok(Value::Boolean(result))
}

//==================================================
// Section 2.0 - Casts
//==================================================

/// The cast table: `String -> {String, Boolean, Integer}`,
/// `Integer -> {String, Boolean, Integer}`; every other pair fails.
pub fn cast(value: &Value, target: TypeTag) -> Result<Value, RuntimeError> {
    match (value, target) {
        (Value::String(text), TypeTag::String) => Ok(Value::String(text.clone())),
        (Value::String(text), TypeTag::Boolean) => Ok(Value::Boolean(!text.is_empty())),
        (Value::String(text), TypeTag::Integer) => text
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| RuntimeError::MalformedCastLiteral {
                text: text.clone(),
            }),
        (Value::Integer(n), TypeTag::String) => Ok(Value::String(n.to_string())),
        (Value::Integer(n), TypeTag::Boolean) => Ok(Value::Boolean(*n != 0)),
        (Value::Integer(n), TypeTag::Integer) => Ok(Value::Integer(*n)),
        (value, target) => Err(RuntimeError::CastNotSupported {
            from: value.type_name(),
            to: target.name(),
        }),
    }
}

//==================================================
// Section 3.0 - Display & Equality
//==================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("nil"),
            Value::Boolean(flag) => write!(f, "{flag}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::String(text) => f.write_str(text),
            Value::List(elements) => {
                f.write_str("[")?;
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str("]")
            }
            Value::Function(function) => write!(f, "<function {}>", function.name),
            Value::Module(module) => write!(f, "<module {}>", module.name),
            Value::Native(native) => write!(f, "<native function {}>", native.name()),
            Value::Type(tag) => write!(f, "{tag}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a.name() == b.name(),
            (lhs, rhs) => lhs.tag() == rhs.tag() && primitive_eq(lhs, rhs),
        }
    }
}
