//==============================================
// File: interpreter/mod.rs
//==============================================
// Author: Violet Contributors
// License: Duality Public License (DPL v1.0)
// Goal: Violet tree-walking evaluation engine
// Objective: Statement/expression evaluation, function call protocol,
//            entry point contract, and import execution
//==============================================

pub mod errors;
pub mod scope;
pub mod types;
pub mod value;

pub use errors::{ErrorCode, ExitSignal, Flow, RuntimeError, ScriptError};
pub use scope::{ScopeArena, ScopeId};
pub use types::TypeTag;
pub use value::{Function, ModuleValue, NativeCallable, Value};

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::ast::{
    AssignmentStmt, BindingTarget, Expr, ExprKind, FunctionDecl, IfChain, ImportDecl, ImportList,
    Literal, Program, Stmt, StmtKind,
};
use crate::modules::{ModuleError, ModuleLoader};
use crate::stdlib;

/// Where `print` and friends deliver program output. The capture variant is
/// shared into nested module engines so one run collects one transcript.
#[derive(Clone)]
pub enum OutputSink {
    Stdout,
    Capture(Rc<RefCell<String>>),
}

impl OutputSink {
    fn write_line(&self, text: &str) {
        match self {
            OutputSink::Stdout => println!("{text}"),
            OutputSink::Capture(buffer) => {
                let mut buffer = buffer.borrow_mut();
                buffer.push_str(text);
                buffer.push('\n');
            }
        }
    }
}

//==============================================
// Section 1.0 - Engine State
//==============================================

/// One engine instance evaluates one module. A local import constructs a
/// fresh engine (own scope arena) over a loader that shares the in-flight
/// import stack, runs it to completion, and copies bindings out — blocking
/// and stack-nested, never scheduled.
pub struct Interpreter {
    scopes: ScopeArena,
    loader: ModuleLoader,
    debug: bool,
    out: OutputSink,
}

impl Interpreter {
    pub fn new(loader: ModuleLoader) -> Self {
        Self {
            scopes: ScopeArena::new(),
            loader,
            debug: false,
            out: OutputSink::Stdout,
        }
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn with_output(mut self, out: OutputSink) -> Self {
        self.out = out;
        self
    }

    /// Deliver one line of program output (primary stream, never stderr).
    pub fn write_out(&mut self, text: &str) {
        self.out.write_line(text);
    }

    fn debug_log(&self, message: &str) {
        if self.debug {
            eprintln!("[debug] {message}");
        }
    }

    /// Resolve a name from the module's global scope (the exported surface).
    pub fn global_lookup(&self, name: &str) -> Option<Value> {
        self.scopes.export(name)
    }

    //==============================================
    // Section 2.0 - Module Execution & Entry Point
    //==============================================

    /// Execute the top-level statements, then invoke `main` per the entry
    /// point contract.
    pub fn run_program(
        &mut self,
        program: &Program,
        script_args: &[String],
    ) -> Result<(), RuntimeError> {
        self.exec_module(program)?;
        self.invoke_entry_point(script_args)?;
        Ok(())
    }

    /// Walk the top-level statement list. Legal statements here: import,
    /// assignment, function definition. The first failing statement aborts
    /// the whole module run.
    pub fn exec_module(&mut self, program: &Program) -> Result<(), RuntimeError> {
        for statement in &program.statements {
            self.exec_top_statement(statement)
                .map_err(|error| self.wrap(error, statement.line))?;
        }
        Ok(())
    }

    fn exec_top_statement(&mut self, statement: &Stmt) -> Result<(), RuntimeError> {
        match &statement.kind {
            StmtKind::Import(decl) => self.exec_import(decl),
            StmtKind::Assignment(assign) => self.exec_assignment(assign, statement.line),
            StmtKind::FunctionDef(decl) => self.exec_function_def(decl, statement.line),
            other => Err(RuntimeError::UnexpectedStatement {
                context: "module top level",
                statement: other.describe(),
            }),
        }
    }

    /// In debug mode errors propagate unmodified for tooling; otherwise the
    /// innermost failing statement stamps its line exactly once.
    fn wrap(&self, error: RuntimeError, line: u32) -> RuntimeError {
        if self.debug {
            error
        } else {
            error.at_line(line)
        }
    }

    /// Look up `main` and invoke it: no arguments for a zero-parameter entry
    /// point, one `List` of the command-line arguments otherwise.
    pub fn invoke_entry_point(&mut self, script_args: &[String]) -> Result<Value, RuntimeError> {
        let main = self
            .scopes
            .lookup("main")
            .ok_or(RuntimeError::MissingEntryPoint)?;
        let function = match main {
            Value::Function(function) => function,
            other => {
                return Err(RuntimeError::EntryPoint(format!(
                    "entry point 'main' must be a function, found '{}'",
                    other.type_name()
                )));
            }
        };
        let args = match function.params.len() {
            0 => Vec::new(),
            1 => vec![Value::List(
                script_args
                    .iter()
                    .map(|arg| Value::String(arg.clone()))
                    .collect(),
            )],
            _ => {
                return Err(RuntimeError::EntryPoint(
                    "entry point 'main' must accept zero or one parameter".to_string(),
                ));
            }
        };
        self.debug_log("invoking entry point 'main'");
        self.call_function(&function, &args)
    }

    //==============================================
    // Section 3.0 - Statement Evaluation
    //==============================================

    fn exec_assignment(&mut self, assign: &AssignmentStmt, line: u32) -> Result<(), RuntimeError> {
        let value = self.eval(&assign.value)?;
        if let Some(annotation) = &assign.declared_type {
            let expected = types::resolve_annotation(annotation)?;
            if value.tag() != expected {
                return Err(RuntimeError::TypeMismatch {
                    found: value.type_name(),
                    expected: expected.name(),
                });
            }
        }
        let target = match assign.target {
            BindingTarget::Let => self.scopes.active(),
            BindingTarget::Put => ScopeId::GLOBAL,
        };
        self.warn_if_shadowing(&assign.name, line);
        self.scopes.bind(target, &assign.name, value, assign.constant)
    }

    fn exec_function_def(&mut self, decl: &FunctionDecl, line: u32) -> Result<(), RuntimeError> {
        let function = Value::Function(Rc::new(Function::from_decl(decl)?));
        self.warn_if_shadowing(&decl.name, line);
        let target = self.scopes.active();
        self.scopes.bind(target, &decl.name, function, false)
    }

    /// Shadowing is allowed but flagged on the diagnostics stream.
    fn warn_if_shadowing(&self, name: &str, line: u32) {
        if self.scopes.is_visible(name) {
            eprintln!("WARNING:{line}: binding '{name}' shadows an existing binding");
        }
    }

    /// Statement list of a function body or nested block. Exit signals pass
    /// through unwrapped; errors are stamped with the failing statement.
    fn exec_body(&mut self, statements: &[Stmt], function: &Function) -> Result<Flow, RuntimeError> {
        for statement in statements {
            match self.exec_body_statement(statement, function) {
                Ok(Flow::Normal) => {}
                Ok(exit) => return Ok(exit),
                Err(error) => return Err(self.wrap(error, statement.line)),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_body_statement(
        &mut self,
        statement: &Stmt,
        function: &Function,
    ) -> Result<Flow, RuntimeError> {
        match &statement.kind {
            StmtKind::Assignment(assign) => {
                self.exec_assignment(assign, statement.line)?;
                Ok(Flow::Normal)
            }
            StmtKind::Reassignment { name, value } => {
                let value = self.eval(value)?;
                self.scopes.reassign(name, value)?;
                Ok(Flow::Normal)
            }
            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Void,
                };
                match function.return_type.get() {
                    // First executed return fixes the function's return type.
                    None => function.return_type.set(Some(value.tag())),
                    Some(expected) if expected != value.tag() => {
                        return Err(RuntimeError::TypeMismatch {
                            found: value.type_name(),
                            expected: expected.name(),
                        });
                    }
                    Some(_) => {}
                }
                Ok(Flow::Exit(ExitSignal::Return(value)))
            }
            StmtKind::Break => Ok(Flow::Exit(ExitSignal::Break)),
            StmtKind::Continue => Ok(Flow::Exit(ExitSignal::Continue)),
            StmtKind::Expression(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            StmtKind::If(chain) => self.exec_if_chain(chain, function),
            // `for` parses but no loop construct executes in this language
            // version; imports and nested function definitions are equally
            // illegal inside a body.
            other => Err(RuntimeError::UnexpectedStatement {
                context: "function body",
                statement: other.describe(),
            }),
        }
    }

    /// Short-circuiting `if`/`elseif`*/`else?` chain; each taken branch body
    /// runs in its own child scope, discarded on exit.
    fn exec_if_chain(&mut self, chain: &IfChain, function: &Function) -> Result<Flow, RuntimeError> {
        for branch in &chain.branches {
            let taken = match self.eval(&branch.condition)? {
                Value::Boolean(taken) => taken,
                other => {
                    return Err(RuntimeError::TypeMismatch {
                        found: other.type_name(),
                        expected: "Boolean",
                    });
                }
            };
            if taken {
                return self.in_child_scope(|engine| engine.exec_body(&branch.body, function));
            }
        }
        if let Some(body) = &chain.else_body {
            return self.in_child_scope(|engine| engine.exec_body(body, function));
        }
        Ok(Flow::Normal)
    }

    /// Scoped acquisition: the child scope is popped on every exit path.
    fn in_child_scope<T>(
        &mut self,
        run: impl FnOnce(&mut Self) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        self.scopes.push_child();
        let result = run(self);
        self.scopes.pop()?;
        result
    }

    //==============================================
    // Section 4.0 - Expression Evaluation
    //==============================================

    pub fn eval(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match &expr.kind {
            ExprKind::Identifier(name) => self
                .scopes
                .lookup(name)
                .ok_or_else(|| RuntimeError::VariableNotFound(name.clone())),
            ExprKind::Attribute { object, name } => {
                let object = self.eval(object)?;
                object.attribute(name)
            }
            ExprKind::Literal(literal) => Ok(match literal {
                Literal::Integer(n) => Value::Integer(*n),
                Literal::Str(text) => Value::String(text.clone()),
                Literal::Boolean(flag) => Value::Boolean(*flag),
                Literal::Nil => Value::Void,
            }),
            ExprKind::ListLiteral(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element)?);
                }
                Value::list_from(values)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                value::apply_binary(*op, &lhs, &rhs)
            }
            ExprKind::Ternary {
                condition,
                when_true,
                when_false,
            } => {
                let taken = match self.eval(condition)? {
                    Value::Boolean(taken) => taken,
                    other => {
                        return Err(RuntimeError::TypeMismatch {
                            found: other.type_name(),
                            expected: "Boolean",
                        });
                    }
                };
                // Both branches evaluate regardless of the condition, and
                // must agree on their variant.
                let when_true = self.eval(when_true)?;
                let when_false = self.eval(when_false)?;
                if when_false.tag() != when_true.tag() {
                    return Err(RuntimeError::TypeMismatch {
                        found: when_false.type_name(),
                        expected: when_true.type_name(),
                    });
                }
                Ok(if taken { when_true } else { when_false })
            }
            ExprKind::NilCoalesce { lhs, rhs } => {
                // No short-circuit: the discarded operand still evaluates.
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                Ok(if matches!(lhs, Value::Void) { rhs } else { lhs })
            }
            ExprKind::Cast { value, target } => {
                let value = self.eval(value)?;
                let target = types::resolve_annotation(target)?;
                value::cast(&value, target)
            }
            ExprKind::Call { callee, args } => {
                let callee = self.eval(callee)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval(arg)?);
                }
                self.call_value(&callee, &arg_values)
            }
            ExprKind::Lambda { params, body } => Ok(Value::Function(Rc::new(Function::lambda(
                params.clone(),
                (**body).clone(),
            )))),
        }
    }

    //==============================================
    // Section 5.0 - Call Protocol
    //==============================================

    /// Invoke anything with the call capability; everything else fails with
    /// the capability error.
    pub fn call_value(&mut self, callee: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(function) => self.call_function(function, args),
            Value::Native(NativeCallable::EngineAware { func, name }) => {
                self.debug_log(&format!("calling native '{name}'"));
                func(args, self)
            }
            Value::Native(NativeCallable::Plain { func, name }) => {
                self.debug_log(&format!("calling native '{name}'"));
                func(args)
            }
            other => Err(RuntimeError::OperatorNotApplicable {
                operator: "()",
                operand: other.type_name(),
            }),
        }
    }

    /// The function call protocol: arity checks before any parameter binds,
    /// a fresh child scope parented on the scope active at the call site,
    /// type-checked mutable parameter bindings, then the body runs until its
    /// return signal.
    pub fn call_function(
        &mut self,
        function: &Rc<Function>,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        if args.len() < function.params.len() {
            return Err(RuntimeError::NotEnoughArguments);
        }
        if args.len() > function.params.len() {
            return Err(RuntimeError::TooManyArguments);
        }
        let function = Rc::clone(function);
        self.debug_log(&format!(
            "calling '{}' at scope depth {}",
            function.name,
            self.scopes.depth()
        ));
        self.in_child_scope(move |engine| {
            for (param, value) in function.params.iter().zip(args) {
                let expected = types::resolve_annotation(&param.declared_type)?;
                if value.tag() != expected {
                    return Err(RuntimeError::TypeMismatch {
                        found: value.type_name(),
                        expected: expected.name(),
                    });
                }
                let scope = engine.scopes.active();
                engine.scopes.bind(scope, &param.name, value.clone(), false)?;
            }
            match engine.exec_body(&function.body, &function)? {
                Flow::Exit(ExitSignal::Return(value)) => Ok(value),
                // Nothing consumes break/continue in this language version.
                Flow::Exit(signal) => Err(RuntimeError::StrayExit {
                    signal: signal.keyword(),
                }),
                Flow::Normal => Err(RuntimeError::Panic(
                    "function body finished without a return signal".to_string(),
                )),
            }
        })
    }

    //==============================================
    // Section 6.0 - Import Execution
    //==============================================

    fn exec_import(&mut self, decl: &ImportDecl) -> Result<(), RuntimeError> {
        if decl.source.is_std() {
            self.exec_std_import(decl)
        } else {
            self.exec_local_import(decl)
        }
    }

    /// Reserved-namespace import: a sibling script under the dotted path
    /// wins; otherwise the path names a natively supplied module.
    fn exec_std_import(&mut self, decl: &ImportDecl) -> Result<(), RuntimeError> {
        if let Ok(path) = self.loader.resolve(&decl.source) {
            return self.import_script_module(decl, &path);
        }
        let module_name = decl.source.dotted();
        let Some(exports) = stdlib::native_module(&module_name) else {
            return Err(ModuleError::NotFound {
                module: module_name,
            }
            .into());
        };
        self.debug_log(&format!("importing native module '{module_name}'"));
        match &decl.names {
            ImportList::Glob => {
                let mut names: Vec<&String> = exports.keys().collect();
                names.sort();
                for name in names {
                    let value = exports[name].clone();
                    self.bind_import(name, value)?;
                }
                Ok(())
            }
            ImportList::Names(names) => {
                for name in names {
                    let value =
                        exports
                            .get(name)
                            .cloned()
                            .ok_or_else(|| ModuleError::MissingExport {
                                name: name.clone(),
                                module: module_name.clone(),
                            })?;
                    self.bind_import(name, value)?;
                }
                Ok(())
            }
        }
    }

    /// Local import: resolve the sibling `.vi` file and recursively run it
    /// through a whole engine before the importing statement continues.
    fn exec_local_import(&mut self, decl: &ImportDecl) -> Result<(), RuntimeError> {
        let path = self.loader.resolve(&decl.source)?;
        self.import_script_module(decl, &path)
    }

    fn import_script_module(&mut self, decl: &ImportDecl, path: &Path) -> Result<(), RuntimeError> {
        let module_name = decl.source.dotted();
        let guard = self.loader.begin(path, &module_name)?;
        let program = self.loader.load_program(path)?;

        let module_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut module_engine =
            Interpreter::new(self.loader.for_module(module_dir)).with_output(self.out.clone());
        module_engine.set_debug(self.debug);
        self.debug_log(&format!(
            "running module '{module_name}' from {}",
            path.display()
        ));
        module_engine.exec_module(&program)?;
        drop(guard);

        match &decl.names {
            ImportList::Glob => {
                for (name, value) in module_engine.scopes.exported_bindings() {
                    self.bind_import(&name, value)?;
                }
                Ok(())
            }
            ImportList::Names(names) => {
                for name in names {
                    let value = module_engine.scopes.export(name).ok_or_else(|| {
                        ModuleError::MissingExport {
                            name: name.clone(),
                            module: module_name.clone(),
                        }
                    })?;
                    self.bind_import(name, value)?;
                }
                Ok(())
            }
        }
    }

    /// Imported bindings land in the importer's current scope, mutable and
    /// without shadow warnings.
    fn bind_import(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let target = self.scopes.active();
        self.scopes.bind(target, name, value, false)
    }
}

//==============================================
// End of file
//==============================================
