// Execution engine for the sort-script interpreter

use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::executor::ExecutorConfig;
use crate::interpreter::constants::{CAPTURED_SCOPE_PRUNE_THRESHOLD, MAX_STRINGIFY_DEPTH};
use crate::interpreter::errors::RuntimeError;
use crate::memory::scope::{AssignError, Scope, ScopeKind};
use crate::memory::value::{Builtin, Closure, Namespace, StringifyError, Value};
use crate::parser::ast::*;
use crate::snapshot::{Console, StepRecorder, StepSequence};

/// Pending non-local jump out of the statement being executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlFlow {
    Normal,
    Break,
    Continue,
    Return,
}

/// Tree-walking interpreter for one sandboxed run.
///
/// The script sees exactly three names of its own: `data` (a copy of the
/// input), `snapshot` and `console`. The small standard library (`Math`,
/// `Number`, `parseInt`, ...) lives in an outer host scope the script may
/// shadow.
pub struct Interpreter {
    /// Scope holding the standard library
    host: Rc<Scope>,

    /// Top-level scope of the script; `sort` is looked up here after the run
    globals: Rc<Scope>,

    /// Innermost scope of the code being executed
    pub(crate) scope: Rc<Scope>,

    pub(crate) control_flow: ControlFlow,

    /// Value carried by a pending `return`
    pub(crate) return_value: Value,

    /// Location of the statement being executed
    pub(crate) current_location: SourceLocation,

    pub(crate) recorder: StepRecorder,
    pub(crate) console: Console,

    operations: u64,
    operation_budget: u64,
    call_depth: usize,
    max_call_depth: usize,
    pub(crate) max_array_len: usize,
    max_string_len: usize,
    /// Expressions and statements currently being evaluated
    nesting: usize,
    max_nesting: usize,

    /// Environments captured by closures, cleared on drop to break cycles
    captured_scopes: Vec<Weak<Scope>>,
    prune_at: usize,
}

impl Interpreter {
    /// Create an interpreter whose `data` is a fresh copy of `data`
    pub fn new(config: &ExecutorConfig, data: &[f64]) -> Self {
        let host = Scope::global();
        install_host_library(&host);

        let globals = Scope::child(&host, ScopeKind::Function);
        let working_copy = data.iter().copied().map(Value::Number).collect();
        globals.declare("data", Value::array(working_copy), true);
        globals.declare("snapshot", Value::Builtin(Builtin::Snapshot), true);
        globals.declare("console", Value::Namespace(Namespace::Console), true);

        Interpreter {
            host,
            scope: Rc::clone(&globals),
            globals,
            control_flow: ControlFlow::Normal,
            return_value: Value::Undefined,
            current_location: SourceLocation::new(1, 1),
            recorder: StepRecorder::new(config.step_limit),
            console: Console::with_capacity(config.max_log_lines),
            operations: 0,
            operation_budget: config.operation_budget,
            call_depth: 0,
            max_call_depth: config.max_call_depth,
            max_array_len: config.max_array_len,
            max_string_len: config.max_string_len,
            nesting: 0,
            max_nesting: config.max_nesting_depth,
            captured_scopes: Vec::new(),
            prune_at: CAPTURED_SCOPE_PRUNE_THRESHOLD,
        }
    }

    /// Run the script's top level, then call `sort(data, snapshot)` if the
    /// script defined a function of that name.
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        let globals = Rc::clone(&self.globals);
        self.hoist_vars(&program.nodes, &globals);
        self.hoist_functions(&program.nodes);

        for stmt in &program.nodes {
            self.execute_statement(stmt)?;
            if self.control_flow == ControlFlow::Return {
                debug!("top-level return, skipping the sort call");
                self.control_flow = ControlFlow::Normal;
                return Ok(());
            }
        }

        let Some(sort) = self.globals.get_own("sort") else {
            debug!("no `sort` defined at top level");
            return Ok(());
        };
        if !sort.is_callable() {
            debug!(kind = sort.type_of(), "`sort` is not a function, skipping");
            return Ok(());
        }

        let data = self.globals.lookup("data").unwrap_or_default();
        let snapshot = Value::Builtin(Builtin::Snapshot);
        let location = match &sort {
            Value::Function(closure) => closure.def.location,
            _ => self.current_location,
        };
        self.call_value(&sort, "sort", vec![data, snapshot], location)?;
        Ok(())
    }

    /// Steps recorded so far; leaves the recorder empty
    pub fn take_steps(&mut self) -> StepSequence {
        let limit = self.recorder.limit();
        std::mem::replace(&mut self.recorder, StepRecorder::new(limit)).finish()
    }

    /// Console output captured so far; leaves the console empty
    pub fn take_console(&mut self) -> Console {
        let capacity = self.console.capacity();
        std::mem::replace(&mut self.console, Console::with_capacity(capacity))
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Number of operations charged against the budget so far
    pub fn operations(&self) -> u64 {
        self.operations
    }

    // ===== Resource accounting =====

    /// Charge one operation (statement, loop iteration or call)
    pub(crate) fn tick(&mut self) -> Result<(), RuntimeError> {
        self.operations += 1;
        if self.operations > self.operation_budget {
            return Err(RuntimeError::OperationBudgetExceeded {
                limit: self.operation_budget,
                location: self.current_location,
            });
        }
        Ok(())
    }

    /// Fail if an array would grow to `length` elements
    pub(crate) fn check_array_len(
        &self,
        length: usize,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        if length > self.max_array_len {
            return Err(RuntimeError::ArrayTooLarge {
                length,
                limit: self.max_array_len,
                location,
            });
        }
        Ok(())
    }

    /// Fail if a string would grow to `length` bytes
    pub(crate) fn check_string_len(
        &self,
        length: usize,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        if length > self.max_string_len {
            return Err(RuntimeError::StringTooLong {
                limit: self.max_string_len,
                location,
            });
        }
        Ok(())
    }

    /// `ToString` of a script value, bounded by the string length limit
    pub(crate) fn stringify(
        &self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<String, RuntimeError> {
        value
            .to_js_string_within(self.max_string_len)
            .map_err(|err| match err {
                StringifyError::TooLong => RuntimeError::StringTooLong {
                    limit: self.max_string_len,
                    location,
                },
                StringifyError::TooDeep => RuntimeError::NestingTooDeep {
                    limit: MAX_STRINGIFY_DEPTH,
                    location,
                },
            })
    }

    /// Run `f` one evaluation level deeper, failing past the nesting limit
    pub(crate) fn nested<T>(
        &mut self,
        location: SourceLocation,
        f: impl FnOnce(&mut Self) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        if self.nesting >= self.max_nesting {
            return Err(RuntimeError::NestingTooDeep {
                limit: self.max_nesting,
                location,
            });
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    // ===== Scopes =====

    /// Run `f` with `scope` as the innermost scope, restoring the old one
    pub(crate) fn with_scope<T>(
        &mut self,
        scope: Rc<Scope>,
        f: impl FnOnce(&mut Self) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        let saved = std::mem::replace(&mut self.scope, scope);
        let result = f(self);
        self.scope = saved;
        result
    }

    /// Execute `body` in a fresh block scope
    pub(crate) fn execute_block(
        &mut self,
        body: &[AstNode],
    ) -> Result<(), RuntimeError> {
        let block = Scope::child(&self.scope, ScopeKind::Block);
        self.with_scope(block, |interp| {
            interp.hoist_functions(body);
            interp.execute_statements(body)
        })
    }

    /// Execute statements until one of them leaves a pending jump
    pub(crate) fn execute_statements(
        &mut self,
        body: &[AstNode],
    ) -> Result<(), RuntimeError> {
        for stmt in body {
            self.execute_statement(stmt)?;
            if self.control_flow != ControlFlow::Normal {
                break;
            }
        }
        Ok(())
    }

    /// Bind every function declared directly in `body` in the current scope
    pub(crate) fn hoist_functions(&mut self, body: &[AstNode]) {
        for node in body {
            if let AstNode::FunctionDecl { def, .. } = node {
                let closure = self.make_closure(def);
                if let Some(name) = &def.name {
                    self.scope.define(name, closure);
                }
            }
        }
    }

    /// Bind `undefined` for every `var` in `body` (nested blocks included,
    /// nested functions excluded) that `scope` doesn't already have
    pub(crate) fn hoist_vars(&mut self, body: &[AstNode], scope: &Rc<Scope>) {
        for node in body {
            match node {
                AstNode::VarDecl {
                    kind: DeclKind::Var,
                    declarators,
                    ..
                } => {
                    for declarator in declarators {
                        if !scope.has_own(&declarator.name) {
                            scope.define(&declarator.name, Value::Undefined);
                        }
                    }
                }
                AstNode::Block { body, .. }
                | AstNode::While { body, .. }
                | AstNode::DoWhile { body, .. } => self.hoist_vars(body, scope),
                AstNode::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    self.hoist_vars(then_branch, scope);
                    if let Some(else_branch) = else_branch {
                        self.hoist_vars(else_branch, scope);
                    }
                }
                AstNode::For { init, body, .. } => {
                    if let Some(init) = init {
                        self.hoist_vars(std::slice::from_ref(&**init), scope);
                    }
                    self.hoist_vars(body, scope);
                }
                _ => {}
            }
        }
    }

    // ===== Variables =====

    pub(crate) fn lookup_variable(
        &self,
        name: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        self.scope
            .lookup(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                name: name.to_string(),
                location,
            })
    }

    pub(crate) fn assign_variable(
        &self,
        name: &str,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        self.scope.assign(name, value).map_err(|err| match err {
            AssignError::Undeclared => RuntimeError::UndefinedVariable {
                name: name.to_string(),
                location,
            },
            AssignError::Constant => RuntimeError::ConstAssignment {
                name: name.to_string(),
                location,
            },
        })
    }

    // ===== Functions =====

    /// Create a closure over the current scope
    pub(crate) fn make_closure(&mut self, def: &Rc<FunctionDef>) -> Value {
        let env = Rc::clone(&self.scope);
        self.track_captured_scope(&env);
        Value::Function(Rc::new(Closure {
            def: Rc::clone(def),
            env,
        }))
    }

    fn track_captured_scope(&mut self, scope: &Rc<Scope>) {
        if self
            .captured_scopes
            .last()
            .is_some_and(|last| last.as_ptr() == Rc::as_ptr(scope))
        {
            return;
        }
        self.captured_scopes.push(Rc::downgrade(scope));
        if self.captured_scopes.len() >= self.prune_at {
            self.captured_scopes.retain(|weak| weak.strong_count() > 0);
            self.prune_at =
                CAPTURED_SCOPE_PRUNE_THRESHOLD.max(self.captured_scopes.len() * 2);
        }
    }

    /// Call any callable value. `callee` describes the callee expression for
    /// error messages.
    pub(crate) fn call_value(
        &mut self,
        function: &Value,
        callee: &str,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match function {
            Value::Function(closure) => {
                self.call_closure(closure, args, location)
            }
            Value::Builtin(builtin) => {
                self.call_builtin(*builtin, args, location)
            }
            Value::Method(bound) => self.call_method(
                &bound.receiver,
                bound.method,
                args,
                location,
            ),
            _ => Err(RuntimeError::NotCallable {
                callee: callee.to_string(),
                location,
            }),
        }
    }

    fn call_closure(
        &mut self,
        closure: &Rc<Closure>,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded {
                limit: self.max_call_depth,
                location,
            });
        }
        self.tick()?;
        trace!(function = closure.def.display_name(), "call");

        let frame = Scope::child(&closure.env, ScopeKind::Function);
        let mut args = args.into_iter();
        for param in &closure.def.params {
            frame.define(param, args.next().unwrap_or_default());
        }

        let saved_location = self.current_location;
        self.call_depth += 1;
        let result = self.with_scope(frame, |interp| match &closure.def.body {
            FunctionBody::Expr(expr) => interp.evaluate_expr(expr),
            FunctionBody::Block(body) => {
                let frame = Rc::clone(&interp.scope);
                interp.hoist_vars(body, &frame);
                interp.hoist_functions(body);
                interp.execute_statements(body)?;
                if interp.control_flow == ControlFlow::Return {
                    interp.control_flow = ControlFlow::Normal;
                    Ok(std::mem::take(&mut interp.return_value))
                } else {
                    Ok(Value::Undefined)
                }
            }
        });
        self.call_depth -= 1;
        self.current_location = saved_location;
        result
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        for weak in self.captured_scopes.drain(..) {
            if let Some(scope) = weak.upgrade() {
                scope.clear_chain();
            }
        }
        self.scope.clear_chain();
        self.globals.clear_chain();
        self.host.clear_chain();
    }
}

/// Bind the standard library names in the host scope
fn install_host_library(host: &Rc<Scope>) {
    let entries = [
        ("Math", Value::Namespace(Namespace::Math)),
        ("Array", Value::Namespace(Namespace::Array)),
        ("Number", Value::Builtin(Builtin::Number)),
        ("String", Value::Builtin(Builtin::String)),
        ("Boolean", Value::Builtin(Builtin::Boolean)),
        ("parseInt", Value::Builtin(Builtin::ParseInt)),
        ("parseFloat", Value::Builtin(Builtin::ParseFloat)),
        ("isNaN", Value::Builtin(Builtin::IsNaN)),
        ("Error", Value::Builtin(Builtin::Error)),
        ("Infinity", Value::Number(f64::INFINITY)),
        ("NaN", Value::Number(f64::NAN)),
        ("undefined", Value::Undefined),
    ];
    for (name, value) in entries {
        host.declare(name, value, true);
    }
}
