//! Sandboxed script execution
//!
//! [`Executor::execute`] compiles a script, runs it against a private copy of
//! the working dataset and returns every recorded step, the captured console
//! output and, if the run failed, a normalized [`ExecutionError`]. Nothing
//! the script does can panic the caller or mutate the caller's data.
//!
//! The interpreter runs on a dedicated thread with a large stack so that
//! deeply recursive scripts hit the call-depth limit rather than the native
//! stack; the call still blocks until the run is over.

use std::time::Instant;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::interpreter::constants::{
    DEFAULT_MAX_ARRAY_LEN, DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_NESTING_DEPTH,
    DEFAULT_MAX_STRING_LEN, DEFAULT_OPERATION_BUDGET, DEFAULT_STEP_LIMIT,
};
use crate::interpreter::{Interpreter, RuntimeError};
use crate::parser::ast::SourceLocation;
use crate::parser::{parse, ParseError};
use crate::snapshot::{StepSequence, MAX_LOG_LINES};

/// Shown when a run succeeds without recording anything
pub const EMPTY_RESULT_MESSAGE: &str =
    "Code executed but no 'snapshot()' calls were made.";

/// Resource limits of one sandboxed run (`[execution]` config section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Most `snapshot` calls per run (default: 1000)
    #[serde(default = "default_step_limit")]
    pub step_limit: usize,
    /// Most statements, loop iterations and calls per run (default: 5,000,000)
    #[serde(default = "default_operation_budget")]
    pub operation_budget: u64,
    /// Deepest allowed nesting of function calls (default: 256)
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
    /// Longest array a script may build (default: 100,000)
    #[serde(default = "default_max_array_len")]
    pub max_array_len: usize,
    /// Longest string a script may build, in bytes (default: 1,000,000)
    #[serde(default = "default_max_string_len")]
    pub max_string_len: usize,
    /// Deepest nesting of expressions and statements while evaluating (default: 2000)
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
    /// Console lines kept per run (default: 1000)
    #[serde(default = "default_max_log_lines")]
    pub max_log_lines: usize,
    /// Native stack of the sandbox thread in bytes (default: 64 MiB)
    #[serde(default = "default_stack_size")]
    pub stack_size: usize,
}

fn default_step_limit() -> usize {
    DEFAULT_STEP_LIMIT
}
fn default_operation_budget() -> u64 {
    DEFAULT_OPERATION_BUDGET
}
fn default_max_call_depth() -> usize {
    DEFAULT_MAX_CALL_DEPTH
}
fn default_max_array_len() -> usize {
    DEFAULT_MAX_ARRAY_LEN
}
fn default_max_string_len() -> usize {
    DEFAULT_MAX_STRING_LEN
}
fn default_max_nesting_depth() -> usize {
    DEFAULT_MAX_NESTING_DEPTH
}
fn default_max_log_lines() -> usize {
    MAX_LOG_LINES
}
fn default_stack_size() -> usize {
    64 * 1024 * 1024
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            step_limit: default_step_limit(),
            operation_budget: default_operation_budget(),
            max_call_depth: default_max_call_depth(),
            max_array_len: default_max_array_len(),
            max_string_len: default_max_string_len(),
            max_nesting_depth: default_max_nesting_depth(),
            max_log_lines: default_max_log_lines(),
            stack_size: default_stack_size(),
        }
    }
}

/// Why a run produced no steps
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    /// The script failed to lex or parse
    #[error(transparent)]
    Compile(#[from] ParseError),

    /// The script raised an error while running
    #[error(transparent)]
    Runtime(RuntimeError),

    /// The script called `snapshot` more than the step ceiling allows
    #[error("Step limit exceeded (infinite loop protection)")]
    StepLimitExceeded {
        limit: usize,
        location: SourceLocation,
    },

    /// The sandbox itself failed
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RuntimeError> for ExecutionError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::StepLimitExceeded { limit, location } => {
                ExecutionError::StepLimitExceeded { limit, location }
            }
            other => ExecutionError::Runtime(other),
        }
    }
}

impl ExecutionError {
    /// Source position the error points at, if any
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            ExecutionError::Compile(err) => Some(err.location),
            ExecutionError::Runtime(err) => Some(err.location()),
            ExecutionError::StepLimitExceeded { location, .. } => Some(*location),
            ExecutionError::Internal(_) => None,
        }
    }
}

/// Everything one run produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionOutcome {
    /// Recorded steps; always empty when `error` is set
    pub steps: StepSequence,
    /// Console lines captured before the run ended
    pub logs: Vec<String>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<ExecutionError>,
}

fn serialize_error<S: Serializer>(
    error: &Option<ExecutionError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

/// How the front-end should present an outcome
#[derive(Debug, Clone, Copy)]
pub enum RunStatus<'a> {
    /// The run recorded this many steps
    Ready(usize),
    /// The run succeeded but never called `snapshot`
    Empty,
    Failed(&'a ExecutionError),
}

impl ExecutionOutcome {
    fn failed(error: ExecutionError, logs: Vec<String>) -> Self {
        ExecutionOutcome {
            steps: StepSequence::new(),
            logs,
            error: Some(error),
        }
    }

    pub fn result(&self) -> Result<&StepSequence, &ExecutionError> {
        match &self.error {
            Some(err) => Err(err),
            None => Ok(&self.steps),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn status(&self) -> RunStatus<'_> {
        match &self.error {
            Some(err) => RunStatus::Failed(err),
            None if self.steps.is_empty() => RunStatus::Empty,
            None => RunStatus::Ready(self.steps.len()),
        }
    }
}

/// Runs scripts with a fixed set of limits
#[derive(Debug, Clone, Default)]
pub struct Executor {
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        Executor { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run `source` against a copy of `data`
    pub fn execute(&self, source: &str, data: &[f64]) -> ExecutionOutcome {
        debug!(
            source_len = source.len(),
            data_len = data.len(),
            "executing script"
        );
        let started = Instant::now();

        let outcome = self.run_sandboxed(source, data);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome.error {
            None => info!(
                steps = outcome.steps.len(),
                logs = outcome.logs.len(),
                elapsed_ms,
                "script finished"
            ),
            Some(err) => warn!(
                error = %err,
                logs = outcome.logs.len(),
                elapsed_ms,
                "script failed"
            ),
        }
        outcome
    }

    fn run_sandboxed(&self, source: &str, data: &[f64]) -> ExecutionOutcome {
        let config = &self.config;
        std::thread::scope(|scope| {
            let spawned = std::thread::Builder::new()
                .name("sandbox".to_string())
                .stack_size(config.stack_size)
                .spawn_scoped(scope, move || run_script(config, source, data));

            match spawned {
                Ok(handle) => handle.join().unwrap_or_else(|_| {
                    ExecutionOutcome::failed(
                        ExecutionError::Internal("the interpreter panicked".to_string()),
                        Vec::new(),
                    )
                }),
                Err(err) => {
                    warn!(error = %err, "could not spawn sandbox thread, running inline");
                    run_script(config, source, data)
                }
            }
        })
    }
}

/// Run `source` with the default limits
pub fn execute(source: &str, data: &[f64]) -> ExecutionOutcome {
    Executor::default().execute(source, data)
}

fn run_script(config: &ExecutorConfig, source: &str, data: &[f64]) -> ExecutionOutcome {
    let program = match parse(source) {
        Ok(program) => program,
        Err(err) => return ExecutionOutcome::failed(err.into(), Vec::new()),
    };
    debug!(
        statements = program.nodes.len(),
        functions = program.function_names().count(),
        "script parsed"
    );

    let mut interpreter = Interpreter::new(config, data);
    let result = interpreter.run(&program);
    let console = interpreter.take_console();
    if console.dropped() > 0 {
        debug!(dropped = console.dropped(), "console output truncated");
    }
    let logs = console.get_output();

    match result {
        Ok(()) => ExecutionOutcome {
            steps: interpreter.take_steps(),
            logs,
            error: None,
        },
        Err(err) => {
            debug!(operations = interpreter.operations(), "run aborted");
            ExecutionOutcome::failed(err.into(), logs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sort_is_empty() {
        let outcome = execute("let x = 1;", &[1.0, 2.0]);
        assert!(outcome.is_success());
        assert!(matches!(outcome.status(), RunStatus::Empty));
    }

    #[test]
    fn test_syntax_error_is_compile_error() {
        let outcome = execute("function sort(data, snapshot) {", &[1.0]);
        let err = outcome.result().unwrap_err();
        assert!(matches!(err, ExecutionError::Compile(_)));
        assert!(!err.to_string().is_empty());
        assert!(outcome.steps.is_empty());
    }

    #[test]
    fn test_runtime_failure_keeps_logs_and_drops_steps() {
        let outcome = execute(
            "function sort(data, snapshot) {\n\
               snapshot(data);\n\
               console.log('about to fail');\n\
               undefinedThing();\n\
             }",
            &[1.0],
        );
        assert!(outcome.steps.is_empty());
        assert_eq!(outcome.logs, vec!["about to fail"]);
        let err = outcome.error.as_ref().unwrap();
        assert_eq!(err.location().map(|loc| loc.line), Some(4));
        assert!(matches!(err, ExecutionError::Runtime(RuntimeError::UndefinedVariable { .. })));
    }

    #[test]
    fn test_step_limit_is_its_own_variant() {
        let executor = Executor::new(ExecutorConfig {
            step_limit: 5,
            ..ExecutorConfig::default()
        });
        let outcome = executor.execute("while (true) snapshot(data);", &[1.0]);
        assert!(matches!(
            outcome.error,
            Some(ExecutionError::StepLimitExceeded { limit: 5, .. })
        ));
        assert_eq!(
            outcome.error.unwrap().to_string(),
            "Step limit exceeded (infinite loop protection)"
        );
    }

    #[test]
    fn test_outcome_serializes() {
        let outcome = execute("snapshot([3, 1], [1], 'x');", &[]);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["steps"][0]["highlights"][0], 1);
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ExecutorConfig = toml::from_str("step_limit = 50").unwrap();
        assert_eq!(config.step_limit, 50);
        assert_eq!(config.operation_budget, DEFAULT_OPERATION_BUDGET);
    }
}
