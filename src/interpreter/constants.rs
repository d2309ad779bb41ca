// Default resource limits for sandboxed runs

/// Maximum number of `snapshot` calls per run
pub const DEFAULT_STEP_LIMIT: usize = 1_000;

/// Maximum number of executed statements, loop iterations and calls per run
pub const DEFAULT_OPERATION_BUDGET: u64 = 5_000_000;

/// Maximum nesting of user function calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Maximum length of any array a script builds
pub const DEFAULT_MAX_ARRAY_LEN: usize = 100_000;

/// Closure environments tracked before dead entries are pruned
pub const CAPTURED_SCOPE_PRUNE_THRESHOLD: usize = 1_024;

/// Longest string a script may build, in bytes
pub const DEFAULT_MAX_STRING_LEN: usize = 1_000_000;

/// Deepest nesting of expressions and statements during evaluation
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 2_000;

/// Deepest array nesting that is converted to a string
pub const MAX_STRINGIFY_DEPTH: usize = 256;
