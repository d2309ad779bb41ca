//! Runtime error types for the sort-script interpreter
//!
//! This module defines [`RuntimeError`], which represents all errors that can occur
//! during program execution (as opposed to parse errors or host errors).
//!
//! All runtime errors are fatal: there is no `try`/`catch`, so the first error
//! unwinds the whole run. Messages are the bare error text; the source line
//! travels separately in [`RuntimeError::location`].

use crate::parser::ast::SourceLocation;
use thiserror::Error;

/// Runtime errors that can occur during execution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Reference to a name with no binding
    #[error("ReferenceError: {name} is not defined")]
    UndefinedVariable {
        name: String,
        location: SourceLocation,
    },

    /// Call of a value that is not a function
    #[error("TypeError: {callee} is not a function")]
    NotCallable {
        callee: String,
        location: SourceLocation,
    },

    /// Operation applied to a value of the wrong type
    #[error("TypeError: {message}")]
    TypeError {
        message: String,
        location: SourceLocation,
    },

    /// Assignment to a `const` binding
    #[error("TypeError: Assignment to constant variable '{name}'")]
    ConstAssignment {
        name: String,
        location: SourceLocation,
    },

    /// Second `let`/`const` of the same name in one scope
    #[error("SyntaxError: Identifier '{name}' has already been declared")]
    AlreadyDeclared {
        name: String,
        location: SourceLocation,
    },

    /// Left-hand side that cannot be written to
    #[error("Invalid assignment target")]
    InvalidAssignmentTarget { location: SourceLocation },

    /// Bad argument passed to a built-in function
    #[error("{function}: {message}")]
    ArgumentError {
        function: String,
        message: String,
        location: SourceLocation,
    },

    /// Recursion deeper than the configured call depth
    #[error("RangeError: Maximum call stack size exceeded ({limit} calls)")]
    CallDepthExceeded {
        limit: usize,
        location: SourceLocation,
    },

    /// Too many statements or loop iterations
    #[error("Operation budget of {limit} exceeded (infinite loop protection)")]
    OperationBudgetExceeded {
        limit: u64,
        location: SourceLocation,
    },

    /// Array grown past the configured maximum length
    #[error("RangeError: Array length {length} exceeds the limit of {limit}")]
    ArrayTooLarge {
        length: usize,
        limit: usize,
        location: SourceLocation,
    },

    /// String grown past the configured maximum length
    #[error("RangeError: Invalid string length (limit {limit})")]
    StringTooLong {
        limit: usize,
        location: SourceLocation,
    },

    /// Expressions nested deeper than the evaluator allows
    #[error("RangeError: Expression nesting exceeds {limit} levels")]
    NestingTooDeep {
        limit: usize,
        location: SourceLocation,
    },

    /// More `snapshot` calls than the step ceiling allows
    #[error("Step limit exceeded (infinite loop protection)")]
    StepLimitExceeded {
        limit: usize,
        location: SourceLocation,
    },

    /// Value raised by a `throw` statement
    #[error("{message}")]
    Thrown {
        message: String,
        location: SourceLocation,
    },
}

impl RuntimeError {
    pub fn location(&self) -> SourceLocation {
        match self {
            RuntimeError::UndefinedVariable { location, .. }
            | RuntimeError::NotCallable { location, .. }
            | RuntimeError::TypeError { location, .. }
            | RuntimeError::ConstAssignment { location, .. }
            | RuntimeError::AlreadyDeclared { location, .. }
            | RuntimeError::InvalidAssignmentTarget { location }
            | RuntimeError::ArgumentError { location, .. }
            | RuntimeError::CallDepthExceeded { location, .. }
            | RuntimeError::OperationBudgetExceeded { location, .. }
            | RuntimeError::ArrayTooLarge { location, .. }
            | RuntimeError::StringTooLong { location, .. }
            | RuntimeError::NestingTooDeep { location, .. }
            | RuntimeError::StepLimitExceeded { location, .. }
            | RuntimeError::Thrown { location, .. } => *location,
        }
    }

    pub(crate) fn type_error(
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        RuntimeError::TypeError {
            message: message.into(),
            location,
        }
    }

    pub(crate) fn argument(
        function: &str,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        RuntimeError::ArgumentError {
            function: function.to_string(),
            message: message.into(),
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_excludes_line() {
        let err = RuntimeError::UndefinedVariable {
            name: "tmp".to_string(),
            location: SourceLocation::new(7, 3),
        };
        assert_eq!(err.to_string(), "ReferenceError: tmp is not defined");
        assert_eq!(err.location(), SourceLocation::new(7, 3));
    }

    #[test]
    fn test_step_limit_message() {
        let err = RuntimeError::StepLimitExceeded {
            limit: 1000,
            location: SourceLocation::new(4, 9),
        };
        assert_eq!(
            err.to_string(),
            "Step limit exceeded (infinite loop protection)"
        );
    }
}
