use thiserror::Error;

/// Errors raised while evaluating a program.
///
/// Every variant is fatal to the current evaluation and unwinds to the root
/// call site; MyLang has no user-facing exception surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },
    #[error("Cannot read field '{field}' of a value of type {type_name}")]
    FieldAccessOnNonInstance {
        field: String,
        type_name: &'static str,
    },
    #[error("Unsupported operand types for '{operation}': {lhs} and {rhs}")]
    UnsupportedOperands {
        operation: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("Cannot compare {lhs} and {rhs} for {comparison}")]
    Incomparable {
        comparison: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("Method '{method}' must return True or False, got {type_name}")]
    ComparisonNotBoolean {
        method: &'static str,
        type_name: &'static str,
    },
    #[error("Method '{method}' not found for class {class}")]
    UnknownMethod { method: String, class: String },
    #[error("Cannot call method '{method}' on a value of type {type_name}")]
    CallOnNonInstance {
        method: String,
        type_name: &'static str,
    },
    #[error("Division by zero")]
    DivisionByZero,
}
