use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExpressionError>;

/// Everything that can go wrong while compiling or running an expression.
///
/// Floating point anomalies (division by zero, `ln(0)`, ...) are not errors:
/// they surface as `inf`/`NaN` in the result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("syntax error in expression '{expression}': {message}")]
    Syntax { expression: String, message: String },

    #[error("variable '{name}' in (strict) expression '{expression}' is not available")]
    UnboundVariable { name: String, expression: String },

    #[error("cannot register variable '{name}': at most {max} local variables are supported")]
    TooManyVariables { name: String, max: usize },

    #[error("{function}: {message}")]
    Domain {
        function: &'static str,
        message: String,
    },

    #[error("{function}() requires a random source, but none is bound")]
    MissingRandomSource { function: &'static str },

    #[error("variable slot {index} is bound to an object, but no object was supplied")]
    MissingWrapper { index: usize },

    #[error("external variable slot {index} has no value")]
    MissingExternal { index: usize },

    #[error("invalid variable '{name}'")]
    UnknownVariable { name: String },

    #[error("stack unbalanced at end of execution: {depth} values left")]
    StackImbalance { depth: usize },
}

impl ExpressionError {
    pub(crate) fn syntax(expression: &str, message: impl Into<String>) -> Self {
        ExpressionError::Syntax {
            expression: expression.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn domain(function: &'static str, message: impl Into<String>) -> Self {
        ExpressionError::Domain {
            function,
            message: message.into(),
        }
    }
}
