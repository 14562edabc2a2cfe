pub mod bytecode;
pub mod cache;
pub mod config;
pub mod error;
pub mod expression;
pub mod functions;
pub mod linearize;
pub mod wrapper;

use std::collections::HashMap;

pub use bytecode::{BindingMode, Instruction, Program, VarSlot, MAX_LOCALS};
pub use cache::ExpressionCache;
pub use config::ExpressionConfig;
pub use error::{ExpressionError, Result};
pub use expression::Expression;
pub use functions::{Builtin, RandomSource, StdRandom};
pub use wrapper::{ExpressionWrapper, RecordWrapper};

/// One-shot evaluation of `expression` with variable values taken from
/// `context`. Every variable the expression uses must be present.
pub fn evaluate_expression(expression: &str, context: &HashMap<String, f64>) -> Result<f64> {
    let expr = Expression::lax(expression);
    expr.parse()?;
    let locals = expr
        .variables()
        .iter()
        .map(|name| {
            context
                .get(name)
                .copied()
                .ok_or_else(|| ExpressionError::UnknownVariable { name: name.clone() })
        })
        .collect::<Result<Vec<_>>>()?;
    expr.execute_with(&locals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_expression() {
        let context = HashMap::from([
            ("dbh".to_string(), 30.0),
            ("species".to_string(), 1.0),
        ]);
        let result = evaluate_expression("0.5*dbh^2 + if(species=1,10,0)", &context).unwrap();
        assert_eq!(result, 460.0);
    }

    #[test]
    fn test_evaluate_expression_missing_variable() {
        let context = HashMap::from([("a".to_string(), 1.0)]);
        assert!(matches!(
            evaluate_expression("a + b", &context),
            Err(ExpressionError::UnknownVariable { ref name }) if name == "b"
        ));
    }
}
