pub mod math;
pub mod random;

use crate::bytecode::Scope;
use crate::error::{ExpressionError, Result};

pub use random::{RandomSource, StdRandom};

/// How many arguments a builtin accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

/// The builtin functions. The discriminant is the stable function id.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Sin = 0,
    Cos = 1,
    Tan = 2,
    Exp = 3,
    Ln = 4,
    Sqrt = 5,
    Min = 6,
    Max = 7,
    If = 8,
    IncSum = 9,
    Polygon = 10,
    Mod = 11,
    Sigmoid = 12,
    Rnd = 13,
    Rndg = 14,
    In = 15,
    Round = 16,
}

impl Builtin {
    pub const ALL: [Builtin; 17] = [
        Builtin::Sin,
        Builtin::Cos,
        Builtin::Tan,
        Builtin::Exp,
        Builtin::Ln,
        Builtin::Sqrt,
        Builtin::Min,
        Builtin::Max,
        Builtin::If,
        Builtin::IncSum,
        Builtin::Polygon,
        Builtin::Mod,
        Builtin::Sigmoid,
        Builtin::Rnd,
        Builtin::Rndg,
        Builtin::In,
        Builtin::Round,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Tan => "tan",
            Builtin::Exp => "exp",
            Builtin::Ln => "ln",
            Builtin::Sqrt => "sqrt",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::If => "if",
            Builtin::IncSum => "incsum",
            Builtin::Polygon => "polygon",
            Builtin::Mod => "mod",
            Builtin::Sigmoid => "sigmoid",
            Builtin::Rnd => "rnd",
            Builtin::Rndg => "rndg",
            Builtin::In => "in",
            Builtin::Round => "round",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Builtin::Min | Builtin::Max | Builtin::In => Arity::AtLeast(1),
            Builtin::Polygon => Arity::AtLeast(5),
            Builtin::If => Arity::Exactly(3),
            Builtin::Mod | Builtin::Rnd | Builtin::Rndg => Arity::Exactly(2),
            Builtin::Sigmoid => Arity::Exactly(4),
            _ => Arity::Exactly(1),
        }
    }

    /// Validates an argument count at compile time.
    pub(crate) fn check_args(&self, expression: &str, count: usize) -> Result<()> {
        if *self == Builtin::Polygon {
            return math::check_polygon_args(count);
        }
        match self.arity() {
            Arity::Exactly(n) if n != count => Err(ExpressionError::syntax(
                expression,
                format!(
                    "function {} assumes {} arguments, got {}",
                    self.name(),
                    n,
                    count
                ),
            )),
            Arity::AtLeast(n) if count < n => Err(ExpressionError::syntax(
                expression,
                format!(
                    "function {} assumes at least {} arguments, got {}",
                    self.name(),
                    n,
                    count
                ),
            )),
            _ => Ok(()),
        }
    }
}

/// Applies a builtin to its arguments (in source order).
pub(crate) fn call(function: Builtin, args: &[f64], scope: &Scope<'_>) -> Result<f64> {
    let value = match function {
        Builtin::Sin => args[0].sin(),
        Builtin::Cos => args[0].cos(),
        Builtin::Tan => args[0].tan(),
        Builtin::Exp => args[0].exp(),
        Builtin::Ln => args[0].ln(),
        Builtin::Sqrt => args[0].sqrt(),
        Builtin::Min => args[1..]
            .iter()
            .fold(args[0], |acc, &v| if v < acc { v } else { acc }),
        Builtin::Max => args[1..]
            .iter()
            .fold(args[0], |acc, &v| if v > acc { v } else { acc }),
        Builtin::If => {
            if args[0] == 1.0 {
                args[1]
            } else {
                args[2]
            }
        }
        Builtin::IncSum => scope.inc_sum.add(args[0]),
        Builtin::Polygon => math::polygon(args[0], &args[1..])?,
        Builtin::Mod => args[0] % args[1],
        Builtin::Sigmoid => math::sigmoid(args[0], args[1], args[2], args[3])?,
        Builtin::Rnd => scope
            .random
            .ok_or(ExpressionError::MissingRandomSource { function: "rnd" })?
            .uniform(args[0], args[1]),
        Builtin::Rndg => scope
            .random
            .ok_or(ExpressionError::MissingRandomSource { function: "rndg" })?
            .gaussian(args[0], args[1]),
        Builtin::In => math::in_list(args[0], &args[1..]),
        Builtin::Round => math::round(args[0]),
    };
    Ok(value)
}
