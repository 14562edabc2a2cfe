use std::fmt;

use crate::functions::Builtin;

pub(crate) mod binder;
mod compiler;
mod executor;
mod tokenizer;

pub use binder::BindingMode;
pub(crate) use binder::{register_local, Binder};
pub(crate) use compiler::Compiler;
pub(crate) use executor::{execute, IncrementalSum, Scope};

/// Number of local variable slots an expression can use.
pub const MAX_LOCALS: usize = 10;

/// Offsets of the legacy integer slot encoding (`[0,100)` local,
/// `[100,1000)` wrapper, `[1000,..)` external).
pub const WRAPPER_SLOT_OFFSET: i32 = 100;
pub const EXTERNAL_SLOT_OFFSET: i32 = 1000;

/// Where a variable's value comes from at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarSlot {
    /// Index into the local frame.
    Local(usize),
    /// Index into the wrapper's variable list.
    Wrapper(usize),
    /// Index into the caller supplied external table.
    External(usize),
    /// A strict-mode miss that was suppressed; reads as `NaN`.
    Unresolved,
}

impl VarSlot {
    /// The integer encoding used by the compiled-program dumps.
    pub fn legacy_index(&self) -> i32 {
        match self {
            VarSlot::Local(i) => *i as i32,
            VarSlot::Wrapper(i) => WRAPPER_SLOT_OFFSET + *i as i32,
            VarSlot::External(i) => EXTERNAL_SLOT_OFFSET + *i as i32,
            VarSlot::Unresolved => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Negate,
}

impl Operator {
    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            Operator::Add => left + right,
            Operator::Sub => left - right,
            Operator::Mul => left * right,
            Operator::Div => left / right,
            Operator::Pow => left.powf(right),
            Operator::Negate => -right,
        }
    }

    fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
            Operator::Pow => '^',
            Operator::Negate => '_',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    pub fn apply(&self, left: f64, right: f64) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::Ne => left != right,
            CompareOp::Lt => left < right,
            CompareOp::Gt => left > right,
            CompareOp::Le => left <= right,
            CompareOp::Ge => left >= right,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
        }
    }
}

impl TryFrom<&str> for CompareOp {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "=" => Ok(CompareOp::Eq),
            "<>" => Ok(CompareOp::Ne),
            "<" => Ok(CompareOp::Lt),
            ">" => Ok(CompareOp::Gt),
            "<=" => Ok(CompareOp::Le),
            ">=" => Ok(CompareOp::Ge),
            _ => Err(format!("unknown comparison operator '{}'", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn apply(&self, left: bool, right: bool) -> bool {
        match self {
            LogicalOp::And => left && right,
            LogicalOp::Or => left || right,
        }
    }
}

impl TryFrom<&str> for LogicalOp {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case("and") {
            Ok(LogicalOp::And)
        } else if value.eq_ignore_ascii_case("or") {
            Ok(LogicalOp::Or)
        } else {
            Err(format!("unknown logical operator '{}'", value))
        }
    }
}

/// One step of a compiled program. Programs are in post-order: operands
/// always precede the instruction that consumes them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    // Stack Operations
    Number(f64),
    Variable(VarSlot),

    // Arithmetic
    Operator(Operator),

    // Function Calls
    Function { function: Builtin, args: usize },

    // Logic
    Logical(LogicalOp),
    Compare(CompareOp),

    // Control Flow
    Stop,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Number(value) => write!(f, "push {}", value),
            Instruction::Variable(slot) => write!(f, "load {}", slot.legacy_index()),
            Instruction::Operator(op) => write!(f, "op {}", op.symbol()),
            Instruction::Function { function, args } => {
                write!(f, "call {}/{}", function.name(), args)
            }
            Instruction::Logical(LogicalOp::And) => write!(f, "and"),
            Instruction::Logical(LogicalOp::Or) => write!(f, "or"),
            Instruction::Compare(op) => write!(f, "cmp {}", op.symbol()),
            Instruction::Stop => write!(f, "stop"),
        }
    }
}

/// The output of a successful parse. Immutable once built, apart from
/// local names appended through `Expression::add_variable`.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub(crate) instructions: Vec<Instruction>,
    pub(crate) locals: Vec<String>,
    pub(crate) constant: bool,
    pub(crate) empty: bool,
    pub(crate) last_error: Option<String>,
}

impl Program {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn locals(&self) -> &[String] {
        &self.locals
    }

    pub fn is_constant(&self) -> bool {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, instruction) in self.instructions.iter().enumerate() {
            writeln!(f, "{:4}: {}", pc, instruction)?;
        }
        Ok(())
    }
}
