use std::sync::atomic::{AtomicU64, Ordering};

use log::trace;

use crate::bytecode::{Instruction, Operator, Program, VarSlot};
use crate::error::{ExpressionError, Result};
use crate::functions::{self, RandomSource};
use crate::wrapper::ExpressionWrapper;

const STACK_CAPACITY: usize = 16;

/// Running total behind `incsum()`. Stored as the bit pattern of an `f64` so
/// it can be shared by concurrent evaluations.
#[derive(Debug, Default)]
pub(crate) struct IncrementalSum(AtomicU64);

impl IncrementalSum {
    /// Adds `value` and returns the new total.
    pub fn add(&self, value: f64) -> f64 {
        let previous = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) + value).to_bits())
            })
            .unwrap_or_else(|bits| bits);
        f64::from_bits(previous) + value
    }

    pub fn reset(&self) {
        self.0.store(0.0f64.to_bits(), Ordering::Release);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }
}

/// Everything one run of a program reads from.
pub(crate) struct Scope<'a> {
    pub locals: &'a [f64],
    pub wrapper: Option<&'a dyn ExpressionWrapper>,
    pub external: &'a [f64],
    pub random: Option<&'a dyn RandomSource>,
    pub inc_sum: &'a IncrementalSum,
}

impl<'a> Scope<'a> {
    pub fn new(locals: &'a [f64], inc_sum: &'a IncrementalSum) -> Self {
        Self {
            locals,
            wrapper: None,
            external: &[],
            random: None,
            inc_sum,
        }
    }

    fn load(&self, slot: VarSlot) -> Result<f64> {
        match slot {
            // frames shorter than the local table read as zero
            VarSlot::Local(i) => Ok(self.locals.get(i).copied().unwrap_or(0.0)),
            VarSlot::Wrapper(i) => self
                .wrapper
                .map(|w| w.value(i))
                .ok_or(ExpressionError::MissingWrapper { index: i }),
            VarSlot::External(i) => self
                .external
                .get(i)
                .copied()
                .ok_or(ExpressionError::MissingExternal { index: i }),
            VarSlot::Unresolved => Ok(f64::NAN),
        }
    }
}

/// Numeric operand stack with a truth value per entry. Comparisons and
/// logical operators record their boolean result; plain numbers count as
/// true when non-zero.
struct Stack {
    values: Vec<f64>,
    truths: Vec<bool>,
}

impl Stack {
    fn new() -> Self {
        Self {
            values: Vec::with_capacity(STACK_CAPACITY),
            truths: Vec::with_capacity(STACK_CAPACITY),
        }
    }

    fn push(&mut self, value: f64) {
        self.values.push(value);
        self.truths.push(value != 0.0);
    }

    fn push_bool(&mut self, truth: bool) {
        self.values.push(if truth { 1.0 } else { 0.0 });
        self.truths.push(truth);
    }

    fn pop(&mut self) -> Result<(f64, bool)> {
        match (self.values.pop(), self.truths.pop()) {
            (Some(value), Some(truth)) => Ok((value, truth)),
            _ => Err(ExpressionError::StackImbalance { depth: 0 }),
        }
    }

    fn pop_number(&mut self) -> Result<f64> {
        self.pop().map(|(value, _)| value)
    }

    fn pop_bool(&mut self) -> Result<bool> {
        self.pop().map(|(_, truth)| truth)
    }

    /// The top `count` values, bottom first.
    fn top(&self, count: usize) -> Result<&[f64]> {
        let depth = self.values.len();
        if count > depth {
            return Err(ExpressionError::StackImbalance { depth });
        }
        Ok(&self.values[depth - count..])
    }

    fn drop_top(&mut self, count: usize) {
        let depth = self.values.len().saturating_sub(count);
        self.values.truncate(depth);
        self.truths.truncate(depth);
    }
}

/// Runs `program` to its `Stop` instruction and returns the single value left
/// on the stack.
pub(crate) fn execute(program: &Program, scope: &Scope<'_>) -> Result<f64> {
    if program.empty {
        return Ok(0.0);
    }

    let mut stack = Stack::new();
    for instruction in &program.instructions {
        match *instruction {
            Instruction::Number(value) => stack.push(value),
            Instruction::Variable(slot) => stack.push(scope.load(slot)?),
            Instruction::Operator(Operator::Negate) => {
                let value = stack.pop_number()?;
                stack.push(-value);
            }
            Instruction::Operator(op) => {
                let (b, a) = (stack.pop_number()?, stack.pop_number()?);
                stack.push(op.apply(a, b));
            }
            Instruction::Function { function, args } => {
                let result = functions::call(function, stack.top(args)?, scope)?;
                trace!("{}/{} -> {}", function.name(), args, result);
                stack.drop_top(args);
                stack.push(result);
            }
            Instruction::Compare(op) => {
                let (b, a) = (stack.pop_number()?, stack.pop_number()?);
                stack.push_bool(op.apply(a, b));
            }
            Instruction::Logical(op) => {
                let (b, a) = (stack.pop_bool()?, stack.pop_bool()?);
                stack.push_bool(op.apply(a, b));
            }
            Instruction::Stop => break,
        }
    }

    match stack.values.as_slice() {
        [result] => Ok(*result),
        values => Err(ExpressionError::StackImbalance {
            depth: values.len(),
        }),
    }
}
