use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use log::debug;
use rayon::prelude::*;

use crate::bytecode::{
    execute, register_local, Binder, Compiler, IncrementalSum, Instruction, Program, Scope,
    MAX_LOCALS,
};
use crate::config::ExpressionConfig;
use crate::error::{ExpressionError, Result};
use crate::functions::RandomSource;
use crate::linearize::{Linearization, Table1d, Table2d};
use crate::wrapper::ExpressionWrapper;

/// Values of the instance-owned local slots.
#[derive(Debug, Clone)]
struct SlotState {
    values: [f64; MAX_LOCALS],
    /// Values of a discarded program, moved to their new slots by name on
    /// the next parse.
    carried: Vec<(String, f64)>,
}

impl Default for SlotState {
    fn default() -> Self {
        Self {
            values: [0.0; MAX_LOCALS],
            carried: Vec::new(),
        }
    }
}

/// A formula that is compiled once and evaluated many times.
///
/// Compilation happens lazily on first use and is safe to race: concurrent
/// first calls compile exactly once and all observe the same program.
/// Evaluation comes in three flavours:
///
/// * [`execute_with`](Self::execute_with) and friends take a caller-owned
///   frame and need no locking, so one expression can be shared freely
///   across threads.
/// * [`execute`](Self::execute) reads a snapshot of the instance slots set
///   with [`set_variable`](Self::set_variable).
/// * [`execute_locked`](Self::execute_locked) and
///   [`evaluate_locked`](Self::evaluate_locked) hold the instance lock for
///   the whole run.
///
/// ```
/// use formulix_rs::Expression;
///
/// let expr = Expression::lax("x^2 + y");
/// assert_eq!(expr.evaluate(3.0, 1.0).unwrap(), 10.0);
/// ```
pub struct Expression {
    source: String,
    config: ExpressionConfig,
    declared: Vec<String>,
    wrapper: Option<Arc<dyn ExpressionWrapper>>,
    external_names: Vec<String>,
    random: Option<Arc<dyn RandomSource>>,
    program: OnceLock<Program>,
    slots: Mutex<SlotState>,
    inc_sum: IncrementalSum,
    linearization: Option<Linearization>,
}

impl Expression {
    pub fn with_config(expression: &str, config: ExpressionConfig) -> Self {
        Self {
            source: normalize(expression),
            config,
            declared: Vec::new(),
            wrapper: None,
            external_names: Vec::new(),
            random: None,
            program: OnceLock::new(),
            slots: Mutex::new(SlotState::default()),
            inc_sum: IncrementalSum::default(),
            linearization: None,
        }
    }

    /// Unknown names become new local variables.
    pub fn lax(expression: &str) -> Self {
        Self::with_config(expression, ExpressionConfig::lax())
    }

    /// Unknown names are an error.
    pub fn strict(expression: &str) -> Self {
        Self::with_config(expression, ExpressionConfig::strict())
    }

    /// Replaces the formula text and discards everything derived from the
    /// old one: compiled program, local names and values, incremental sum
    /// and lookup tables.
    pub fn set_expression(&mut self, expression: &str) {
        self.source = normalize(expression);
        self.declared.clear();
        self.program = OnceLock::new();
        *self.slots.get_mut().unwrap_or_else(PoisonError::into_inner) = SlotState::default();
        self.inc_sum.reset();
        self.linearization = None;
    }

    pub fn expression(&self) -> &str {
        &self.source
    }

    pub fn config(&self) -> &ExpressionConfig {
        &self.config
    }

    /// Binds a host object; its field names take precedence over locals.
    pub fn set_wrapper(&mut self, wrapper: Arc<dyn ExpressionWrapper>) {
        self.wrapper = Some(wrapper);
        self.reset_program();
    }

    /// Names resolved to external slots, in slot order.
    pub fn set_external_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.external_names = names.into_iter().map(Into::into).collect();
        self.reset_program();
    }

    pub fn set_random(&mut self, random: Arc<dyn RandomSource>) {
        self.random = Some(random);
    }

    /// Names declared before the first parse survive; names registered
    /// afterwards are rebuilt by the next parse. Slot values follow their
    /// names into the new layout.
    fn reset_program(&mut self) {
        let slots = self.slots.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(program) = self.program.take() {
            slots.carried = program.locals.into_iter().zip(slots.values).collect();
            slots.values = [0.0; MAX_LOCALS];
        }
        self.linearization = None;
    }

    fn lock_slots(&self) -> MutexGuard<'_, SlotState> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Compiles the expression if that has not happened yet.
    pub fn parse(&self) -> Result<()> {
        self.program().map(|_| ())
    }

    fn program(&self) -> Result<&Program> {
        if let Some(program) = self.program.get() {
            return Ok(program);
        }

        let mut slots = self.lock_slots();
        if let Some(program) = self.program.get() {
            return Ok(program);
        }

        debug!("Parsing expression: {}", self.source);
        let binder = Binder::new(&self.source, self.config.binding, self.declared.clone())
            .with_wrapper(self.wrapper.as_deref())
            .with_external(&self.external_names)
            .catch_unbound(self.config.catch_unbound);
        let program = Compiler::new(&self.source, binder).compile()?;

        for (name, value) in std::mem::take(&mut slots.carried) {
            if let Some(slot) = program.locals.iter().position(|n| *n == name) {
                slots.values[slot] = value;
            }
        }
        Ok(self.program.get_or_init(|| program))
    }

    /// Registers a local variable and returns its slot. Registering a known
    /// name returns its existing slot.
    pub fn add_variable(&mut self, name: &str) -> Result<usize> {
        match self.program.get_mut() {
            Some(program) => register_local(&mut program.locals, name),
            None => register_local(&mut self.declared, name),
        }
    }

    /// Slot of a local variable, compiling first if needed.
    pub fn variable_slot(&self, name: &str) -> Result<usize> {
        self.program()?
            .locals
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| ExpressionError::UnknownVariable {
                name: name.to_string(),
            })
    }

    /// Stores the value read by [`execute`](Self::execute) and
    /// [`execute_locked`](Self::execute_locked) for `name`.
    pub fn set_variable(&self, name: &str, value: f64) -> Result<()> {
        let slot = self.variable_slot(name)?;
        self.lock_slots().values[slot] = value;
        Ok(())
    }

    /// Local variable names in slot order.
    pub fn variables(&self) -> &[String] {
        match self.program.get() {
            Some(program) => &program.locals,
            None => &self.declared,
        }
    }

    fn scope<'a>(&'a self, locals: &'a [f64]) -> Scope<'a> {
        let mut scope = Scope::new(locals, &self.inc_sum);
        scope.wrapper = self.wrapper.as_deref();
        scope.random = self.random.as_deref();
        scope
    }

    /// Evaluates against a snapshot of the instance slots.
    pub fn execute(&self) -> Result<f64> {
        let program = self.program()?;
        let values = self.lock_slots().values;
        execute(program, &self.scope(&values))
    }

    /// Evaluates while holding the instance lock, so no `set_variable` can
    /// interleave with the run.
    pub fn execute_locked(&self) -> Result<f64> {
        let program = self.program()?;
        let slots = self.lock_slots();
        execute(program, &self.scope(&slots.values))
    }

    /// [`evaluate`](Self::evaluate) while holding the instance lock.
    pub fn evaluate_locked(&self, x: f64, y: f64) -> Result<f64> {
        let program = self.program()?;
        let _guard = self.lock_slots();
        if let Some(value) = self
            .linearization
            .as_ref()
            .and_then(|table| table.lookup(x, y))
        {
            return Ok(value);
        }
        execute(program, &self.scope(&frame(x, y)))
    }

    /// Evaluates against a caller-owned frame of local values. Slots beyond
    /// the end of `locals` read as zero.
    pub fn execute_with(&self, locals: &[f64]) -> Result<f64> {
        let program = self.program()?;
        execute(program, &self.scope(locals))
    }

    /// Like [`execute_with`](Self::execute_with), also supplying values for
    /// the names bound with [`set_external_names`](Self::set_external_names).
    pub fn execute_external(&self, locals: &[f64], external: &[f64]) -> Result<f64> {
        let program = self.program()?;
        let mut scope = self.scope(locals);
        scope.external = external;
        execute(program, &scope)
    }

    /// Reads wrapper-bound variables from `wrapper` instead of the bound
    /// object. `wrapper` must expose the same variable names.
    pub fn execute_on(&self, wrapper: &dyn ExpressionWrapper, locals: &[f64]) -> Result<f64> {
        let program = self.program()?;
        let mut scope = self.scope(locals);
        scope.wrapper = Some(wrapper);
        execute(program, &scope)
    }

    /// Evaluates many frames in parallel.
    pub fn execute_batch(&self, frames: &[Vec<f64>]) -> Result<Vec<f64>> {
        self.parse()?;
        frames
            .par_iter()
            .map(|locals| self.execute_with(locals))
            .collect()
    }

    /// Evaluates with `x` in local slot 0 and `y` in slot 1, through the
    /// lookup table when one is installed and covers the point.
    pub fn evaluate(&self, x: f64, y: f64) -> Result<f64> {
        if let Some(value) = self
            .linearization
            .as_ref()
            .and_then(|table| table.lookup(x, y))
        {
            return Ok(value);
        }
        self.evaluate_exact(x, y)
    }

    /// Like [`evaluate`](Self::evaluate), never using the lookup table.
    pub fn evaluate_exact(&self, x: f64, y: f64) -> Result<f64> {
        self.execute_with(&frame(x, y))
    }

    pub fn evaluate_on(&self, wrapper: &dyn ExpressionWrapper, x: f64, y: f64) -> Result<f64> {
        self.execute_on(wrapper, &frame(x, y))
    }

    /// Restarts the running total behind `incsum()`.
    pub fn enable_incremental_sum(&self) {
        self.inc_sum.reset();
    }

    /// Current running total of `incsum()`.
    pub fn incremental_sum(&self) -> f64 {
        self.inc_sum.get()
    }

    /// Installs a table of `steps + 2` samples of `f(x)` over `[low, high]`.
    /// A no-op when linearization is disabled in the config.
    pub fn linearize_1d(&mut self, low: f64, high: f64, steps: usize) -> Result<()> {
        if !self.config.linearization {
            debug!("Linearization disabled, skipping: {}", self.source);
            return Ok(());
        }
        self.parse()?;
        let table = Table1d::build(low, high, steps, |x| self.evaluate_exact(x, 0.0))?;
        self.linearization = Some(Linearization::OneDimensional(table));
        Ok(())
    }

    /// Installs a row-major table of `f(x, y)` samples.
    pub fn linearize_2d(
        &mut self,
        (low_x, high_x, steps_x): (f64, f64, usize),
        (low_y, high_y, steps_y): (f64, f64, usize),
    ) -> Result<()> {
        if !self.config.linearization {
            debug!("Linearization disabled, skipping: {}", self.source);
            return Ok(());
        }
        self.parse()?;
        let table = Table2d::build(
            (low_x, high_x, steps_x),
            (low_y, high_y, steps_y),
            |x, y| self.evaluate_exact(x, y),
        )?;
        self.linearization = Some(Linearization::TwoDimensional(table));
        Ok(())
    }

    pub fn is_linearized(&self) -> bool {
        self.linearization.is_some()
    }

    pub fn is_parsed(&self) -> bool {
        self.program.get().is_some()
    }

    /// `true` for blank formula text.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// `true` once compiled, if the formula references no variables.
    pub fn is_constant(&self) -> bool {
        self.program.get().is_some_and(Program::is_constant)
    }

    /// The suppressed binding error of a catch-mode compile, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.program.get().and_then(|p| p.last_error.as_deref())
    }

    pub fn instructions(&self) -> Option<&[Instruction]> {
        self.program.get().map(Program::instructions)
    }

    pub fn compiled(&self) -> Option<&Program> {
        self.program.get()
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("source", &self.source)
            .field("config", &self.config)
            .field("variables", &self.variables())
            .field("external_names", &self.external_names)
            .field("wrapper", &self.wrapper.is_some())
            .field("random", &self.random.is_some())
            .field("parsed", &self.is_parsed())
            .field("linearized", &self.is_linearized())
            .finish()
    }
}

fn normalize(expression: &str) -> String {
    expression.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn frame(x: f64, y: f64) -> [f64; MAX_LOCALS] {
    let mut locals = [0.0; MAX_LOCALS];
    locals[0] = x;
    locals[1] = y;
    locals
}
