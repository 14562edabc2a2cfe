use log::warn;

use crate::bytecode::{VarSlot, MAX_LOCALS};
use crate::error::{ExpressionError, Result};
use crate::wrapper::ExpressionWrapper;

/// How names that nothing else resolves are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingMode {
    /// Unknown names are registered as new local variables.
    Lax,
    /// Unknown names are an error.
    Strict,
}

/// Registers `name` as a local variable, returning its slot. Registering an
/// existing name returns the existing slot.
pub(crate) fn register_local(locals: &mut Vec<String>, name: &str) -> Result<usize> {
    if let Some(slot) = locals.iter().position(|n| n == name) {
        return Ok(slot);
    }
    if locals.len() >= MAX_LOCALS {
        return Err(ExpressionError::TooManyVariables {
            name: name.to_string(),
            max: MAX_LOCALS,
        });
    }
    locals.push(name.to_string());
    Ok(locals.len() - 1)
}

/// Maps variable names to slots for one parse.
pub(crate) struct Binder<'a> {
    expression: &'a str,
    mode: BindingMode,
    catch_unbound: bool,
    wrapper: Option<&'a dyn ExpressionWrapper>,
    external: &'a [String],
    locals: Vec<String>,
    last_error: Option<String>,
}

impl<'a> Binder<'a> {
    pub fn new(expression: &'a str, mode: BindingMode, locals: Vec<String>) -> Self {
        Self {
            expression,
            mode,
            catch_unbound: false,
            wrapper: None,
            external: &[],
            locals,
            last_error: None,
        }
    }

    pub fn with_wrapper(mut self, wrapper: Option<&'a dyn ExpressionWrapper>) -> Self {
        self.wrapper = wrapper;
        self
    }

    pub fn with_external(mut self, names: &'a [String]) -> Self {
        self.external = names;
        self
    }

    pub fn catch_unbound(mut self, catch: bool) -> Self {
        self.catch_unbound = catch;
        self
    }

    pub fn resolve(&mut self, name: &str) -> Result<VarSlot> {
        if let Some(index) = self.wrapper.and_then(|w| w.variable_index(name)) {
            return Ok(VarSlot::Wrapper(index));
        }

        if let Some(index) = self.external.iter().position(|n| n == name) {
            return Ok(VarSlot::External(index));
        }

        if let Some(slot) = self.locals.iter().position(|n| n == name) {
            return Ok(VarSlot::Local(slot));
        }

        match self.mode {
            BindingMode::Lax => register_local(&mut self.locals, name).map(VarSlot::Local),
            BindingMode::Strict => {
                let error = ExpressionError::UnboundVariable {
                    name: name.to_string(),
                    expression: self.expression.to_string(),
                };
                if !self.catch_unbound {
                    return Err(error);
                }
                warn!("{}", error);
                self.last_error = Some(error.to_string());
                Ok(VarSlot::Unresolved)
            }
        }
    }

    pub fn into_parts(self) -> (Vec<String>, Option<String>) {
        (self.locals, self.last_error)
    }
}
