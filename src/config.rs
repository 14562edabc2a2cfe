use crate::bytecode::BindingMode;

/// Per-expression settings, fixed when the expression is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpressionConfig {
    pub binding: BindingMode,
    /// Turn strict-mode misses into `NaN` reads instead of parse errors.
    pub catch_unbound: bool,
    /// Allow `linearize_1d`/`linearize_2d` to install lookup tables.
    pub linearization: bool,
}

impl ExpressionConfig {
    pub fn new(binding: BindingMode) -> Self {
        Self {
            binding,
            catch_unbound: false,
            linearization: true,
        }
    }

    pub fn lax() -> Self {
        Self::new(BindingMode::Lax)
    }

    pub fn strict() -> Self {
        Self::new(BindingMode::Strict)
    }

    pub fn catch_unbound(mut self, catch: bool) -> Self {
        self.catch_unbound = catch;
        self
    }

    pub fn linearization(mut self, enabled: bool) -> Self {
        self.linearization = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ExpressionConfig::strict()
            .catch_unbound(true)
            .linearization(false);
        assert_eq!(config.binding, BindingMode::Strict);
        assert!(config.catch_unbound);
        assert!(!config.linearization);

        let config = ExpressionConfig::lax();
        assert!(!config.catch_unbound);
        assert!(config.linearization);
    }
}
