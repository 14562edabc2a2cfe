//! Binding expressions to the fields of a host object.

/// Variables every wrapper exposes ahead of its own fields.
pub const BASE_VARIABLES: [&str; 1] = ["year"];

/// A host object whose named fields can be read by an expression.
///
/// Names are resolved once at parse time to an index into
/// [`variable_names`](ExpressionWrapper::variable_names); evaluation then
/// calls [`value`](ExpressionWrapper::value) with that index. Any object
/// exposing the same name list can be evaluated with the same compiled
/// expression.
pub trait ExpressionWrapper: Send + Sync {
    fn variable_names(&self) -> Vec<&str>;

    fn variable_index(&self, name: &str) -> Option<usize> {
        self.variable_names().iter().position(|n| *n == name)
    }

    fn value(&self, index: usize) -> f64;
}

/// A wrapper over a flat record of named numbers. Index 0 is `year`, the
/// fields follow in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordWrapper {
    year: f64,
    names: Vec<String>,
    values: Vec<f64>,
}

impl RecordWrapper {
    pub fn new<'a>(year: i32, fields: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let (names, values) = fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .unzip();
        Self {
            year: year as f64,
            names,
            values,
        }
    }

    pub fn set_year(&mut self, year: i32) {
        self.year = year as f64;
    }

    /// Updates a field; returns `false` if the record has no such field.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match self.names.iter().position(|n| n == name) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }
}

impl ExpressionWrapper for RecordWrapper {
    fn variable_names(&self) -> Vec<&str> {
        BASE_VARIABLES
            .iter()
            .copied()
            .chain(self.names.iter().map(String::as_str))
            .collect()
    }

    fn value(&self, index: usize) -> f64 {
        match index.checked_sub(BASE_VARIABLES.len()) {
            None => self.year,
            Some(i) => self.values.get(i).copied().unwrap_or(f64::NAN),
        }
    }
}
