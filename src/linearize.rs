use log::{debug, trace};

use crate::error::{ExpressionError, Result};

fn check_range(low: f64, high: f64, steps: usize) -> Result<f64> {
    if steps == 0 || !(low < high) {
        return Err(ExpressionError::domain(
            "linearize",
            format!(
                "invalid range [{}, {}] with {} steps; expected low < high and steps > 0",
                low, high, steps
            ),
        ));
    }
    Ok((high - low) / steps as f64)
}

/// Sampled values of a one-argument function over `[low, high]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table1d {
    low: f64,
    high: f64,
    step: f64,
    values: Vec<f64>,
}

impl Table1d {
    /// Samples `f` at `steps + 2` points starting at `low`; the last point
    /// lies one step past `high` so lookups at the right edge still have an
    /// upper neighbour.
    pub fn build(
        low: f64,
        high: f64,
        steps: usize,
        mut f: impl FnMut(f64) -> Result<f64>,
    ) -> Result<Self> {
        let step = check_range(low, high, steps)?;
        let values = (0..steps + 2)
            .map(|i| f(low + i as f64 * step))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "Built 1-D table over [{}, {}] with {} samples",
            low,
            high,
            values.len()
        );
        Ok(Self {
            low,
            high,
            step,
            values,
        })
    }

    /// Interpolated value at `x`, or `None` outside the sampled range.
    pub fn lookup(&self, x: f64) -> Option<f64> {
        if !(x >= self.low && x <= self.high) {
            trace!("{} outside [{}, {}]", x, self.low, self.high);
            return None;
        }
        let lower = ((x - self.low) / self.step) as usize;
        let v1 = *self.values.get(lower)?;
        let v2 = *self.values.get(lower + 1)?;
        let offset = x - self.low - lower as f64 * self.step;
        Some(v1 + (v2 - v1) * offset / self.step)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Sampled values of a two-argument function, row-major in x.
#[derive(Debug, Clone, PartialEq)]
pub struct Table2d {
    low_x: f64,
    high_x: f64,
    step_x: f64,
    low_y: f64,
    high_y: f64,
    step_y: f64,
    count_y: usize,
    values: Vec<f64>,
}

impl Table2d {
    pub fn build(
        (low_x, high_x, steps_x): (f64, f64, usize),
        (low_y, high_y, steps_y): (f64, f64, usize),
        mut f: impl FnMut(f64, f64) -> Result<f64>,
    ) -> Result<Self> {
        let step_x = check_range(low_x, high_x, steps_x)?;
        let step_y = check_range(low_y, high_y, steps_y)?;
        let count_x = steps_x + 2;
        let count_y = steps_y + 2;

        let mut values = Vec::with_capacity(count_x * count_y);
        for i in 0..count_x {
            let x = low_x + i as f64 * step_x;
            for j in 0..count_y {
                values.push(f(x, low_y + j as f64 * step_y)?);
            }
        }
        debug!(
            "Built 2-D table over [{}, {}] x [{}, {}] with {}x{} samples",
            low_x, high_x, low_y, high_y, count_x, count_y
        );

        Ok(Self {
            low_x,
            high_x,
            step_x,
            low_y,
            high_y,
            step_y,
            count_y,
            values,
        })
    }

    /// Approximation at `(x, y)` from the lower-left sample of the enclosing
    /// cell, using slopes averaged over the cell's opposite edges.
    pub fn lookup(&self, x: f64, y: f64) -> Option<f64> {
        if !(x >= self.low_x && x <= self.high_x && y >= self.low_y && y <= self.high_y) {
            trace!("({}, {}) outside table", x, y);
            return None;
        }
        let ix = ((x - self.low_x) / self.step_x) as usize;
        let iy = ((y - self.low_y) / self.step_y) as usize;
        let index = ix * self.count_y + iy;

        let v11 = *self.values.get(index)?;
        let v12 = *self.values.get(index + 1)?;
        let v21 = *self.values.get(index + self.count_y)?;
        let v22 = *self.values.get(index + self.count_y + 1)?;

        let rx = (x - self.low_x - ix as f64 * self.step_x) / self.step_x;
        let ry = (y - self.low_y - iy as f64 * self.step_y) / self.step_y;
        let slope_x = (v21 - v11 + v22 - v12) / 2.0;
        let slope_y = (v12 - v11 + v22 - v21) / 2.0;
        Some(v11 + rx * slope_x + ry * slope_y)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A lookup table installed in front of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Linearization {
    OneDimensional(Table1d),
    TwoDimensional(Table2d),
}

impl Linearization {
    /// `None` means the caller has to evaluate exactly.
    pub fn lookup(&self, x: f64, y: f64) -> Option<f64> {
        match self {
            Linearization::OneDimensional(table) => table.lookup(x),
            Linearization::TwoDimensional(table) => table.lookup(x, y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_1d_sample_count() {
        let table = Table1d::build(0.0, 10.0, 10, |x| Ok(x)).unwrap();
        assert_eq!(table.len(), 12);
        assert_eq!(table.lookup(10.0), Some(10.0));
        assert_eq!(table.lookup(0.0), Some(0.0));
    }

    #[test]
    fn test_1d_linear_is_exact() {
        let table = Table1d::build(-5.0, 5.0, 20, |x| Ok(3.0 * x + 1.0)).unwrap();
        for x in [-5.0, -1.3, 0.0, 0.25, 4.9, 5.0] {
            let v = table.lookup(x).unwrap();
            assert!((v - (3.0 * x + 1.0)).abs() < 1e-9, "x = {}", x);
        }
    }

    #[test]
    fn test_1d_smooth_accuracy() {
        let table = Table1d::build(0.0, 3.0, 1000, |x| Ok(x.sin())).unwrap();
        for i in 0..=300 {
            let x = i as f64 * 0.01;
            assert!((table.lookup(x).unwrap() - x.sin()).abs() < 1e-5);
        }
    }

    #[test]
    fn test_1d_outside_range() {
        let table = Table1d::build(0.0, 1.0, 4, |x| Ok(x)).unwrap();
        assert_eq!(table.lookup(-0.01), None);
        assert_eq!(table.lookup(1.01), None);
        assert_eq!(table.lookup(f64::NAN), None);
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(matches!(
            Table1d::build(0.0, 1.0, 0, |x| Ok(x)),
            Err(ExpressionError::Domain {
                function: "linearize",
                ..
            })
        ));
        assert!(Table1d::build(1.0, 1.0, 10, |x| Ok(x)).is_err());
        assert!(Table2d::build((0.0, 1.0, 4), (2.0, 1.0, 4), |x, y| Ok(x + y)).is_err());
    }

    #[test]
    fn test_sampling_errors_propagate() {
        let result = Table1d::build(0.0, 1.0, 4, |_| {
            Err(ExpressionError::MissingRandomSource { function: "rnd" })
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_2d_layout_and_plane() {
        let table = Table2d::build((0.0, 4.0, 4), (0.0, 2.0, 2), |x, y| Ok(x + 2.0 * y)).unwrap();
        assert_eq!(table.len(), 6 * 4);
        for (x, y) in [(0.0, 0.0), (1.5, 0.5), (4.0, 2.0), (3.3, 1.9)] {
            let v = table.lookup(x, y).unwrap();
            assert!((v - (x + 2.0 * y)).abs() < 1e-9, "({}, {})", x, y);
        }
        assert_eq!(table.lookup(5.0, 1.0), None);
        assert_eq!(table.lookup(1.0, -1.0), None);
    }

    #[test]
    fn test_dispatch() {
        let one = Linearization::OneDimensional(Table1d::build(0.0, 1.0, 2, |x| Ok(x)).unwrap());
        assert_eq!(one.lookup(0.5, 99.0), Some(0.5));
        let two = Linearization::TwoDimensional(
            Table2d::build((0.0, 1.0, 2), (0.0, 1.0, 2), |x, y| Ok(x * 10.0 + y)).unwrap(),
        );
        assert_eq!(two.lookup(0.5, 0.5), Some(5.5));
    }
}
