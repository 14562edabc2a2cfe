use crate::error::{ExpressionError, Result};

pub(crate) fn check_polygon_args(count: usize) -> Result<()> {
    if count % 2 != 1 || count < 5 {
        return Err(ExpressionError::domain(
            "polygon",
            format!(
                "wrong number of arguments ({}); expected polygon(<val>, x0, y0, x1, y1, ...)",
                count
            ),
        ));
    }
    Ok(())
}

/// Piecewise linear lookup of `value` in `points` (`x0, y0, x1, y1, ...`,
/// ascending in x). Outside the range the nearest end point's y is returned.
pub fn polygon(value: f64, points: &[f64]) -> Result<f64> {
    check_polygon_args(points.len() + 1)?;

    // walk from the rightmost pair to the left
    let mut pairs = points.chunks_exact(2).rev();
    let (mut x, mut y) = match pairs.next() {
        Some(pair) => (pair[0], pair[1]),
        None => return Ok(f64::NAN),
    };
    if value > x {
        return Ok(y);
    }

    for pair in pairs {
        let (x_right, y_right) = (x, y);
        x = pair[0];
        y = pair[1];
        if value > x {
            return Ok((y_right - y) / (x_right - x) * (value - x) + y);
        }
    }
    Ok(y)
}

/// Sigmoid helper curves over `value` clamped to `[0, 1]`.
///
/// * `0`: logistic `1 / (1 + p1 * e^(-p2 * x))`
/// * `1`: Hill `x^p1 / (p2^p1 + x^p1)`
/// * `2`, `3`: `1 - ` the logistic and Hill curves
pub fn sigmoid(value: f64, kind: f64, p1: f64, p2: f64) -> Result<f64> {
    let invalid = || {
        ExpressionError::domain(
            "sigmoid",
            format!("invalid curve type {}; allowed are 0..3", kind),
        )
    };
    // NaN and fractional types fail here too
    if kind.fract() != 0.0 {
        return Err(invalid());
    }
    let x = value.clamp(0.0, 1.0);
    let curve = kind as i32;
    let result = match curve {
        0 | 2 => 1.0 / (1.0 + p1 * (-p2 * x).exp()),
        1 | 3 => x.powf(p1) / (p2.powf(p1) + x.powf(p1)),
        _ => return Err(invalid()),
    };
    if curve == 2 || curve == 3 {
        Ok(1.0 - result)
    } else {
        Ok(result)
    }
}

/// 1.0 if `value` equals any of `list`, 0.0 otherwise.
pub fn in_list(value: f64, list: &[f64]) -> f64 {
    if list.contains(&value) {
        1.0
    } else {
        0.0
    }
}

/// Rounds half away from zero.
pub fn round(x: f64) -> f64 {
    if x < 0.0 {
        (x - 0.5).ceil()
    } else {
        (x + 0.5).floor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINTS: [f64; 6] = [0.0, 0.0, 1.0, 10.0, 2.0, 0.0];

    #[test]
    fn test_polygon_interpolates() {
        assert_eq!(polygon(0.5, &POINTS).unwrap(), 5.0);
        assert_eq!(polygon(1.5, &POINTS).unwrap(), 5.0);
        assert_eq!(polygon(1.0, &POINTS).unwrap(), 10.0);
    }

    #[test]
    fn test_polygon_outside_range() {
        assert_eq!(polygon(3.0, &[0.0, 1.0, 2.0, 7.0]).unwrap(), 7.0);
        assert_eq!(polygon(-1.0, &[0.0, 1.0, 2.0, 7.0]).unwrap(), 1.0);
    }

    #[test]
    fn test_polygon_rejects_odd_points() {
        assert!(polygon(1.0, &[0.0, 1.0, 2.0]).is_err());
        assert!(polygon(1.0, &[0.0, 1.0]).is_err());
    }

    #[test]
    fn test_sigmoid_curves() {
        // logistic with p1 = 1, p2 = 0 is always 0.5
        assert_eq!(sigmoid(0.3, 0.0, 1.0, 0.0).unwrap(), 0.5);
        assert_eq!(sigmoid(0.3, 2.0, 1.0, 0.0).unwrap(), 0.5);
        // e^(-ln 3) = 1/3
        assert!((sigmoid(1.0, 0.0, 1.0, 3f64.ln()).unwrap() - 0.75).abs() < 1e-12);
        assert!((sigmoid(1.0, 2.0, 1.0, 3f64.ln()).unwrap() - 0.25).abs() < 1e-12);
        // p1 scales the exponential term
        assert!((sigmoid(0.0, 0.0, 3.0, 5.0).unwrap() - 0.25).abs() < 1e-12);
        assert!((sigmoid(0.5, 0.0, 2.0, 2.0f64.ln() * 2.0).unwrap() - 0.5).abs() < 1e-12);
        // Hill at x = p2 is 0.5
        assert!((sigmoid(0.5, 1.0, 2.0, 0.5).unwrap() - 0.5).abs() < 1e-12);
        assert!((sigmoid(0.5, 3.0, 2.0, 0.5).unwrap() - 0.5).abs() < 1e-12);
        // clamped input
        assert_eq!(
            sigmoid(7.0, 1.0, 2.0, 0.5).unwrap(),
            sigmoid(1.0, 1.0, 2.0, 0.5).unwrap()
        );
    }

    #[test]
    fn test_sigmoid_invalid_type() {
        assert!(matches!(
            sigmoid(0.5, 4.0, 1.0, 1.0),
            Err(ExpressionError::Domain {
                function: "sigmoid",
                ..
            })
        ));
        assert!(sigmoid(0.5, -1.0, 1.0, 1.0).is_err());
        assert!(sigmoid(0.5, 0.7, 1.0, 1.0).is_err());
        assert!(sigmoid(0.5, 2.5, 1.0, 1.0).is_err());
        assert!(matches!(
            sigmoid(0.5, f64::NAN, 1.0, 1.0),
            Err(ExpressionError::Domain { .. })
        ));
        assert!(sigmoid(0.5, f64::INFINITY, 1.0, 1.0).is_err());
        assert!(sigmoid(0.5, 3.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_in_list() {
        assert_eq!(in_list(3.0, &[1.0, 2.0, 3.0]), 1.0);
        assert_eq!(in_list(4.0, &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(in_list(4.0, &[]), 0.0);
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round(2.5), 3.0);
        assert_eq!(round(-2.5), -3.0);
        assert_eq!(round(2.4), 2.0);
        assert_eq!(round(-2.4), -2.0);
        assert_eq!(round(0.5), 1.0);
    }
}
