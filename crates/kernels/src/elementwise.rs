//! Elementwise bridge operators
//!
//! The expression compiler maps comparisons, logic, selection, and `^` onto
//! these; hand-written alphas use them for MIN/MAX/ABS/SIGN/LOG/SCALE.
//! Predicate outputs are 0.0/1.0 float64 with NaN preserved. None of these
//! are windowed, so the context flags play no role; paired inputs must
//! share a length.

use alpha_core::{Error, Result};

fn zip2(a: &[f64], b: &[f64], f: impl Fn(f64, f64) -> f64) -> Result<Vec<f64>> {
    if a.len() != b.len() {
        return Err(Error::bad_shape(format!(
            "paired inputs have lengths {} and {}",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect())
}

/// Elementwise power `a[i] ^ b[i]`.
pub fn power(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    zip2(a, b, |x, y| {
        let r = x.powf(y);
        if r.is_finite() || r.is_nan() {
            r
        } else {
            f64::NAN
        }
    })
}

/// Elementwise minimum; NaN in either operand propagates.
pub fn min2(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    zip2(a, b, |x, y| {
        if x.is_nan() || y.is_nan() {
            f64::NAN
        } else {
            x.min(y)
        }
    })
}

/// Elementwise maximum; NaN in either operand propagates.
pub fn max2(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    zip2(a, b, |x, y| {
        if x.is_nan() || y.is_nan() {
            f64::NAN
        } else {
            x.max(y)
        }
    })
}

/// Elementwise absolute value.
pub fn abs(x: &[f64]) -> Vec<f64> {
    x.iter().map(|v| v.abs()).collect()
}

/// Elementwise sign: -1, 0, or 1; NaN stays NaN.
pub fn sign(x: &[f64]) -> Vec<f64> {
    x.iter()
        .map(|&v| {
            if v.is_nan() {
                f64::NAN
            } else if v > 0.0 {
                1.0
            } else if v < 0.0 {
                -1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Elementwise natural log; non-positive inputs yield NaN.
pub fn log(x: &[f64]) -> Vec<f64> {
    x.iter()
        .map(|&v| if v > 0.0 { v.ln() } else { f64::NAN })
        .collect()
}

/// Elementwise exponential; overflow yields NaN instead of infinity.
pub fn exp(x: &[f64]) -> Vec<f64> {
    x.iter()
        .map(|&v| {
            let r = v.exp();
            if r.is_finite() || r.is_nan() {
                r
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Elementwise square root; negative inputs yield NaN.
pub fn sqrt(x: &[f64]) -> Vec<f64> {
    x.iter().map(|v| v.sqrt()).collect()
}

/// Rescale so the absolute values sum to `k`: `x * k / sum(|x|)`.
///
/// A zero or NaN absolute sum makes the whole output NaN.
pub fn scale(x: &[f64], k: f64) -> Vec<f64> {
    let denom: f64 = x.iter().map(|v| v.abs()).sum();
    if denom == 0.0 || denom.is_nan() {
        return vec![f64::NAN; x.len()];
    }
    x.iter().map(|v| v * k / denom).collect()
}

/// The sequence 0..=periods as float64 (periods + 1 values).
pub fn sequence(periods: usize) -> Vec<f64> {
    (0..=periods).map(|i| i as f64).collect()
}

/// Elementwise select: `c[i]` true picks `a[i]`, false picks `b[i]`,
/// NaN condition stays NaN.
pub fn select(c: &[f64], a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    if c.len() != a.len() || c.len() != b.len() {
        return Err(Error::bad_shape(format!(
            "paired inputs have lengths {}, {} and {}",
            c.len(),
            a.len(),
            b.len()
        )));
    }
    Ok((0..c.len())
        .map(|i| {
            if c[i].is_nan() {
                f64::NAN
            } else if c[i] != 0.0 {
                a[i]
            } else {
                b[i]
            }
        })
        .collect())
}

macro_rules! comparison {
    ($(#[$doc:meta])* $name:ident, $op:tt) => {
        $(#[$doc])*
        pub fn $name(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
            zip2(a, b, |x, y| {
                if x.is_nan() || y.is_nan() {
                    f64::NAN
                } else if x $op y {
                    1.0
                } else {
                    0.0
                }
            })
        }
    };
}

comparison!(
    /// Elementwise `a > b` as 0/1 with NaN preserved.
    gt, >
);
comparison!(
    /// Elementwise `a >= b` as 0/1 with NaN preserved.
    ge, >=
);
comparison!(
    /// Elementwise `a < b` as 0/1 with NaN preserved.
    lt, <
);
comparison!(
    /// Elementwise `a <= b` as 0/1 with NaN preserved.
    le, <=
);
comparison!(
    /// Elementwise `a == b` as 0/1 with NaN preserved.
    eq, ==
);
comparison!(
    /// Elementwise `a != b` as 0/1 with NaN preserved.
    ne, !=
);

/// Elementwise logical AND on 0/1 floats; NaN propagates.
pub fn and(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    zip2(a, b, |x, y| {
        if x.is_nan() || y.is_nan() {
            f64::NAN
        } else if x != 0.0 && y != 0.0 {
            1.0
        } else {
            0.0
        }
    })
}

/// Elementwise logical OR on 0/1 floats; NaN propagates.
pub fn or(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    zip2(a, b, |x, y| {
        if x.is_nan() || y.is_nan() {
            f64::NAN
        } else if x != 0.0 || y != 0.0 {
            1.0
        } else {
            0.0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_and_domains() {
        let y = power(&[2.0, 4.0], &[3.0, 0.5]).unwrap();
        assert_eq!(y, vec![8.0, 2.0]);
        // overflow folds to NaN, never infinity
        let y = power(&[1e308], &[2.0]).unwrap();
        assert!(y[0].is_nan());
    }

    #[test]
    fn min_max_propagate_nan() {
        let y = min2(&[1.0, f64::NAN], &[2.0, 2.0]).unwrap();
        assert_eq!(y[0], 1.0);
        assert!(y[1].is_nan());
        let y = max2(&[1.0, f64::NAN], &[2.0, 2.0]).unwrap();
        assert_eq!(y[0], 2.0);
        assert!(y[1].is_nan());
    }

    #[test]
    fn sign_of_zero_is_zero() {
        let y = sign(&[-3.0, 0.0, 2.0, f64::NAN]);
        assert_eq!(&y[..3], &[-1.0, 0.0, 1.0]);
        assert!(y[3].is_nan());
    }

    #[test]
    fn log_domain() {
        let y = log(&[1.0, 0.0, -1.0]);
        assert_eq!(y[0], 0.0);
        assert!(y[1].is_nan());
        assert!(y[2].is_nan());
    }

    #[test]
    fn scale_normalizes_abs_sum() {
        let y = scale(&[1.0, -3.0], 1.0);
        assert!((y[0] - 0.25).abs() < 1e-12);
        assert!((y[1] + 0.75).abs() < 1e-12);
        assert!((y.iter().map(|v| v.abs()).sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(scale(&[0.0, 0.0], 1.0).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn sequence_is_inclusive() {
        assert_eq!(sequence(3), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn select_follows_condition() {
        let y = select(&[1.0, 0.0, f64::NAN], &[10.0, 10.0, 10.0], &[20.0, 20.0, 20.0]).unwrap();
        assert_eq!(y[0], 10.0);
        assert_eq!(y[1], 20.0);
        assert!(y[2].is_nan());
    }

    #[test]
    fn comparisons_are_zero_one_with_nan() {
        let a = [1.0, 2.0, f64::NAN];
        let b = [2.0, 2.0, 2.0];
        let y = lt(&a, &b).unwrap();
        assert_eq!(y[0], 1.0);
        assert_eq!(y[1], 0.0);
        assert!(y[2].is_nan());
        let y = ge(&a, &b).unwrap();
        assert_eq!(y[0], 0.0);
        assert_eq!(y[1], 1.0);
    }

    #[test]
    fn logic_on_zero_one() {
        let y = and(&[1.0, 1.0, 0.0], &[1.0, 0.0, 0.0]).unwrap();
        assert_eq!(y, vec![1.0, 0.0, 0.0]);
        let y = or(&[1.0, 0.0, 0.0], &[0.0, 0.0, 1.0]).unwrap();
        assert_eq!(y, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn shape_mismatch_rejected() {
        assert!(gt(&[1.0], &[1.0, 2.0]).unwrap_err().is_shape());
        assert!(select(&[1.0], &[1.0], &[1.0, 2.0]).unwrap_err().is_shape());
    }
}
