//! Shifting and differencing (canonical REF/DELAY and DELTA)

use crate::dispatch;
use alpha_core::{Context, Result};

/// Shift a series back by `k` bars within each group (canonical REF/DELAY).
///
/// `y[i] = x[i - k]`; the first `k` outputs of each group are NaN.
pub fn delay(ctx: &Context, x: &[f64], k: usize) -> Result<Vec<f64>> {
    dispatch::unary(ctx, x, |xg, og| {
        for i in 0..xg.len() {
            og[i] = if i >= k { xg[i - k] } else { f64::NAN };
        }
    })
}

/// `k`-bar difference within each group: `y[i] = x[i] - x[i - k]`.
pub fn delta(ctx: &Context, x: &[f64], k: usize) -> Result<Vec<f64>> {
    dispatch::unary(ctx, x, |xg, og| {
        for i in 0..xg.len() {
            og[i] = if i >= k { xg[i] - xg[i - k] } else { f64::NAN };
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_shifts_within_group() {
        let ctx = Context::new(2);
        let x = [1.0, 2.0, 3.0, 10.0, 20.0, 30.0];
        let y = delay(&ctx, &x, 1).unwrap();
        assert!(y[0].is_nan());
        assert_eq!(&y[1..3], &[1.0, 2.0]);
        assert!(y[3].is_nan()); // no leakage from the previous group
        assert_eq!(&y[4..6], &[10.0, 20.0]);
    }

    #[test]
    fn delay_zero_is_identity() {
        let ctx = Context::new(1);
        let x = [1.0, 2.0, 3.0];
        assert_eq!(delay(&ctx, &x, 0).unwrap(), x.to_vec());
    }

    #[test]
    fn delay_out_of_range_is_all_nan() {
        let ctx = Context::new(1);
        let x = [1.0, 2.0];
        assert!(delay(&ctx, &x, 5).unwrap().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn delta_is_difference() {
        let ctx = Context::new(1);
        let x = [1.0, 4.0, 9.0];
        let y = delta(&ctx, &x, 1).unwrap();
        assert!(y[0].is_nan());
        assert_eq!(&y[1..], &[3.0, 5.0]);
    }

    #[test]
    fn delta_zero_is_zero() {
        let ctx = Context::new(1);
        let x = [1.0, 2.0, 3.0];
        assert_eq!(delta(&ctx, &x, 0).unwrap(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn nan_propagates() {
        let ctx = Context::new(1);
        let x = [1.0, f64::NAN, 3.0];
        let y = delay(&ctx, &x, 1).unwrap();
        assert!(y[2].is_nan());
        let d = delta(&ctx, &x, 1).unwrap();
        assert!(d[1].is_nan());
        assert!(d[2].is_nan());
    }
}
