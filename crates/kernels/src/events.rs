//! Event counters and crossing detectors
//!
//! The counters are tiny per-group state machines: a NaN input emits NaN
//! and leaves the counter untouched; a true input resets (BARSLAST) or
//! starts (BARSSINCE) the count; anything else increments it.
//!
//! The cross detectors test the strict inequality flip between bar i-1 and
//! bar i; equality at either end does not fire. Outputs are 0.0/1.0 with
//! NaN preserved.

use crate::dispatch;
use crate::sums::{is_true, require_window};
use alpha_core::{Context, Error, Result};

/// Bars since the predicate was most recently true; NaN until the first
/// true.
pub fn barslast(ctx: &Context, c: &[f64]) -> Result<Vec<f64>> {
    dispatch::unary(ctx, c, |cg, og| {
        let mut count: Option<f64> = None;
        for (&v, o) in cg.iter().zip(og.iter_mut()) {
            if v.is_nan() {
                *o = f64::NAN;
            } else if is_true(v) {
                count = Some(0.0);
                *o = 0.0;
            } else if let Some(n) = count.as_mut() {
                *n += 1.0;
                *o = *n;
            } else {
                *o = f64::NAN;
            }
        }
    })
}

/// Bars since the predicate was first true; NaN until then.
pub fn barssince(ctx: &Context, c: &[f64]) -> Result<Vec<f64>> {
    dispatch::unary(ctx, c, |cg, og| {
        let mut count: Option<f64> = None;
        for (&v, o) in cg.iter().zip(og.iter_mut()) {
            if v.is_nan() {
                *o = f64::NAN;
            } else if let Some(n) = count.as_mut() {
                *n += 1.0;
                *o = *n;
            } else if is_true(v) {
                count = Some(0.0);
                *o = 0.0;
            } else {
                *o = f64::NAN;
            }
        }
    })
}

/// Upward cross: `a[i-1] < b[i-1]` and `a[i] > b[i]`.
pub fn cross(ctx: &Context, a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    cross_impl(ctx, a, b, Direction::Up)
}

/// Downward cross: `a[i-1] > b[i-1]` and `a[i] < b[i]`.
pub fn rcross(ctx: &Context, a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    cross_impl(ctx, a, b, Direction::Down)
}

/// Upward cross where each of the `n` preceding bars held `a < b`.
pub fn longcross(ctx: &Context, a: &[f64], b: &[f64], n: usize) -> Result<Vec<f64>> {
    long_cross_impl(ctx, a, b, n, Direction::Up)
}

/// Downward cross where each of the `n` preceding bars held `a > b`.
pub fn rlongcross(ctx: &Context, a: &[f64], b: &[f64], n: usize) -> Result<Vec<f64>> {
    long_cross_impl(ctx, a, b, n, Direction::Down)
}

/// Smallest count k such that the sum of the most recent k values reaches
/// `amount`; NaN where no prefix reaches it.
///
/// A NaN value inside the scanned span poisons the output. The SKIP_NAN
/// flag is not defined for this operator and is rejected.
pub fn sumbars(ctx: &Context, x: &[f64], amount: f64) -> Result<Vec<f64>> {
    if ctx.skip_nan() {
        return Err(Error::unsupported("SUMBARS does not support SKIP_NAN"));
    }
    if amount.is_nan() {
        return Err(Error::bad_parameter("amount", "must not be NaN"));
    }
    dispatch::unary(ctx, x, move |xg, og| {
        for (i, o) in og.iter_mut().enumerate() {
            let mut acc = 0.0;
            let mut found = f64::NAN;
            for k in 0..=i {
                let v = xg[i - k];
                if v.is_nan() {
                    break;
                }
                acc += v;
                if acc >= amount {
                    found = (k + 1) as f64;
                    break;
                }
            }
            *o = found;
        }
    })
}

#[derive(Clone, Copy)]
enum Direction {
    Up,
    Down,
}

impl Direction {
    /// The pre-cross side of the strict inequality.
    fn before(&self, a: f64, b: f64) -> bool {
        match self {
            Direction::Up => a < b,
            Direction::Down => a > b,
        }
    }

    /// The post-cross side of the strict inequality.
    fn after(&self, a: f64, b: f64) -> bool {
        match self {
            Direction::Up => a > b,
            Direction::Down => a < b,
        }
    }
}

fn cross_impl(ctx: &Context, a: &[f64], b: &[f64], dir: Direction) -> Result<Vec<f64>> {
    dispatch::binary(ctx, a, b, move |ag, bg, og| {
        for (i, o) in og.iter_mut().enumerate() {
            if i == 0 {
                *o = 0.0;
                continue;
            }
            let vals = [ag[i - 1], bg[i - 1], ag[i], bg[i]];
            if vals.iter().any(|v| v.is_nan()) {
                *o = f64::NAN;
                continue;
            }
            let fired = dir.before(ag[i - 1], bg[i - 1]) && dir.after(ag[i], bg[i]);
            *o = if fired { 1.0 } else { 0.0 };
        }
    })
}

fn long_cross_impl(
    ctx: &Context,
    a: &[f64],
    b: &[f64],
    n: usize,
    dir: Direction,
) -> Result<Vec<f64>> {
    require_window("n", n)?;
    dispatch::binary(ctx, a, b, move |ag, bg, og| {
        // run = consecutive preceding bars holding the pre-cross inequality
        let mut run = 0usize;
        for (i, o) in og.iter_mut().enumerate() {
            if ag[i].is_nan() || bg[i].is_nan() {
                *o = f64::NAN;
                run = 0;
                continue;
            }
            *o = if run >= n && dir.after(ag[i], bg[i]) {
                1.0
            } else {
                0.0
            };
            run = if dir.before(ag[i], bg[i]) { run + 1 } else { 0 };
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alpha_core::Flags;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (i, (&a, &e)) in actual.iter().zip(expected).enumerate() {
            let ok = (a.is_nan() && e.is_nan()) || (a - e).abs() < 1e-9;
            assert!(ok, "index {i}: got {a}, expected {e}");
        }
    }

    #[test]
    fn barslast_counts_from_each_true() {
        let ctx = Context::new(1);
        let c = [0.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let y = barslast(&ctx, &c).unwrap();
        assert_close(&y, &[f64::NAN, 0.0, 1.0, 2.0, 0.0, 1.0]);
    }

    #[test]
    fn barssince_counts_from_first_true() {
        let ctx = Context::new(1);
        let c = [0.0, 1.0, 0.0, 1.0, 0.0];
        let y = barssince(&ctx, &c).unwrap();
        assert_close(&y, &[f64::NAN, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn counters_hold_state_across_nan() {
        let ctx = Context::new(1);
        let c = [1.0, f64::NAN, 0.0];
        let y = barslast(&ctx, &c).unwrap();
        assert_close(&y, &[0.0, f64::NAN, 1.0]);
    }

    #[test]
    fn counters_reset_per_group() {
        let ctx = Context::new(2);
        let c = [1.0, 0.0, 0.0, 1.0];
        let y = barslast(&ctx, &c).unwrap();
        assert_close(&y, &[0.0, 1.0, f64::NAN, 0.0]);
    }

    #[test]
    fn cross_fires_on_strict_flip() {
        let ctx = Context::new(1);
        let a = [1.0, 3.0, 2.0, 4.0];
        let b = [2.0, 2.0, 3.0, 3.0];
        let up = cross(&ctx, &a, &b).unwrap();
        assert_close(&up, &[0.0, 1.0, 0.0, 1.0]);
        let down = rcross(&ctx, &a, &b).unwrap();
        assert_close(&down, &[0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn cross_ignores_touch() {
        let ctx = Context::new(1);
        let a = [2.0, 3.0];
        let b = [2.0, 2.0];
        // previous bar touched (a == b), no strict flip
        assert_close(&cross(&ctx, &a, &b).unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn cross_nan_propagates() {
        let ctx = Context::new(1);
        let a = [1.0, f64::NAN, 3.0, 4.0];
        let b = [2.0, 2.0, 2.0, 2.0];
        let y = cross(&ctx, &a, &b).unwrap();
        assert!(y[1].is_nan());
        assert!(y[2].is_nan());
        assert_close(&y[3..], &[0.0]);
    }

    #[test]
    fn longcross_requires_sustained_inequality() {
        let ctx = Context::new(1);
        let a = [1.0, 1.0, 1.0, 5.0, 1.0, 5.0];
        let b = [2.0, 2.0, 2.0, 2.0, 2.0, 2.0];
        let y = longcross(&ctx, &a, &b, 3).unwrap();
        // i=3: three preceding bars all a<b, and a>b now
        assert_close(&y, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn sumbars_smallest_prefix() {
        let ctx = Context::new(1);
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = sumbars(&ctx, &x, 5.0).unwrap();
        // i=2: 3+2 >= 5 -> 2 bars; i=3: 4+3 >= 5 -> 2 bars
        assert_close(&y, &[f64::NAN, f64::NAN, 2.0, 2.0]);
    }

    #[test]
    fn sumbars_rejects_skip_nan() {
        let ctx = Context::new(1).with_flags(Flags::SKIP_NAN);
        let err = sumbars(&ctx, &[1.0], 1.0).unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
    }
}
