//! Windowed sums, products, and conditional reductions

use crate::dispatch;
use crate::window::{Policy, Window};
use alpha_core::{Context, Error, Result};
use std::collections::VecDeque;

/// Truth convention for f64 predicate series: nonzero is true, NaN is not
/// true.
#[inline]
pub(crate) fn is_true(v: f64) -> bool {
    v != 0.0 && !v.is_nan()
}

/// Rolling sum over the last `periods` values (inclusive of the current
/// bar). `periods == 0` means cumulative since group start.
pub fn sum(ctx: &Context, x: &[f64], periods: usize) -> Result<Vec<f64>> {
    let policy = Policy::of(ctx);
    dispatch::unary(ctx, x, move |xg, og| {
        let mut win = Window::new(periods, policy.skip);
        for (i, (&v, o)) in xg.iter().zip(og.iter_mut()).enumerate() {
            win.push(v);
            *o = if policy.warming_up(i, periods) || v.is_nan() || win.poisoned() {
                f64::NAN
            } else {
                win.sum()
            };
        }
    })
}

/// Rolling product over the last `periods` values. `periods == 0` means
/// cumulative since group start.
///
/// Maintained as a rolling sum of log-magnitudes plus zero and sign
/// counters, so each step is O(1) even for large windows.
pub fn product(ctx: &Context, x: &[f64], periods: usize) -> Result<Vec<f64>> {
    let policy = Policy::of(ctx);
    dispatch::unary(ctx, x, move |xg, og| {
        let mut win = ProductWindow::new(periods, policy.skip);
        for (i, (&v, o)) in xg.iter().zip(og.iter_mut()).enumerate() {
            win.push(v);
            *o = if policy.warming_up(i, periods) || v.is_nan() || win.poisoned() {
                f64::NAN
            } else {
                win.value()
            };
        }
    })
}

/// Rolling sum of `x` where the predicate `c` is true at the same position.
///
/// A bar contributes `x[i]` when `c[i]` is true (nonzero), `0` when false,
/// and NaN when either `x[i]` (with `c[i]` true) or `c[i]` itself is NaN.
pub fn sumif(ctx: &Context, x: &[f64], c: &[f64], periods: usize) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    let policy = Policy::of(ctx);
    dispatch::binary(ctx, x, c, move |xg, cg, og| {
        let mut win = Window::new(periods, policy.skip);
        for (i, o) in og.iter_mut().enumerate() {
            let z = if cg[i].is_nan() {
                f64::NAN
            } else if is_true(cg[i]) {
                xg[i]
            } else {
                0.0
            };
            win.push(z);
            *o = if policy.warming_up(i, periods) || z.is_nan() || win.poisoned() {
                f64::NAN
            } else {
                win.sum()
            };
        }
    })
}

/// Rolling count of true predicate entries, returned as float64.
pub fn count(ctx: &Context, c: &[f64], periods: usize) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    let policy = Policy::of(ctx);
    dispatch::unary(ctx, c, move |cg, og| {
        let mut win = Window::new(periods, policy.skip);
        for (i, (&v, o)) in cg.iter().zip(og.iter_mut()).enumerate() {
            let z = if v.is_nan() {
                f64::NAN
            } else if is_true(v) {
                1.0
            } else {
                0.0
            };
            win.push(z);
            *o = if policy.warming_up(i, periods) || v.is_nan() || win.poisoned() {
                f64::NAN
            } else {
                win.sum()
            };
        }
    })
}

/// Reject `periods == 0` for kernels where cumulative mode is undefined.
pub(crate) fn require_window(name: &'static str, periods: usize) -> Result<()> {
    if periods == 0 {
        return Err(Error::bad_parameter(
            name,
            "must be at least 1 (0 is only meaningful for SUM/PRODUCT)",
        ));
    }
    Ok(())
}

/// Rolling product state: zero counter, negative-sign counter, and a
/// running sum of log-magnitudes over the nonzero values in the window.
#[derive(Debug)]
struct ProductWindow {
    period: usize,
    skip: bool,
    values: VecDeque<f64>,
    len: usize,
    nan_in_window: usize,
    zeros: usize,
    negatives: usize,
    log_abs_sum: f64,
}

impl ProductWindow {
    fn new(period: usize, skip: bool) -> Self {
        ProductWindow {
            period,
            skip,
            values: VecDeque::with_capacity(period),
            len: 0,
            nan_in_window: 0,
            zeros: 0,
            negatives: 0,
            log_abs_sum: 0.0,
        }
    }

    fn admit(&mut self, x: f64) {
        if x.is_nan() {
            self.nan_in_window += 1;
        } else if x == 0.0 {
            self.zeros += 1;
        } else {
            if x < 0.0 {
                self.negatives += 1;
            }
            self.log_abs_sum += x.abs().ln();
        }
    }

    fn retire(&mut self, x: f64) {
        if x.is_nan() {
            self.nan_in_window -= 1;
        } else if x == 0.0 {
            self.zeros -= 1;
        } else {
            if x < 0.0 {
                self.negatives -= 1;
            }
            self.log_abs_sum -= x.abs().ln();
        }
    }

    fn push(&mut self, x: f64) {
        if self.skip && x.is_nan() {
            return;
        }
        if self.period > 0 && self.len == self.period {
            if let Some(old) = self.values.pop_front() {
                self.retire(old);
            }
            self.values.push_back(x);
        } else {
            self.len += 1;
            if self.period > 0 {
                self.values.push_back(x);
            }
        }
        self.admit(x);
    }

    fn poisoned(&self) -> bool {
        self.nan_in_window > 0
    }

    fn value(&self) -> f64 {
        if self.zeros > 0 {
            return 0.0;
        }
        let magnitude = self.log_abs_sum.exp();
        if self.negatives % 2 == 1 {
            -magnitude
        } else {
            magnitude
        }
    }
}
