//! Moving averages and streaming smoothers

use crate::dispatch;
use crate::sums::require_window;
use crate::window::{Policy, Window};
use alpha_core::{Context, Error, Result};

/// Simple arithmetic moving average over the last `periods` values.
///
/// Partial windows are averaged over the values available unless
/// STRICTLY_CYCLE is set.
pub fn ma(ctx: &Context, x: &[f64], periods: usize) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    let policy = Policy::of(ctx);
    dispatch::unary(ctx, x, move |xg, og| {
        let mut win = Window::new(periods, policy.skip);
        for (i, (&v, o)) in xg.iter().zip(og.iter_mut()).enumerate() {
            win.push(v);
            *o = if policy.warming_up(i, periods)
                || v.is_nan()
                || win.poisoned()
                || win.count() == 0
            {
                f64::NAN
            } else {
                win.sum() / win.count() as f64
            };
        }
    })
}

/// Linear-weighted moving average: weights 1..=periods with the heaviest
/// weight on the newest value, normalized by the weight sum. Partial
/// windows use weights 1..=len.
pub fn lwma(ctx: &Context, x: &[f64], periods: usize) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    let policy = Policy::of(ctx);
    dispatch::unary(ctx, x, move |xg, og| {
        let mut win = Window::new(periods, policy.skip);
        for (i, (&v, o)) in xg.iter().zip(og.iter_mut()).enumerate() {
            win.push(v);
            let k = win.count();
            *o = if policy.warming_up(i, periods) || v.is_nan() || win.poisoned() || k == 0 {
                f64::NAN
            } else {
                let norm = (k * (k + 1)) as f64 / 2.0;
                win.weighted_sum() / norm
            };
        }
    })
}

/// Streaming smoother `y[i] = (m*x[i] + (n-m)*y[i-1]) / n`, seeded with
/// `y[0] = x[0]`.
///
/// This is a recurrence, not a window: the warm-up and NaN-skip flags do
/// not apply. A NaN input yields a NaN output and leaves the recurrence
/// state unchanged.
pub fn sma(ctx: &Context, x: &[f64], n: usize, m: usize) -> Result<Vec<f64>> {
    if n == 0 {
        return Err(Error::bad_parameter("n", "must be at least 1"));
    }
    if m == 0 {
        return Err(Error::bad_parameter("m", "must be at least 1"));
    }
    let (nf, mf) = (n as f64, m as f64);
    dispatch::unary(ctx, x, move |xg, og| {
        recurrence_group(xg, og, |prev, v| match prev {
            None => v,
            Some(p) => (mf * v + (nf - mf) * p) / nf,
        });
    })
}

/// Streaming smoother `y[i] = alpha*x[i] + (1-alpha)*y[i-1]`, seeded with
/// `y[0] = x[0]`. `alpha` must lie in `[0, 1]`.
pub fn dma(ctx: &Context, x: &[f64], alpha: f64) -> Result<Vec<f64>> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(Error::bad_parameter("alpha", "must lie in [0, 1]"));
    }
    dispatch::unary(ctx, x, move |xg, og| {
        recurrence_group(xg, og, |prev, v| match prev {
            None => v,
            Some(p) => alpha * v + (1.0 - alpha) * p,
        });
    })
}

/// Exponential moving average with `alpha = 2 / (periods + 1)`.
///
/// Exactly equivalent to `sma(x, periods + 1, 2)`.
pub fn ema(ctx: &Context, x: &[f64], periods: usize) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    sma(ctx, x, periods + 1, 2)
}

/// Run a seeded recurrence over one group, carrying state across NaN
/// inputs without updating it.
fn recurrence_group(xg: &[f64], og: &mut [f64], step: impl Fn(Option<f64>, f64) -> f64) {
    let mut prev: Option<f64> = None;
    for (&v, o) in xg.iter().zip(og.iter_mut()) {
        if v.is_nan() {
            *o = f64::NAN;
            continue;
        }
        let y = step(prev, v);
        prev = Some(y);
        *o = y;
    }
}
