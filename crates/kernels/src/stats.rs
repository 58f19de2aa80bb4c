//! Cross-temporal statistics: variance, covariance, correlation, and
//! rolling regressions
//!
//! Everything here runs on running sums (x, y, x², y², xy) maintained by
//! the shared window accumulators. Sample statistics use the n−1
//! denominator; tiny negative variances from cancellation are clamped to
//! zero before square roots; near-constant series are reported as NaN
//! through a variance floor instead of exploding.

use crate::dispatch;
use crate::sums::require_window;
use crate::window::{PairWindow, Policy, Window};
use alpha_core::{Context, Result};

/// Variance floor below which a series is treated as constant.
const VAR_EPS: f64 = 1e-12;

/// Rolling sample variance (denominator `count - 1`).
pub fn var(ctx: &Context, x: &[f64], periods: usize) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    let policy = Policy::of(ctx);
    dispatch::unary(ctx, x, move |xg, og| {
        let mut win = Window::new(periods, policy.skip);
        for (i, (&v, o)) in xg.iter().zip(og.iter_mut()).enumerate() {
            win.push(v);
            *o = if policy.warming_up(i, periods) || v.is_nan() || win.poisoned() {
                f64::NAN
            } else {
                sample_var(win.sum(), win.sum_sq(), win.count())
            };
        }
    })
}

/// Rolling sample standard deviation.
pub fn stddev(ctx: &Context, x: &[f64], periods: usize) -> Result<Vec<f64>> {
    let mut out = var(ctx, x, periods)?;
    for v in &mut out {
        *v = v.sqrt();
    }
    Ok(out)
}

/// Rolling sample covariance of two paired series.
pub fn cov(ctx: &Context, x: &[f64], y: &[f64], periods: usize) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    let policy = Policy::of(ctx);
    dispatch::binary(ctx, x, y, move |xg, yg, og| {
        let mut win = PairWindow::new(periods, policy.skip);
        for (i, o) in og.iter_mut().enumerate() {
            win.push(xg[i], yg[i]);
            let nan_here = xg[i].is_nan() || yg[i].is_nan();
            *o = if policy.warming_up(i, periods) || nan_here || win.poisoned() {
                f64::NAN
            } else {
                let (sx, sy, _, _, sxy) = win.sums();
                let n = win.count();
                if n < 2 {
                    f64::NAN
                } else {
                    (sxy - sx * sy / n as f64) / (n - 1) as f64
                }
            };
        }
    })
}

/// Rolling Pearson correlation of two paired series.
///
/// If either series is near-constant inside the window (population variance
/// below the floor) the output is NaN.
pub fn corr(ctx: &Context, x: &[f64], y: &[f64], periods: usize) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    let policy = Policy::of(ctx);
    dispatch::binary(ctx, x, y, move |xg, yg, og| {
        let mut win = PairWindow::new(periods, policy.skip);
        for (i, o) in og.iter_mut().enumerate() {
            win.push(xg[i], yg[i]);
            let nan_here = xg[i].is_nan() || yg[i].is_nan();
            *o = if policy.warming_up(i, periods) || nan_here || win.poisoned() {
                f64::NAN
            } else {
                let (sx, sy, sxx, syy, sxy) = win.sums();
                pearson(sx, sy, sxx, syy, sxy, win.count())
            };
        }
    })
}

/// Rolling regression slope of `y` on `x`: `cov(x, y) / var(x)`.
pub fn regbeta(ctx: &Context, y: &[f64], x: &[f64], periods: usize) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    let policy = Policy::of(ctx);
    dispatch::binary(ctx, y, x, move |yg, xg, og| {
        let mut win = PairWindow::new(periods, policy.skip);
        for (i, o) in og.iter_mut().enumerate() {
            win.push(xg[i], yg[i]);
            let nan_here = xg[i].is_nan() || yg[i].is_nan();
            *o = if policy.warming_up(i, periods) || nan_here || win.poisoned() {
                f64::NAN
            } else {
                let (sx, sy, sxx, _, sxy) = win.sums();
                beta(sx, sy, sxx, sxy, win.count())
            };
        }
    })
}

/// Rolling regression residual: `y[i] - (alpha + beta * x[i])` for the
/// window's least-squares fit of `y` on `x`.
pub fn regresi(ctx: &Context, y: &[f64], x: &[f64], periods: usize) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    let policy = Policy::of(ctx);
    dispatch::binary(ctx, y, x, move |yg, xg, og| {
        let mut win = PairWindow::new(periods, policy.skip);
        for (i, o) in og.iter_mut().enumerate() {
            win.push(xg[i], yg[i]);
            let nan_here = xg[i].is_nan() || yg[i].is_nan();
            *o = if policy.warming_up(i, periods) || nan_here || win.poisoned() {
                f64::NAN
            } else {
                let (sx, sy, sxx, _, sxy) = win.sums();
                let n = win.count();
                let b = beta(sx, sy, sxx, sxy, n);
                if b.is_nan() {
                    f64::NAN
                } else {
                    let a = (sy - b * sx) / n as f64;
                    yg[i] - (a + b * xg[i])
                }
            };
        }
    })
}

/// Rolling regression slope of the window against the sequence 0..k-1.
pub fn slope(ctx: &Context, x: &[f64], periods: usize) -> Result<Vec<f64>> {
    time_regression(ctx, x, periods, TimeFit::Slope)
}

/// Rolling regression intercept of the window against the sequence 0..k-1.
pub fn intercept(ctx: &Context, x: &[f64], periods: usize) -> Result<Vec<f64>> {
    time_regression(ctx, x, periods, TimeFit::Intercept)
}

/// Rolling correlation of the window values with the time index.
pub fn ts_correlation(ctx: &Context, x: &[f64], periods: usize) -> Result<Vec<f64>> {
    time_regression(ctx, x, periods, TimeFit::Correlation)
}

#[derive(Clone, Copy)]
enum TimeFit {
    Slope,
    Intercept,
    Correlation,
}

/// Regressions against the in-window time coordinates 0..k-1. The
/// coordinate sums are closed-form and `sum(j * v_j)` comes from the
/// window's weighted-sum accumulator, so each step is O(1).
fn time_regression(ctx: &Context, x: &[f64], periods: usize, fit: TimeFit) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    let policy = Policy::of(ctx);
    dispatch::unary(ctx, x, move |xg, og| {
        let mut win = Window::new(periods, policy.skip);
        for (i, (&v, o)) in xg.iter().zip(og.iter_mut()).enumerate() {
            win.push(v);
            if policy.warming_up(i, periods) || v.is_nan() || win.poisoned() || win.count() < 2 {
                *o = f64::NAN;
                continue;
            }
            let k = win.count() as f64;
            let sv = win.sum();
            // weights run 1..=k, coordinates 0..k-1
            let sjv = win.weighted_sum() - sv;
            let sj = k * (k - 1.0) / 2.0;
            let sjj = (k - 1.0) * k * (2.0 * k - 1.0) / 6.0;
            let denom = k * sjj - sj * sj;
            let b = (k * sjv - sj * sv) / denom;
            *o = match fit {
                TimeFit::Slope => b,
                TimeFit::Intercept => (sv - b * sj) / k,
                TimeFit::Correlation => {
                    pearson(sj, sv, sjj, win.sum_sq(), sjv, win.count())
                }
            };
        }
    })
}

/// Sample variance from running sums; tiny negatives clamp to zero.
fn sample_var(sum: f64, sum_sq: f64, n: usize) -> f64 {
    if n < 2 {
        return f64::NAN;
    }
    let nf = n as f64;
    let v = (sum_sq - sum * sum / nf) / (nf - 1.0);
    v.max(0.0)
}

/// Regression slope from running sums; NaN when x is near-constant.
fn beta(sx: f64, sy: f64, sxx: f64, sxy: f64, n: usize) -> f64 {
    if n < 2 {
        return f64::NAN;
    }
    let nf = n as f64;
    let var_x = (sxx / nf - (sx / nf) * (sx / nf)).max(0.0);
    if var_x < VAR_EPS {
        return f64::NAN;
    }
    (nf * sxy - sx * sy) / (nf * sxx - sx * sx)
}

/// Pearson correlation from running sums with the variance floor applied.
fn pearson(sx: f64, sy: f64, sxx: f64, syy: f64, sxy: f64, n: usize) -> f64 {
    if n < 2 {
        return f64::NAN;
    }
    let nf = n as f64;
    let (mx, my) = (sx / nf, sy / nf);
    let px = (sxx / nf - mx * mx).max(0.0);
    let py = (syy / nf - my * my).max(0.0);
    if px < VAR_EPS || py < VAR_EPS {
        return f64::NAN;
    }
    let r = (sxy / nf - mx * my) / (px * py).sqrt();
    r.clamp(-1.0, 1.0)
}
