//! Rank family: cross-sectional rank, rolling time-series rank, and
//! cross-sectional equal-count binning
//!
//! Cross-sectional operators work on the vector `{x[g*T + t]}` across
//! groups at each time index t. They are the one place the library sorts:
//! O(G log G) per time step, with scratch buffers reused across steps.
//!
//! Rank normalization: 0-based average rank divided by (non-NaN count − 1);
//! a singleton cross-section ranks 0.0. TS_RANK uses the same convention
//! within its window.

use crate::dispatch;
use crate::sums::require_window;
use crate::window::Policy;
use alpha_core::{Context, Error, Result};
use std::collections::VecDeque;

/// Cross-sectional percentile rank at each time index.
///
/// Ties receive the average of their 0-based positions; the result is
/// divided by (valid count − 1). NaN inputs stay NaN and do not count.
pub fn rank(ctx: &Context, x: &[f64]) -> Result<Vec<f64>> {
    let layout = ctx.layout(x.len())?;
    let (g, t) = (layout.groups(), layout.group_len());
    let mut out = vec![f64::NAN; x.len()];
    let mut order: Vec<usize> = Vec::with_capacity(g);
    for time in 0..t {
        order.clear();
        order.extend((0..g).filter(|gi| !x[gi * t + time].is_nan()));
        let cnt = order.len();
        if cnt == 0 {
            continue;
        }
        if cnt == 1 {
            out[order[0] * t + time] = 0.0;
            continue;
        }
        order.sort_unstable_by(|&a, &b| x[a * t + time].total_cmp(&x[b * t + time]));
        let denom = (cnt - 1) as f64;
        let mut s = 0;
        while s < cnt {
            let mut e = s + 1;
            while e < cnt && x[order[e] * t + time] == x[order[s] * t + time] {
                e += 1;
            }
            let avg_rank = (s + e - 1) as f64 / 2.0;
            for &gi in &order[s..e] {
                out[gi * t + time] = avg_rank / denom;
            }
            s = e;
        }
    }
    Ok(out)
}

/// Rolling percentile rank of `x[i]` among the last `periods` values of its
/// group. O(periods) per step.
pub fn ts_rank(ctx: &Context, x: &[f64], periods: usize) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    let policy = Policy::of(ctx);
    dispatch::unary(ctx, x, move |xg, og| {
        let mut window: VecDeque<f64> = VecDeque::with_capacity(periods);
        for (i, (&v, o)) in xg.iter().zip(og.iter_mut()).enumerate() {
            if !(policy.skip && v.is_nan()) {
                if window.len() == periods {
                    window.pop_front();
                }
                window.push_back(v);
            }
            *o = if policy.warming_up(i, periods) || v.is_nan() {
                f64::NAN
            } else if !policy.skip && window.iter().any(|w| w.is_nan()) {
                f64::NAN
            } else {
                let mut below = 0usize;
                let mut equal = 0usize;
                for &w in &window {
                    if w < v {
                        below += 1;
                    } else if w == v {
                        equal += 1;
                    }
                }
                let cnt = window.len();
                if cnt < 2 {
                    0.0
                } else {
                    let avg_rank = below as f64 + (equal - 1) as f64 / 2.0;
                    avg_rank / (cnt - 1) as f64
                }
            };
        }
    })
}

/// Cross-sectional discretization into `k` equal-count bins (0-based) at
/// each time index. Equal values land in the same bin; NaN stays NaN.
pub fn bins(ctx: &Context, x: &[f64], k: usize) -> Result<Vec<f64>> {
    if k == 0 {
        return Err(Error::bad_parameter("k", "must be at least 1"));
    }
    let layout = ctx.layout(x.len())?;
    let (g, t) = (layout.groups(), layout.group_len());
    let mut out = vec![f64::NAN; x.len()];
    let mut order: Vec<usize> = Vec::with_capacity(g);
    for time in 0..t {
        order.clear();
        order.extend((0..g).filter(|gi| !x[gi * t + time].is_nan()));
        let cnt = order.len();
        if cnt == 0 {
            continue;
        }
        order.sort_unstable_by(|&a, &b| x[a * t + time].total_cmp(&x[b * t + time]));
        let mut s = 0;
        while s < cnt {
            let mut e = s + 1;
            while e < cnt && x[order[e] * t + time] == x[order[s] * t + time] {
                e += 1;
            }
            // the run's bin comes from its first sorted position
            let bin = (s * k / cnt) as f64;
            for &gi in &order[s..e] {
                out[gi * t + time] = bin;
            }
            s = e;
        }
    }
    Ok(out)
}
