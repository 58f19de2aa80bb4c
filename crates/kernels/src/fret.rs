//! Forward return over a holding window
//!
//! FRET is the one deliberately non-causal operator in the library: it
//! looks `delay + periods - 1` bars ahead to price an entry at
//! `open[i + delay]` against an exit at `close[i + delay + periods - 1]`.
//! It exists to label training targets, not to feed back into signals.

use crate::dispatch;
use alpha_core::{Context, Error, Result};

/// Forward return `(close[i+delay+periods-1] - open[i+delay]) /
/// open[i+delay]` within each group.
///
/// NaN when any index runs past the group, when `is_calc[i+delay]` is
/// exactly 0 (the bar is not tradable), or when `is_calc` there is NaN.
/// Any other non-NaN `is_calc` value, fractional included, enables the
/// bar. A zero entry price yields NaN, never an infinity.
pub fn fret(
    ctx: &Context,
    open: &[f64],
    close: &[f64],
    is_calc: &[f64],
    delay: usize,
    periods: usize,
) -> Result<Vec<f64>> {
    if periods == 0 {
        return Err(Error::bad_parameter("periods", "must be at least 1"));
    }
    dispatch::ternary(ctx, open, close, is_calc, move |og, cg, ig, out| {
        let t = og.len();
        for (i, o) in out.iter_mut().enumerate() {
            let entry = i + delay;
            let exit = i + delay + periods - 1;
            if exit >= t {
                *o = f64::NAN;
                continue;
            }
            let gate = ig[entry];
            if gate.is_nan() || gate == 0.0 {
                *o = f64::NAN;
                continue;
            }
            let open_px = og[entry];
            *o = if open_px == 0.0 {
                f64::NAN
            } else {
                (cg[exit] - open_px) / open_px
            };
        }
    })
}
