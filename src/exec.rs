//! Evaluation context for compiled and hand-written alphas
//!
//! [`ExecContext`] is the dispatcher the generated code targets: a field
//! registry plus one method per canonical operator, each delegating to the
//! kernel library with the context snapshot taken at construction. Scalar
//! parameters arrive as f64 (the DSL has one number type) and are
//! truncated to whole periods the way the formulas expect.

use alpha_core::{ctx, Context, Error, Result, Series};
use alpha_kernels as kernels;
use std::collections::HashMap;

/// Field registry + operator dispatcher over one context snapshot.
///
/// All fields must share one length, which also fixes the length of
/// [`ExecContext::constant`]. The context snapshot is taken once; later
/// changes to the global context do not affect an existing `ExecContext`.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    context: Context,
    fields: HashMap<String, Series>,
    len: usize,
}

/// Convert a DSL scalar into a whole period count.
fn to_period(name: &'static str, v: f64) -> Result<usize> {
    if !v.is_finite() || v < 0.0 {
        return Err(Error::bad_parameter(
            name,
            format!("must be a non-negative finite number, got {v}"),
        ));
    }
    Ok(v as usize)
}

macro_rules! window_ops {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(&self, x: &Series, periods: f64) -> Result<Series> {
                let w = to_period("periods", periods)?;
                Ok(Series::new(kernels::$name(&self.context, x.as_slice(), w)?))
            }
        )*
    };
}

macro_rules! paired_window_ops {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(&self, a: &Series, b: &Series, periods: f64) -> Result<Series> {
                let w = to_period("periods", periods)?;
                Ok(Series::new(kernels::$name(
                    &self.context,
                    a.as_slice(),
                    b.as_slice(),
                    w,
                )?))
            }
        )*
    };
}

macro_rules! elementwise_pair_ops {
    ($($(#[$doc:meta])* $name:ident => $kernel:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(&self, a: &Series, b: &Series) -> Result<Series> {
                Ok(Series::new(kernels::$kernel(a.as_slice(), b.as_slice())?))
            }
        )*
    };
}

macro_rules! elementwise_unary_ops {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(&self, x: &Series) -> Result<Series> {
                Ok(Series::new(kernels::$name(x.as_slice())))
            }
        )*
    };
}

impl ExecContext {
    /// Create an empty context over the current global context snapshot.
    pub fn new() -> Self {
        Self::with_context(ctx())
    }

    /// Create an empty context over an explicit context snapshot.
    pub fn with_context(context: Context) -> Self {
        ExecContext {
            context,
            fields: HashMap::new(),
            len: 0,
        }
    }

    /// The context snapshot this dispatcher runs under.
    pub fn context(&self) -> Context {
        self.context
    }

    /// Shared length of every registered field.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether any field has been registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Register a data field. Every field must share one length, and that
    /// length must split into the context's groups.
    pub fn insert(&mut self, name: impl Into<String>, values: impl Into<Series>) -> Result<()> {
        let series = values.into();
        if self.fields.is_empty() {
            self.context.layout(series.len())?;
            self.len = series.len();
        } else if series.len() != self.len {
            return Err(Error::bad_shape(format!(
                "field length {} does not match the registered length {}",
                series.len(),
                self.len
            )));
        }
        self.fields.insert(name.into(), series);
        Ok(())
    }

    /// Look up a field; repeated reads return the same values.
    pub fn field(&self, name: &str) -> Result<Series> {
        self.fields
            .get(name)
            .cloned()
            .ok_or_else(|| Error::unknown_field(name))
    }

    /// A constant broadcast to the registered field length.
    pub fn constant(&self, v: f64) -> Series {
        Series::splat(v, self.len)
    }

    window_ops! {
        /// REF/DELAY: shift back by whole bars.
        delay,
        /// DELTA: difference against the value `periods` bars back.
        delta,
        /// SUM: rolling sum (0 = cumulative).
        sum,
        /// PRODUCT: rolling product (0 = cumulative).
        product,
        /// COUNT: rolling count of true entries.
        count,
        /// MA/MEAN: simple moving average.
        ma,
        /// LWMA/DECAY_LINEAR: linear-weighted moving average.
        lwma,
        /// EMA: exponential moving average, alpha = 2/(periods+1).
        ema,
        /// HHV/TSMAX: rolling highest value.
        hhv,
        /// LLV/TSMIN: rolling lowest value.
        llv,
        /// HHVBARS: offset back to the rolling maximum.
        hhvbars,
        /// LLVBARS: offset back to the rolling minimum.
        llvbars,
        /// VAR: rolling sample variance.
        var,
        /// STD/STDDEV: rolling sample standard deviation.
        stddev,
        /// SLOPE: rolling regression slope against the time index.
        slope,
        /// INTERCEPT: rolling regression intercept against the time index.
        intercept,
        /// TS_CORRELATION: rolling correlation with the time index.
        ts_correlation,
        /// TSRANK: rolling percentile rank within the window.
        ts_rank,
        /// BINS: cross-sectional equal-count bins.
        bins,
    }

    paired_window_ops! {
        /// SUMIF: rolling sum of `a` where the predicate `b` holds.
        sumif,
        /// COV: rolling sample covariance.
        cov,
        /// CORR: rolling Pearson correlation.
        corr,
        /// REGBETA: rolling regression slope of `a` on `b`.
        regbeta,
        /// REGRESI: rolling regression residual of `a` on `b`.
        regresi,
    }

    elementwise_pair_ops! {
        /// POWER/SIGNEDPOWER: elementwise power.
        power => power,
        /// MIN: elementwise minimum.
        min => min2,
        /// MAX: elementwise maximum.
        max => max2,
        /// Elementwise `a > b` as 0/1.
        gt => gt,
        /// Elementwise `a >= b` as 0/1.
        ge => ge,
        /// Elementwise `a < b` as 0/1.
        lt => lt,
        /// Elementwise `a <= b` as 0/1.
        le => le,
        /// Elementwise `a == b` as 0/1.
        eq => eq,
        /// Elementwise `a != b` as 0/1.
        ne => ne,
        /// Elementwise logical AND on 0/1 floats.
        and => and,
        /// Elementwise logical OR on 0/1 floats.
        or => or,
    }

    elementwise_unary_ops! {
        /// ABS: elementwise absolute value.
        abs,
        /// SIGN: elementwise sign.
        sign,
        /// LOG: elementwise natural log.
        log,
        /// EXP: elementwise exponential.
        exp,
        /// SQRT: elementwise square root.
        sqrt,
    }

    /// RANK: cross-sectional percentile rank at each time index.
    pub fn rank(&self, x: &Series) -> Result<Series> {
        Ok(Series::new(kernels::rank(&self.context, x.as_slice())?))
    }

    /// SMA: streaming smoother `(m*x + (n-m)*prev) / n`.
    pub fn sma(&self, x: &Series, n: f64, m: f64) -> Result<Series> {
        let n = to_period("n", n)?;
        let m = to_period("m", m)?;
        Ok(Series::new(kernels::sma(&self.context, x.as_slice(), n, m)?))
    }

    /// DMA: streaming smoother `alpha*x + (1-alpha)*prev`.
    pub fn dma(&self, x: &Series, alpha: f64) -> Result<Series> {
        Ok(Series::new(kernels::dma(&self.context, x.as_slice(), alpha)?))
    }

    /// TS_ARGMAX: `periods` minus the offset back to the rolling maximum.
    pub fn ts_argmax(&self, x: &Series, periods: f64) -> Result<Series> {
        let w = to_period("periods", periods)?;
        let bars = kernels::hhvbars(&self.context, x.as_slice(), w)?;
        Ok(Series::new(bars.into_iter().map(|b| w as f64 - b).collect()))
    }

    /// TS_ARGMIN: `periods` minus the offset back to the rolling minimum.
    pub fn ts_argmin(&self, x: &Series, periods: f64) -> Result<Series> {
        let w = to_period("periods", periods)?;
        let bars = kernels::llvbars(&self.context, x.as_slice(), w)?;
        Ok(Series::new(bars.into_iter().map(|b| w as f64 - b).collect()))
    }

    /// BARSLAST: bars since the predicate was most recently true.
    pub fn barslast(&self, c: &Series) -> Result<Series> {
        Ok(Series::new(kernels::barslast(&self.context, c.as_slice())?))
    }

    /// BARSSINCE: bars since the predicate was first true.
    pub fn barssince(&self, c: &Series) -> Result<Series> {
        Ok(Series::new(kernels::barssince(&self.context, c.as_slice())?))
    }

    /// CROSS: upward cross of `a` over `b`.
    pub fn cross(&self, a: &Series, b: &Series) -> Result<Series> {
        Ok(Series::new(kernels::cross(
            &self.context,
            a.as_slice(),
            b.as_slice(),
        )?))
    }

    /// RCROSS: downward cross of `a` under `b`.
    pub fn rcross(&self, a: &Series, b: &Series) -> Result<Series> {
        Ok(Series::new(kernels::rcross(
            &self.context,
            a.as_slice(),
            b.as_slice(),
        )?))
    }

    /// LONGCROSS: upward cross after `n` bars of `a < b`.
    pub fn longcross(&self, a: &Series, b: &Series, n: f64) -> Result<Series> {
        let n = to_period("n", n)?;
        Ok(Series::new(kernels::longcross(
            &self.context,
            a.as_slice(),
            b.as_slice(),
            n,
        )?))
    }

    /// RLONGCROSS: downward cross after `n` bars of `a > b`.
    pub fn rlongcross(&self, a: &Series, b: &Series, n: f64) -> Result<Series> {
        let n = to_period("n", n)?;
        Ok(Series::new(kernels::rlongcross(
            &self.context,
            a.as_slice(),
            b.as_slice(),
            n,
        )?))
    }

    /// SUMBARS: smallest k whose recent-k sum reaches `amount`.
    pub fn sumbars(&self, x: &Series, amount: f64) -> Result<Series> {
        Ok(Series::new(kernels::sumbars(
            &self.context,
            x.as_slice(),
            amount,
        )?))
    }

    /// NEUTRALIZE: residual against same-category cross-sectional means.
    pub fn neutralize(&self, category: &Series, value: &Series) -> Result<Series> {
        Ok(Series::new(kernels::neutralize(
            &self.context,
            category.as_slice(),
            value.as_slice(),
        )?))
    }

    /// FRET: forward return over a holding window (non-causal).
    pub fn fret(
        &self,
        open: &Series,
        close: &Series,
        is_calc: &Series,
        delay: f64,
        periods: f64,
    ) -> Result<Series> {
        let d = to_period("delay", delay)?;
        let p = to_period("periods", periods)?;
        Ok(Series::new(kernels::fret(
            &self.context,
            open.as_slice(),
            close.as_slice(),
            is_calc.as_slice(),
            d,
            p,
        )?))
    }

    /// SELECT: elementwise `c ? a : b`.
    pub fn select(&self, c: &Series, a: &Series, b: &Series) -> Result<Series> {
        Ok(Series::new(kernels::select(
            c.as_slice(),
            a.as_slice(),
            b.as_slice(),
        )?))
    }

    /// SCALE: rescale so absolute values sum to `k`.
    pub fn scale(&self, x: &Series, k: f64) -> Result<Series> {
        Ok(Series::new(kernels::scale(x.as_slice(), k)))
    }

    /// SEQUENCE: the values 0..=periods.
    pub fn sequence(&self, periods: f64) -> Result<Series> {
        let w = to_period("periods", periods)?;
        Ok(Series::new(kernels::sequence(w)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alpha_core::Flags;

    fn sample() -> ExecContext {
        let mut ec = ExecContext::with_context(Context::new(1));
        ec.insert("CLOSE", vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        ec.insert("OPEN", vec![1.0, 1.0, 4.0, 3.0]).unwrap();
        ec
    }

    #[test]
    fn field_lookup_and_identity() {
        let ec = sample();
        let a = ec.field("CLOSE").unwrap();
        let b = ec.field("CLOSE").unwrap();
        assert_eq!(a, b);
        assert!(ec.field("VWAP").unwrap_err().to_string().contains("VWAP"));
    }

    #[test]
    fn insert_validates_lengths() {
        let mut ec = ExecContext::with_context(Context::new(2));
        assert!(ec.insert("ODD", vec![1.0, 2.0, 3.0]).is_err());
        ec.insert("A", vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!(ec.insert("B", vec![1.0]).unwrap_err().is_shape());
    }

    #[test]
    fn constant_matches_field_length() {
        let ec = sample();
        assert_eq!(ec.constant(2.5).as_slice(), &[2.5, 2.5, 2.5, 2.5]);
    }

    #[test]
    fn window_methods_truncate_scalar_periods() {
        let ec = sample();
        let close = ec.field("CLOSE").unwrap();
        let m = ec.ma(&close, 2.9).unwrap();
        assert_eq!(m.as_slice(), &[1.0, 1.5, 2.5, 3.5]);
        assert!(ec.ma(&close, -1.0).unwrap_err().is_parameter());
        assert!(ec.ma(&close, f64::NAN).unwrap_err().is_parameter());
    }

    #[test]
    fn ts_argmax_complements_hhvbars() {
        let ec = sample();
        let close = ec.field("CLOSE").unwrap();
        let arg = ec.ts_argmax(&close, 3.0).unwrap();
        let bars = ec.hhvbars(&close, 3.0).unwrap();
        for (a, b) in arg.iter().zip(bars.iter()) {
            assert!((a + b - 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn snapshot_is_fixed_at_construction() {
        let ec = ExecContext::with_context(Context::new(2).with_flags(Flags::SKIP_NAN));
        assert_eq!(ec.context().groups(), 2);
        assert!(ec.context().skip_nan());
    }

    #[test]
    fn select_follows_predicate() {
        let ec = sample();
        let c = ec.gt(&ec.field("CLOSE").unwrap(), &ec.field("OPEN").unwrap()).unwrap();
        let y = ec
            .select(&c, &ec.constant(1.0), &ec.constant(-1.0))
            .unwrap();
        assert_eq!(y.as_slice(), &[-1.0, 1.0, -1.0, 1.0]);
    }
}
