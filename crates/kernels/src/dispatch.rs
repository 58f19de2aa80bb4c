//! Dispatch layer: single-vs-batch entry and per-group fan-out
//!
//! Inputs are either one flat series or a homogeneous batch of equal-length
//! series; the [`Input`]/[`Output`] pair models that as a tagged value so the
//! branch happens exactly once at the entry. Below the boundary, every
//! kernel splits its input into G contiguous group chunks and writes each
//! group's output to a disjoint slice, so the fan-out needs no locking.
//!
//! Parallelism is advisory: the context's hint of `1` forces sequential
//! execution, anything else lets the rayon pool schedule per-group and
//! per-batch-element tasks.

use alpha_core::{Context, Error, Result};
use rayon::prelude::*;
use tracing::trace;

/// One series or a homogeneous batch, decided by the caller.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    /// A single flat series.
    Series(&'a [f64]),
    /// A batch of same-length flat series, processed independently.
    Batch(&'a [&'a [f64]]),
}

/// Result arity mirrors input arity.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Result of a [`Input::Series`] call.
    Series(Vec<f64>),
    /// Parallel results of a [`Input::Batch`] call.
    Batch(Vec<Vec<f64>>),
}

impl Output {
    /// Unwrap a single-series result.
    pub fn into_series(self) -> Option<Vec<f64>> {
        match self {
            Output::Series(v) => Some(v),
            Output::Batch(_) => None,
        }
    }

    /// Unwrap a batch result.
    pub fn into_batch(self) -> Option<Vec<Vec<f64>>> {
        match self {
            Output::Series(_) => None,
            Output::Batch(v) => Some(v),
        }
    }
}

/// Map an operator over a single series or every element of a batch.
///
/// Batch elements must share one length; violations fail with `BadShape`
/// before any work is done. Batch elements run in parallel when the context
/// allows.
pub fn apply<F>(ctx: &Context, input: Input<'_>, op: F) -> Result<Output>
where
    F: Fn(&[f64]) -> Result<Vec<f64>> + Sync,
{
    match input {
        Input::Series(x) => Ok(Output::Series(op(x)?)),
        Input::Batch(arrays) => {
            if let Some(first) = arrays.first() {
                if let Some(bad) = arrays.iter().position(|a| a.len() != first.len()) {
                    return Err(Error::bad_shape(format!(
                        "batch element {bad} has length {}, expected {}",
                        arrays[bad].len(),
                        first.len()
                    )));
                }
            }
            trace!(elements = arrays.len(), groups = ctx.groups(), "dispatching batch");
            let results = if ctx.parallel_enabled() {
                arrays
                    .par_iter()
                    .map(|a| op(a))
                    .collect::<Result<Vec<_>>>()?
            } else {
                arrays.iter().map(|a| op(a)).collect::<Result<Vec<_>>>()?
            };
            Ok(Output::Batch(results))
        }
    }
}

/// Fan a per-group kernel out over every group of one input series.
///
/// The kernel receives `(group input, group output)` slice pairs; groups may
/// run in parallel because output chunks are disjoint.
pub(crate) fn unary<K>(ctx: &Context, x: &[f64], kernel: K) -> Result<Vec<f64>>
where
    K: Fn(&[f64], &mut [f64]) + Sync,
{
    let layout = ctx.layout(x.len())?;
    let mut out = vec![f64::NAN; x.len()];
    let t = layout.group_len();
    if t > 0 {
        if ctx.parallel_enabled() && layout.groups() > 1 {
            out.par_chunks_mut(t)
                .zip(x.par_chunks(t))
                .for_each(|(og, xg)| kernel(xg, og));
        } else {
            for (og, xg) in out.chunks_mut(t).zip(x.chunks(t)) {
                kernel(xg, og);
            }
        }
    }
    Ok(out)
}

/// Fan a per-group kernel out over two paired input series.
pub(crate) fn binary<K>(ctx: &Context, x: &[f64], y: &[f64], kernel: K) -> Result<Vec<f64>>
where
    K: Fn(&[f64], &[f64], &mut [f64]) + Sync,
{
    if x.len() != y.len() {
        return Err(Error::bad_shape(format!(
            "paired inputs have lengths {} and {}",
            x.len(),
            y.len()
        )));
    }
    let layout = ctx.layout(x.len())?;
    let mut out = vec![f64::NAN; x.len()];
    let t = layout.group_len();
    if t > 0 {
        if ctx.parallel_enabled() && layout.groups() > 1 {
            out.par_chunks_mut(t)
                .zip(x.par_chunks(t).zip(y.par_chunks(t)))
                .for_each(|(og, (xg, yg))| kernel(xg, yg, og));
        } else {
            for ((og, xg), yg) in out.chunks_mut(t).zip(x.chunks(t)).zip(y.chunks(t)) {
                kernel(xg, yg, og);
            }
        }
    }
    Ok(out)
}

/// Fan a per-group kernel out over three paired input series.
pub(crate) fn ternary<K>(
    ctx: &Context,
    x: &[f64],
    y: &[f64],
    z: &[f64],
    kernel: K,
) -> Result<Vec<f64>>
where
    K: Fn(&[f64], &[f64], &[f64], &mut [f64]) + Sync,
{
    if x.len() != y.len() || x.len() != z.len() {
        return Err(Error::bad_shape(format!(
            "paired inputs have lengths {}, {} and {}",
            x.len(),
            y.len(),
            z.len()
        )));
    }
    let layout = ctx.layout(x.len())?;
    let mut out = vec![f64::NAN; x.len()];
    let t = layout.group_len();
    if t > 0 {
        if ctx.parallel_enabled() && layout.groups() > 1 {
            out.par_chunks_mut(t)
                .zip(x.par_chunks(t).zip(y.par_chunks(t).zip(z.par_chunks(t))))
                .for_each(|(og, (xg, (yg, zg)))| kernel(xg, yg, zg, og));
        } else {
            for (((og, xg), yg), zg) in out
                .chunks_mut(t)
                .zip(x.chunks(t))
                .zip(y.chunks(t))
                .zip(z.chunks(t))
            {
                kernel(xg, yg, zg, og);
            }
        }
    }
    Ok(out)
}
