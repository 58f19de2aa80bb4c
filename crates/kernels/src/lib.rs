//! Vectorized sliding-window and cross-sectional operator kernels
//!
//! Every operator follows one calling convention: `(context, inputs...,
//! params...) -> Result<Vec<f64>>`, where the context snapshot supplies
//! the group count and the warm-up/NaN policy flags, inputs are flat
//! group-major slices, and the output always has the input length.
//! Temporal operators are causal within each group and never leak across
//! groups; cross-sectional operators (`rank`, `bins`, `neutralize`)
//! reduce *across* groups at each time index. The one deliberate
//! exception to causality is [`fret`], which prices forward returns.
//!
//! | Family | Operators |
//! |--------|-----------|
//! | Shifting | `delay` (REF/DELAY), `delta` |
//! | Windowed sums | `sum`, `product`, `sumif`, `count` |
//! | Smoothers | `ma`, `lwma`, `sma`, `dma`, `ema` |
//! | Extremes | `hhv`, `llv`, `hhvbars`, `llvbars` |
//! | Statistics | `var`, `stddev`, `cov`, `corr`, `regbeta`, `regresi`, `slope`, `intercept`, `ts_correlation` |
//! | Rank | `rank`, `ts_rank`, `bins` |
//! | Events | `barslast`, `barssince`, `cross`, `rcross`, `longcross`, `rlongcross`, `sumbars` |
//! | Cross-sectional | `neutralize` |
//! | Forward return | `fret` |
//! | Elementwise | `power`, `min2`, `max2`, `abs`, `sign`, `log`, `exp`, `sqrt`, `scale`, `sequence`, `select`, comparisons, `and`/`or` |
//!
//! The uppercase names in the table are the canonical DSL spellings; the
//! Rust surface is snake_case. Batched inputs go through
//! [`dispatch::apply`], which mirrors input arity in its output.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dispatch;
pub mod elementwise;
pub mod events;
pub mod extremes;
pub mod fret;
pub mod neutralize;
pub mod rank;
pub mod shift;
pub mod smooth;
pub mod stats;
pub mod sums;
mod window;

pub use dispatch::{apply, Input, Output};
pub use elementwise::{
    abs, and, eq, exp, ge, gt, le, log, lt, max2, min2, ne, or, power, scale, select, sequence,
    sign, sqrt,
};
pub use events::{barslast, barssince, cross, longcross, rcross, rlongcross, sumbars};
pub use extremes::{hhv, hhvbars, llv, llvbars};
pub use fret::fret;
pub use neutralize::neutralize;
pub use rank::{bins, rank, ts_rank};
pub use shift::{delay, delta};
pub use smooth::{dma, ema, lwma, ma, sma};
pub use stats::{cov, corr, intercept, regbeta, regresi, slope, stddev, ts_correlation, var};
pub use sums::{count, product, sum, sumif};
