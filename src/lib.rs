//! # alphalib
//!
//! Vectorized time-series operators for quantitative research, plus a
//! small expression compiler that turns formulaic alpha definitions
//! (WorldQuant-101 / GTJA-191 style) into Rust code over those operators.
//!
//! A flat `f64` slice of length N represents either one series or G
//! concatenated per-group series (group-major); the process-global
//! [`Context`] carries the group count and the warm-up/NaN policy flags.
//! Temporal operators are causal within each group; cross-sectional
//! operators reduce across groups at each time index.
//!
//! # Quick start
//!
//! ```
//! use alphalib::{configure, ExecContext, Flags};
//!
//! configure(1, Flags::empty());
//!
//! let mut ctx = ExecContext::new();
//! ctx.insert("CLOSE", vec![1.0, 2.0, 3.0, 4.0]).unwrap();
//!
//! let close = ctx.field("CLOSE").unwrap();
//! let m = ctx.ma(&close, 2.0).unwrap();
//! assert_eq!(m.as_slice(), &[1.0, 1.5, 2.5, 3.5]);
//! ```
//!
//! # Operator families
//!
//! | Family | Operators |
//! |--------|-----------|
//! | Shifting | REF/DELAY, DELTA |
//! | Windowed sums | SUM, PRODUCT, SUMIF, COUNT |
//! | Smoothers | MA, LWMA, SMA, DMA, EMA |
//! | Extremes | HHV, LLV, HHVBARS, LLVBARS |
//! | Statistics | VAR, STDDEV, COV, CORR, REGBETA, REGRESI, SLOPE, INTERCEPT, TS_CORRELATION |
//! | Rank | RANK, TS_RANK, BINS |
//! | Events | BARSLAST, BARSSINCE, CROSS, RCROSS, LONGCROSS, RLONGCROSS, SUMBARS |
//! | Cross-sectional | NEUTRALIZE |
//! | Forward return | FRET (non-causal, for labeling) |
//!
//! The kernel functions live in [`mod@kernels`] with explicit-context
//! signatures `(context, inputs..., params...) -> Result<Vec<f64>>`;
//! [`ExecContext`] wraps them behind the field-registry surface that
//! compiled formulas target. The compiler itself is re-exported from
//! [`alpha_lang`]: [`to_rust`], [`compile_module`], [`parse`].

#![warn(missing_docs)]
#![warn(clippy::all)]

mod exec;

pub use alpha_core::{configure, ctx, set_ctx, Context, Error, Flags, GroupLayout, Result, Series};
pub use alpha_lang::{compile_module, parse, referenced_fields, to_rust, CompileOptions};
pub use exec::ExecContext;

/// The operator kernel library (explicit-context calling convention).
pub use alpha_kernels as kernels;
