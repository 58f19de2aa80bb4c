//! Core types for the alphalib operator library
//!
//! This crate defines the foundation shared by the kernel library, the
//! dispatch layer, and the expression compiler:
//! - Context: per-call configuration snapshot (groups, flags, parallelism)
//! - Flags: the STRICTLY_CYCLE / SKIP_NAN policy bitset
//! - GroupLayout: the group-major flat-array decomposition
//! - Series: cheaply-clonable float series with elementwise operators
//! - Error: the library-wide error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod series;

pub use context::{configure, ctx, set_ctx, Context, Flags};
pub use error::{Error, Result};
pub use series::{GroupLayout, Series};
