//! Alpha expression compiler
//!
//! Parses the infix alpha DSL (arithmetic, comparisons, `?:` selection,
//! `&&`/`||`, `^` power, uppercase kernel calls) and emits Rust source that
//! routes every operation through an `ExecContext` dispatcher. The grammar
//! is unambiguous and small enough for a hand-written recursive-descent
//! parser; parse failures report line and column.
//!
//! ```
//! use alpha_lang::{to_rust, CompileOptions};
//!
//! let code = to_rust(
//!     "alpha_ratio",
//!     "CLOSE / DELAY(CLOSE, 1) - 1",
//!     &CompileOptions::default(),
//! )
//! .unwrap();
//! assert!(code.contains("ctx.delay(&close, 1.0)?"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod codegen;
pub mod lexer;
pub mod parser;

pub use ast::{BinOp, Expr};
pub use codegen::{compile_module, referenced_fields, to_rust, CompileOptions};
pub use parser::parse;
