//! Error types for the alphalib operator library
//!
//! A single `Error` enum covers every failure the library can surface.
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! ## Error Categories
//!
//! - **BadShape**: input length not divisible by the group count, batch
//!   elements of differing lengths, or mismatched paired arrays
//! - **BadParameter**: a period or scalar parameter outside its domain
//! - **Parse**: the expression DSL failed to parse (carries line/column)
//! - **Unsupported**: an operator invoked with flags it cannot satisfy
//! - **UnknownField**: an evaluation context lookup for a missing field
//!
//! `NaN` in numeric output is never an error; it is the in-band missing
//! value. All errors surface synchronously at the call site and no partial
//! output is ever handed to the caller.

use thiserror::Error;

/// Result type alias for alphalib operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for every fallible alphalib operation
#[derive(Debug, Error)]
pub enum Error {
    /// Input shapes are inconsistent with each other or with the context
    #[error("bad shape: {message}")]
    BadShape {
        /// What was inconsistent
        message: String,
    },

    /// A scalar parameter is outside its documented domain
    #[error("bad parameter `{name}`: {message}")]
    BadParameter {
        /// Parameter name as it appears in the operator signature
        name: &'static str,
        /// Why the value was rejected
        message: String,
    },

    /// Expression source failed to parse
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        /// 1-based line of the offending token
        line: usize,
        /// 1-based column of the offending token
        column: usize,
        /// What the parser expected or found
        message: String,
    },

    /// The operator cannot satisfy the requested context flags
    #[error("unsupported: {message}")]
    Unsupported {
        /// Which flag/operator combination is unsupported
        message: String,
    },

    /// An evaluation context was asked for a field it does not hold
    #[error("unknown field: {name}")]
    UnknownField {
        /// The field key that was looked up
        name: String,
    },
}

impl Error {
    /// Create a BadShape error
    pub fn bad_shape(message: impl Into<String>) -> Self {
        Error::BadShape {
            message: message.into(),
        }
    }

    /// Create a BadParameter error
    pub fn bad_parameter(name: &'static str, message: impl Into<String>) -> Self {
        Error::BadParameter {
            name,
            message: message.into(),
        }
    }

    /// Create a Parse error at a source position (1-based line/column)
    pub fn parse(line: usize, column: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create an Unsupported error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::Unsupported {
            message: message.into(),
        }
    }

    /// Create an UnknownField error
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Error::UnknownField { name: name.into() }
    }

    /// Check if this is a shape error
    pub fn is_shape(&self) -> bool {
        matches!(self, Error::BadShape { .. })
    }

    /// Check if this is a parameter error
    pub fn is_parameter(&self) -> bool {
        matches!(self, Error::BadParameter { .. })
    }

    /// Check if this is a parse error
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }

    /// Check if this error indicates invalid caller input (shape or
    /// parameter) as opposed to a missing capability or a parse failure
    pub fn is_validation(&self) -> bool {
        self.is_shape() || self.is_parameter()
    }

    /// Source position for parse errors, `None` otherwise
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Error::Parse { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_bad_shape() {
        let err = Error::bad_shape("length 10 is not divisible into 3 groups");
        let msg = err.to_string();
        assert!(msg.contains("bad shape"));
        assert!(msg.contains("3 groups"));
    }

    #[test]
    fn display_bad_parameter() {
        let err = Error::bad_parameter("periods", "must be at least 1");
        let msg = err.to_string();
        assert!(msg.contains("periods"));
        assert!(msg.contains("at least 1"));
    }

    #[test]
    fn display_parse_carries_position() {
        let err = Error::parse(2, 14, "expected ')'");
        let msg = err.to_string();
        assert!(msg.contains("line 2"));
        assert!(msg.contains("column 14"));
        assert_eq!(err.position(), Some((2, 14)));
    }

    #[test]
    fn display_unknown_field() {
        let err = Error::unknown_field("CLOSE");
        assert!(err.to_string().contains("CLOSE"));
    }

    #[test]
    fn classification() {
        assert!(Error::bad_shape("x").is_shape());
        assert!(Error::bad_shape("x").is_validation());
        assert!(Error::bad_parameter("w", "x").is_parameter());
        assert!(Error::bad_parameter("w", "x").is_validation());
        assert!(Error::parse(1, 1, "x").is_parse());
        assert!(!Error::parse(1, 1, "x").is_validation());
        assert!(!Error::unsupported("x").is_validation());
        assert_eq!(Error::bad_shape("x").position(), None);
    }

    #[test]
    fn result_alias() {
        fn ok() -> Result<i32> {
            Ok(7)
        }
        fn err() -> Result<i32> {
            Err(Error::unsupported("no"))
        }
        assert_eq!(ok().unwrap(), 7);
        assert!(err().is_err());
    }
}
