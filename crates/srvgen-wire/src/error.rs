//! Wire codec errors

use thiserror::Error;

/// Errors that can occur while encoding or decoding a binding's byte layout
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The buffer ends before the declared layout is complete
    #[error("truncated buffer at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    TruncatedBuffer {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// A value does not match the field's declared type
    #[error("field '{field}': expected {expected}")]
    TypeMismatch { field: String, expected: String },

    /// A fixed-size array holds the wrong number of elements
    #[error("field '{field}': fixed array needs {expected} elements, got {actual}")]
    FixedLengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// A string is not valid UTF-8
    #[error("invalid UTF-8 string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// A length does not fit the 4-byte length prefix
    #[error("field '{field}': length {len} exceeds the 4-byte length prefix")]
    LengthOverflow { field: String, len: usize },

    /// Bytes left over after a complete value
    #[error("{remaining} trailing bytes after value")]
    TrailingBytes { remaining: usize },

    /// A struct reference missing from the dependency closure
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// A struct that contains itself without an array in between
    #[error("type '{0}' contains itself and has no finite value")]
    UnboundedRecursion(String),

    /// Struct values nest deeper than the codec's limit
    #[error("struct nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },
}
