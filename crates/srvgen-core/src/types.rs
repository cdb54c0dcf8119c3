//! Primitive type table.
//!
//! Maps the builtin type names of the schema grammar to their wire encoding.
//! The table is an immutable value handed to the parser, resolver, hasher,
//! codec and emitters; nothing consults a process-wide table.
//!
//! | Name | Wire | Width |
//! |------|------|-------|
//! | `bool` | `u8` (0/1) | 1 |
//! | `int8` / `byte` | `i8` | 1 |
//! | `uint8` / `char` | `u8` | 1 |
//! | `int16` / `uint16` | `i16` / `u16` | 2 |
//! | `int32` / `uint32` | `i32` / `u32` | 4 |
//! | `int64` / `uint64` | `i64` / `u64` | 8 |
//! | `float32` / `float64` | IEEE-754 | 4 / 8 |
//! | `string` | `u32` length + UTF-8 | variable |
//! | `time` | `u32` secs + `u32` nsecs | 8 |
//! | `duration` | `i32` secs + `i32` nsecs | 8 |

use std::collections::HashMap;

/// Package that owns the implicit `Header` type.
pub const HEADER_PACKAGE: &str = "std_msgs";

/// Bare name that resolves to `std_msgs/Header`.
pub const HEADER_TYPE: &str = "Header";

/// A builtin wire type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    String,
    Time,
    Duration,
}

impl Primitive {
    /// Fixed encoded width in bytes, `None` for length-prefixed types.
    pub fn wire_size(self) -> Option<usize> {
        match self {
            Primitive::Bool | Primitive::I8 | Primitive::U8 => Some(1),
            Primitive::I16 | Primitive::U16 => Some(2),
            Primitive::I32 | Primitive::U32 | Primitive::F32 => Some(4),
            Primitive::I64 | Primitive::U64 | Primitive::F64 => Some(8),
            Primitive::Time | Primitive::Duration => Some(8),
            Primitive::String => None,
        }
    }

    /// Smallest number of bytes one encoded value can occupy.
    pub fn min_wire_size(self) -> usize {
        self.wire_size().unwrap_or(4)
    }

    /// Whether a constant may be declared with this type.
    pub fn allows_constant(self) -> bool {
        !matches!(self, Primitive::Time | Primitive::Duration)
    }
}

/// Lookup table from schema type names to primitives.
#[derive(Debug, Clone)]
pub struct TypeTable {
    entries: HashMap<String, Primitive>,
}

impl TypeTable {
    /// The standard builtin set, including the `byte` and `char` aliases.
    pub fn standard() -> Self {
        let entries = [
            ("bool", Primitive::Bool),
            ("int8", Primitive::I8),
            ("byte", Primitive::I8),
            ("uint8", Primitive::U8),
            ("char", Primitive::U8),
            ("int16", Primitive::I16),
            ("uint16", Primitive::U16),
            ("int32", Primitive::I32),
            ("uint32", Primitive::U32),
            ("int64", Primitive::I64),
            ("uint64", Primitive::U64),
            ("float32", Primitive::F32),
            ("float64", Primitive::F64),
            ("string", Primitive::String),
            ("time", Primitive::Time),
            ("duration", Primitive::Duration),
        ]
        .into_iter()
        .map(|(name, prim)| (name.to_string(), prim))
        .collect();

        Self { entries }
    }

    /// Look up a builtin by name.
    pub fn lookup(&self, name: &str) -> Option<Primitive> {
        self.entries.get(name).copied()
    }

    /// Whether `name` names a builtin type.
    pub fn is_primitive(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Fully qualify a struct reference as seen from `package`.
    ///
    /// Returns `None` for primitives. `Header` maps to `std_msgs/Header`.
    pub fn qualify(&self, type_name: &str, package: &str) -> Option<String> {
        if self.is_primitive(type_name) {
            return None;
        }
        if type_name.contains('/') {
            return Some(type_name.to_string());
        }
        if type_name == HEADER_TYPE {
            return Some(format!("{HEADER_PACKAGE}/{HEADER_TYPE}"));
        }
        Some(format!("{package}/{type_name}"))
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Split a fully-qualified `pkg/Type` name.
pub fn split_qualified(name: &str) -> Option<(&str, &str)> {
    name.split_once('/')
}
