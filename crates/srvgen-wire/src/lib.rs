//! srvgen-wire - Reference codec for generated binding layouts
//!
//! This crate provides:
//! - [`Value`] dynamic field values
//! - [`WireCodec`] encoding and decoding values of a resolved struct
//! - [`WireReader`] bounds-checked little-endian reads
//!
//! Generated bindings and this codec share one byte layout, so tests can
//! check generated lengths and truncation behaviour without a JVM.

mod codec;
mod error;

pub use codec::{DEFAULT_MAX_DEPTH, Value, WireCodec, WireReader};
pub use error::WireError;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{Value, WireCodec, WireError, WireReader};
}
