//! Java binding generation.
//!
//! # Architecture
//!
//! ```text
//! ServiceSpec
//!     ↓
//!  [ServiceEmitter]  resolve request + response, one shared hash
//!     ↓
//!  [BindingEmitter]  Request / Response classes with service metadata
//!     ↓
//!  Java source text
//! ```
//!
//! Type names are mapped by [`jvm_types`], identifiers by [`naming`].

pub mod java;
pub mod jvm_types;
pub mod naming;
pub mod service;

pub use jvm_types::JavaTarget;
pub use service::ServiceEmitter;
