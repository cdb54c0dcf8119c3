//! srvgen-core - Schema model, resolution and compatibility hashing
//!
//! This crate provides the generator's front half:
//! - [`ServiceSpec`] / [`StructSpec`] / [`FieldSpec`] schema model
//! - [`parse_service`] / [`parse_message`] for the schema grammar
//! - [`TypeTable`] mapping builtin type names to wire primitives
//! - [`TypeResolver`] building the [`DependencyClosure`] of a type
//! - [`HashDeriver`] computing the [`CompatibilityHash`]
//! - [`GeneratorConfig`] for `srvgen.toml`

mod config;
mod definition;
mod error;
mod hash;
mod model;
mod parser;
mod resolve;
mod types;

pub use config::{
    DEFAULT_CONFIG_FILE, GeneratorConfig, GeneratorSection, LoggingSection, PACKAGE_PATH_ENV,
    PathsSection,
};
pub use definition::full_definition;
pub use error::{GenError, GenResult};
pub use hash::{CompatibilityHash, HashAlgorithm, HashDeriver};
pub use model::{ConstantSpec, FieldSpec, ServiceSpec, StructSpec};
pub use parser::{
    LoadedService, find_package_dir, is_identifier, load_service_file, parse_message,
    parse_service,
};
pub use resolve::{
    DependencyClosure, MemorySource, PackagePathSource, ResolvedType, TypeResolver, TypeSource,
};
pub use types::{HEADER_PACKAGE, HEADER_TYPE, Primitive, TypeTable, split_qualified};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CompatibilityHash, DependencyClosure, FieldSpec, GenError, GenResult, GeneratorConfig,
        HashAlgorithm, HashDeriver, ServiceSpec, StructSpec, TypeResolver, TypeSource, TypeTable,
    };
}
