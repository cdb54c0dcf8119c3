//! Service binding generation.
//!
//! A service class wraps its `Request` and `Response` bindings. Both carry the
//! service's data type and one shared compatibility hash computed over the
//! request and response together.

use super::java::{BindingEmitter, BindingMetadata, ClassKind};
use super::jvm_types::JavaTarget;
use srvgen_core::{
    CompatibilityHash, DependencyClosure, GenError, GenResult, HashAlgorithm, HashDeriver,
    ServiceSpec, TypeResolver, TypeSource, TypeTable, full_definition,
};

/// Resolution and hashing result for one service.
#[derive(Debug, Clone)]
pub struct ServiceAnalysis {
    pub full_name: String,
    pub hash: CompatibilityHash,
    /// Types reachable from the request and response, shared visited set
    pub closure: DependencyClosure,
}

/// A generated service binding.
#[derive(Debug, Clone)]
pub struct ServiceBinding {
    pub analysis: ServiceAnalysis,
    /// Java source, without the generated-file marker
    pub text: String,
}

/// Emits service bindings.
pub struct ServiceEmitter<'a> {
    types: &'a TypeTable,
    source: &'a dyn TypeSource,
    target: &'a JavaTarget,
    algorithm: HashAlgorithm,
}

impl<'a> ServiceEmitter<'a> {
    pub fn new(
        types: &'a TypeTable,
        source: &'a dyn TypeSource,
        target: &'a JavaTarget,
        algorithm: HashAlgorithm,
    ) -> Self {
        Self {
            types,
            source,
            target,
            algorithm,
        }
    }

    /// Resolve the service's dependencies and compute its hash.
    ///
    /// Unresolved references keep their own error kind; any other failure is
    /// reported as an invalid spec naming the service.
    pub fn analyze(&self, spec: &ServiceSpec) -> GenResult<ServiceAnalysis> {
        let full_name = spec.full_name();
        let closure = TypeResolver::new(self.types, self.source)
            .resolve_service(spec)
            .map_err(|err| wrap(&full_name, err))?;
        let hash = HashDeriver::new(self.types, self.algorithm)
            .service_hash(spec, &closure)
            .map_err(|err| wrap(&full_name, err))?;

        tracing::debug!(
            service = %full_name,
            dependencies = closure.len(),
            %hash,
            "analyzed service"
        );

        Ok(ServiceAnalysis {
            full_name,
            hash,
            closure,
        })
    }

    /// Emit the binding for `spec`.
    pub fn emit_service(&self, spec: &ServiceSpec) -> GenResult<ServiceBinding> {
        let analysis = self.analyze(spec)?;
        let name = &spec.short_name;
        let full_name = &analysis.full_name;
        let hash = analysis.hash.as_str();
        let runtime_service = self.target.runtime_class("Service");

        let mut text = String::new();
        text.push_str(&format!("package {};\n\n", self.target.service_package(&spec.package)));
        text.push_str(&format!(
            "public class {name} extends {runtime_service}<{name}.Request, {name}.Response> {{\n\n"
        ));
        text.push_str(&format!(
            "  public static java.lang.String __s_getDataType() {{ return \"{full_name}\"; }}\n"
        ));
        text.push_str(&format!(
            "  public static java.lang.String __s_getMD5Sum() {{ return \"{hash}\"; }}\n\n"
        ));
        text.push_str(&format!(
            "  public java.lang.String getDataType() {{ return {name}.__s_getDataType(); }}\n"
        ));
        text.push_str(&format!(
            "  public java.lang.String getMD5Sum() {{ return {name}.__s_getMD5Sum(); }}\n\n"
        ));
        text.push_str(&format!("  public {name}.Request createRequest() {{\n"));
        text.push_str(&format!("    return new {name}.Request();\n"));
        text.push_str("  }\n\n");
        text.push_str(&format!("  public {name}.Response createResponse() {{\n"));
        text.push_str(&format!("    return new {name}.Response();\n"));
        text.push_str("  }\n\n");

        let emitter = BindingEmitter::new(self.types, self.target, &analysis.closure);
        for (part, class_name) in [(&spec.request, "Request"), (&spec.response, "Response")] {
            let part_closure = TypeResolver::new(self.types, self.source)
                .resolve(part, &spec.package)
                .map_err(|err| wrap(full_name, err))?;
            let definition = full_definition(part, &part_closure);
            let metadata = BindingMetadata::new(full_name.as_str(), hash, definition)
                .with_override(BindingMetadata::SERVER_MD5_SUM, hash);
            let class = emitter
                .emit(part, &spec.package, class_name, ClassKind::Nested, &metadata)
                .map_err(|err| wrap(full_name, err))?;
            text.push_str(&class);
            text.push('\n');
        }

        text.push_str("} //class\n");

        Ok(ServiceBinding { analysis, text })
    }
}

fn wrap(service: &str, err: GenError) -> GenError {
    match err {
        GenError::UnresolvedType { .. } | GenError::Io { .. } => err,
        GenError::InvalidSpec(message) => GenError::InvalidSpec(format!("{service}: {message}")),
        other => GenError::InvalidSpec(format!("{service}: {other}")),
    }
}

#[cfg(test)]
#[path = "service/service_tests.rs"]
mod service_tests;
