//! Java class generation for one struct.
//!
//! The emitted class keeps the little-endian layout implemented by
//! `srvgen-wire`, checks every read against the remaining buffer and
//! exposes its [`BindingMetadata`] through static and instance accessors.

use super::jvm_types::{self, JavaTarget, JvmType, JvmTypeMapper};
use super::naming::{capitalize, java_identifier, java_string_literal, length_constant};
use srvgen_core::{
    DependencyClosure, FieldSpec, GenError, GenResult, HEADER_PACKAGE, HEADER_TYPE, Primitive,
    StructSpec, TypeTable,
};
use srvgen_wire::WireCodec;
use std::collections::BTreeMap;

const INDENT: &str = "  ";

/// Metadata accessors of a binding, keyed by accessor name.
///
/// Every entry becomes `__s_get<Key>()` and `get<Key>()` returning the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingMetadata {
    entries: BTreeMap<String, String>,
}

impl BindingMetadata {
    pub const DATA_TYPE: &'static str = "DataType";
    pub const MD5_SUM: &'static str = "MD5Sum";
    pub const MESSAGE_DEFINITION: &'static str = "MessageDefinition";
    pub const SERVER_MD5_SUM: &'static str = "ServerMD5Sum";

    /// The default accessors every binding carries.
    pub fn new(
        data_type: impl Into<String>,
        md5sum: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        Self::default()
            .with_override(Self::DATA_TYPE, data_type)
            .with_override(Self::MD5_SUM, md5sum)
            .with_override(Self::MESSAGE_DEFINITION, definition)
    }

    /// Add or replace an accessor.
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    #[allow(dead_code)] // Used by tests
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Entries in accessor-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Whether a binding is a top-level class or nested inside a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    #[allow(dead_code)] // Used by tests
    TopLevel,
    Nested,
}

/// Emits binding classes for structs in a resolved closure.
pub struct BindingEmitter<'a> {
    types: &'a TypeTable,
    target: &'a JavaTarget,
    closure: &'a DependencyClosure,
}

struct FieldPlan<'s> {
    spec: &'s FieldSpec,
    /// `this.<name>`
    access: String,
    element: JvmType,
    java_type: String,
}

impl<'a> BindingEmitter<'a> {
    pub fn new(
        types: &'a TypeTable,
        target: &'a JavaTarget,
        closure: &'a DependencyClosure,
    ) -> Self {
        Self {
            types,
            target,
            closure,
        }
    }

    /// Emit the Java class `class_name` for `spec`, a struct of `package`.
    pub fn emit(
        &self,
        spec: &StructSpec,
        package: &str,
        class_name: &str,
        kind: ClassKind,
        metadata: &BindingMetadata,
    ) -> GenResult<String> {
        let mapper = JvmTypeMapper::new(self.types, self.target);
        let plans = spec
            .fields
            .iter()
            .map(|field| -> GenResult<FieldPlan<'_>> {
                Ok(FieldPlan {
                    spec: field,
                    access: format!("this.{}", java_identifier(&field.name)),
                    element: mapper.element(field, package)?,
                    java_type: mapper.field_type(field, package)?,
                })
            })
            .collect::<GenResult<Vec<_>>>()?;
        for plan in &plans {
            if let JvmType::Message { full_name, .. } = &plan.element {
                self.struct_min_len(full_name)?;
            }
        }

        let mut w = JavaWriter::new(match kind {
            ClassKind::TopLevel => 0,
            ClassKind::Nested => 1,
        });
        let modifiers = match kind {
            ClassKind::TopLevel => "public",
            ClassKind::Nested => "public static",
        };
        w.open(&format!(
            "{modifiers} class {class_name} extends {} {{",
            self.target.runtime_class("Message")
        ));

        self.write_constants(&mut w, spec, &mapper)?;
        write_fields(&mut w, &plans);
        write_constructor(&mut w, class_name, &plans);
        write_metadata(&mut w, metadata);
        write_clone(&mut w, class_name);
        write_serialization_length(&mut w, &plans);
        write_serialize(&mut w, &plans);
        self.write_deserialize(&mut w, &plans)?;
        self.write_helpers(&mut w);

        w.close("}");
        Ok(w.finish())
    }

    fn write_constants(
        &self,
        w: &mut JavaWriter,
        spec: &StructSpec,
        mapper: &JvmTypeMapper<'_>,
    ) -> GenResult<()> {
        if spec.constants.is_empty() {
            return Ok(());
        }
        w.blank();
        for constant in &spec.constants {
            let primitive = self.types.lookup(&constant.type_name).ok_or_else(|| {
                GenError::InvalidSpec(format!(
                    "constant {} has non-primitive type {}",
                    constant.name, constant.type_name
                ))
            })?;
            w.line(&format!(
                "public static final {} {} = {};",
                mapper.primitive_java(primitive),
                java_identifier(&constant.name),
                jvm_types::constant_literal(primitive, &constant.value)
            ));
        }
        Ok(())
    }

    fn write_deserialize(&self, w: &mut JavaWriter, plans: &[FieldPlan<'_>]) -> GenResult<()> {
        w.blank();
        w.open("public void deserialize(java.nio.ByteBuffer bb) {");
        w.line("bb.order(java.nio.ByteOrder.LITTLE_ENDIAN);");
        for plan in plans {
            let field = plan.spec;
            let target = &plan.access;
            if !field.is_array {
                self.read_element(w, &plan.element, target);
                continue;
            }

            let element_java = plan.element.java();
            match field.array_len {
                Some(_) => {
                    let len = length_constant(&field.name);
                    if let Some(size) = fixed_size(&plan.element) {
                        w.line(&format!("__require(bb, (long) {len} * {size});"));
                    }
                    w.line(&format!("{target} = new {element_java}[{len}];"));
                }
                None => {
                    let min = self.min_element_size(&plan.element)?;
                    w.line(&format!("{target} = new {element_java}[__readCount(bb, {min})];"));
                }
            }
            w.open(&format!("for (int __i = 0; __i < {target}.length; __i++) {{"));
            let item = format!("{target}[__i]");
            match &plan.element {
                JvmType::Primitive { primitive, .. } => w.line(&format!(
                    "{item} = {};",
                    jvm_types::read_expression(*primitive, self.target)
                )),
                JvmType::Message { java, .. } => {
                    w.line(&format!("{item} = new {java}();"));
                    w.line(&format!("{item}.deserialize(bb);"));
                }
            }
            w.close("}");
        }
        w.close("}");
        Ok(())
    }

    fn read_element(&self, w: &mut JavaWriter, element: &JvmType, target: &str) {
        match element {
            JvmType::Primitive { primitive, .. } => {
                if let Some(size) = primitive.wire_size() {
                    w.line(&format!("__require(bb, {size});"));
                }
                w.line(&format!(
                    "{target} = {};",
                    jvm_types::read_expression(*primitive, self.target)
                ));
            }
            JvmType::Message { java, .. } => {
                w.line(&format!("{target} = new {java}();"));
                w.line(&format!("{target}.deserialize(bb);"));
            }
        }
    }

    /// Smallest encoding of one array element, used to bound length prefixes.
    fn min_element_size(&self, element: &JvmType) -> GenResult<usize> {
        match element {
            JvmType::Primitive { primitive, .. } => Ok(primitive.min_wire_size()),
            JvmType::Message { full_name, .. } => self.struct_min_len(full_name),
        }
    }

    /// Smallest encoding of struct `full_name`.
    ///
    /// Fails for a struct that contains itself without an array in between,
    /// whose generated constructor would never return.
    fn struct_min_len(&self, full_name: &str) -> GenResult<usize> {
        let entry = self
            .closure
            .get(full_name)
            .ok_or_else(|| GenError::UnresolvedType {
                type_name: full_name.to_string(),
                referenced_from: "binding emitter".to_string(),
            })?;
        WireCodec::new(self.types, self.closure)
            .min_len(&entry.spec, &entry.package)
            .map_err(|err| GenError::InvalidSpec(format!("{full_name}: {err}")))
    }

    fn write_helpers(&self, w: &mut JavaWriter) {
        let exception = self.target.runtime_class("TruncatedBufferException");

        w.blank();
        w.open("private static void __require(java.nio.ByteBuffer bb, long needed) {");
        w.open("if (bb.remaining() < needed) {");
        w.line(&format!(
            "throw new {exception}(\"needed \" + needed + \" bytes at offset \" + bb.position() \
             + \", \" + bb.remaining() + \" remaining\");"
        ));
        w.close("}");
        w.close("}");

        w.blank();
        w.open("private static int __readCount(java.nio.ByteBuffer bb, int minElementSize) {");
        w.line("__require(bb, 4);");
        w.line("long n = bb.getInt() & 0xffffffffL;");
        w.line("__require(bb, n * minElementSize);");
        w.open("if (n > Integer.MAX_VALUE) {");
        w.line(&format!(
            "throw new {exception}(\"length \" + n + \" at offset \" + (bb.position() - 4) \
             + \" exceeds the buffer\");"
        ));
        w.close("}");
        w.line("return (int) n;");
        w.close("}");

        w.blank();
        w.open("private static java.lang.String __getString(java.nio.ByteBuffer bb) {");
        w.line("byte[] bytes = new byte[__readCount(bb, 1)];");
        w.line("bb.get(bytes);");
        w.line("return new java.lang.String(bytes, java.nio.charset.StandardCharsets.UTF_8);");
        w.close("}");

        w.blank();
        w.open("private static void __putString(java.nio.ByteBuffer bb, java.lang.String s) {");
        w.line("byte[] bytes = s.getBytes(java.nio.charset.StandardCharsets.UTF_8);");
        w.line("bb.putInt(bytes.length);");
        w.line("bb.put(bytes);");
        w.close("}");

        w.blank();
        w.open("private static int __utf8Length(java.lang.String s) {");
        w.line("return s.getBytes(java.nio.charset.StandardCharsets.UTF_8).length;");
        w.close("}");
    }
}

fn write_fields(w: &mut JavaWriter, plans: &[FieldPlan<'_>]) {
    let lengths: Vec<_> = plans
        .iter()
        .filter_map(|p| p.spec.array_len.map(|len| (length_constant(&p.spec.name), len)))
        .collect();
    if !lengths.is_empty() {
        w.blank();
        for (name, len) in lengths {
            w.line(&format!("public static final int {name} = {len};"));
        }
    }

    if plans.is_empty() {
        return;
    }
    w.blank();
    for plan in plans {
        let field = plan.spec;
        let init = match (field.is_array, field.array_len) {
            (false, _) => plan.element.default_value(),
            (true, None) => format!("new {}[0]", plan.element.java()),
            (true, Some(_)) => format!(
                "new {}[{}]",
                plan.element.java(),
                length_constant(&field.name)
            ),
        };
        w.line(&format!(
            "public {} {} = {init};",
            plan.java_type,
            java_identifier(&field.name)
        ));
    }
}

/// Fixed arrays of reference types start out filled with defaults.
fn write_constructor(w: &mut JavaWriter, class_name: &str, plans: &[FieldPlan<'_>]) {
    let filled: Vec<_> = plans
        .iter()
        .filter(|p| p.spec.array_len.is_some() && p.element.is_reference())
        .collect();
    if filled.is_empty() {
        return;
    }
    w.blank();
    w.open(&format!("public {class_name}() {{"));
    for plan in filled {
        w.open(&format!("for (int __i = 0; __i < {}.length; __i++) {{", plan.access));
        w.line(&format!("{}[__i] = {};", plan.access, plan.element.default_value()));
        w.close("}");
    }
    w.close("}");
}

fn write_metadata(w: &mut JavaWriter, metadata: &BindingMetadata) {
    w.blank();
    for (key, value) in metadata.iter() {
        w.line(&format!(
            "public static java.lang.String __s_get{key}() {{ return {}; }}",
            java_string_literal(value)
        ));
    }
    w.blank();
    for (key, _) in metadata.iter() {
        let method = capitalize(key);
        w.line(&format!(
            "public java.lang.String get{method}() {{ return __s_get{key}(); }}"
        ));
    }
}

fn write_clone(w: &mut JavaWriter, class_name: &str) {
    w.blank();
    w.open(&format!("public {class_name} clone() {{"));
    w.line("java.nio.ByteBuffer bb = java.nio.ByteBuffer.allocate(serializationLength());");
    w.line("serialize(bb, 0);");
    w.line("bb.flip();");
    w.line(&format!("{class_name} __c = new {class_name}();"));
    w.line("__c.deserialize(bb);");
    w.line("return __c;");
    w.close("}");
}

fn write_serialization_length(w: &mut JavaWriter, plans: &[FieldPlan<'_>]) {
    w.blank();
    w.open("public int serializationLength() {");
    w.line("int __l = 0;");
    for plan in plans {
        let field = plan.spec;
        let name = &plan.access;
        if !field.is_array {
            w.line(&format!("__l += {};", element_length(&plan.element, name)));
            continue;
        }
        if field.is_variable_array() {
            w.line("__l += 4;");
        }
        match fixed_size(&plan.element) {
            Some(size) => w.line(&format!("__l += {name}.length * {size};")),
            None => {
                w.open(&format!("for ({} __e : {name}) {{", plan.element.java()));
                w.line(&format!("__l += {};", element_length(&plan.element, "__e")));
                w.close("}");
            }
        }
    }
    w.line("return __l;");
    w.close("}");
}

fn element_length(element: &JvmType, value: &str) -> String {
    match element {
        JvmType::Primitive {
            primitive: Primitive::String,
            ..
        } => format!("4 + __utf8Length({value})"),
        JvmType::Primitive { primitive, .. } => primitive.min_wire_size().to_string(),
        JvmType::Message { .. } => format!("{value}.serializationLength()"),
    }
}

fn write_serialize(w: &mut JavaWriter, plans: &[FieldPlan<'_>]) {
    w.blank();
    w.open("public void serialize(java.nio.ByteBuffer bb, int seq) {");
    w.line("bb.order(java.nio.ByteOrder.LITTLE_ENDIAN);");
    for plan in plans {
        let field = plan.spec;
        let name = &plan.access;
        if !field.is_array {
            if is_header(&plan.element) {
                w.line(&format!("{name}.seq = seq & 0xffffffffL;"));
            }
            write_element(w, &plan.element, name);
            continue;
        }
        match field.array_len {
            Some(len) => {
                w.open(&format!("if ({name}.length != {}) {{", length_constant(&field.name)));
                w.line(&format!(
                    "throw new IllegalArgumentException(\"{} must have {len} elements, got \" \
                     + {name}.length);",
                    field.name
                ));
                w.close("}");
            }
            None => w.line(&format!("bb.putInt({name}.length);")),
        }
        w.open(&format!("for ({} __e : {name}) {{", plan.element.java()));
        write_element(w, &plan.element, "__e");
        w.close("}");
    }
    w.close("}");
}

fn write_element(w: &mut JavaWriter, element: &JvmType, value: &str) {
    match element {
        JvmType::Primitive { primitive, .. } => {
            w.line(&jvm_types::write_statement(*primitive, value))
        }
        JvmType::Message { .. } => w.line(&format!("{value}.serialize(bb, seq);")),
    }
}

fn is_header(element: &JvmType) -> bool {
    let header = format!("{HEADER_PACKAGE}/{HEADER_TYPE}");
    matches!(element, JvmType::Message { full_name, .. } if *full_name == header)
}

/// Encoded size of a fixed-width primitive element.
fn fixed_size(element: &JvmType) -> Option<usize> {
    match element {
        JvmType::Primitive { primitive, .. } => primitive.wire_size(),
        JvmType::Message { .. } => None,
    }
}

/// Line-oriented Java source builder with brace-driven indentation.
struct JavaWriter {
    out: String,
    depth: usize,
}

impl JavaWriter {
    fn new(depth: usize) -> Self {
        Self {
            out: String::new(),
            depth,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn open(&mut self, text: &str) {
        self.line(text);
        self.depth += 1;
    }

    fn close(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    fn finish(self) -> String {
        self.out
    }
}
