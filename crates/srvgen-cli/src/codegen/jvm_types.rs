//! JVM type mappings for Java code generation.
//!
//! # Type Mappings
//!
//! | Schema | Java | Notes |
//! |--------|------|-------|
//! | `bool` | `boolean` | one byte on the wire |
//! | `int8` / `byte` | `byte` | |
//! | `uint8` / `char` | `short` | widened |
//! | `int16` | `short` | |
//! | `uint16` | `int` | widened |
//! | `int32` | `int` | |
//! | `uint32` | `long` | widened |
//! | `int64` / `uint64` | `long` | `uint64` keeps the bit pattern |
//! | `float32` / `float64` | `float` / `double` | |
//! | `string` | `java.lang.String` | UTF-8, length-prefixed |
//! | `time` / `duration` | runtime `Time` / `Duration` | |
//! | `pkg/Type` | `<prefix>.pkg.msg.Type` | |

use srvgen_core::{FieldSpec, GenError, GenResult, Primitive, TypeTable, split_qualified};

/// Java names the generated code depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaTarget {
    /// Prefix of generated packages, e.g. `ros.pkg`
    pub package_prefix: String,
    /// Package of the runtime's `Message`, `Service`, `Time`, `Duration`
    /// and `TruncatedBufferException`
    pub runtime_package: String,
}

impl JavaTarget {
    pub fn new(package_prefix: impl Into<String>, runtime_package: impl Into<String>) -> Self {
        Self {
            package_prefix: package_prefix.into(),
            runtime_package: runtime_package.into(),
        }
    }

    /// Java package holding the service bindings of `package`.
    pub fn service_package(&self, package: &str) -> String {
        format!("{}.{package}.srv", self.package_prefix)
    }

    /// Fully-qualified class of a message type `pkg/Type`.
    pub fn message_class(&self, full_name: &str) -> GenResult<String> {
        let (package, name) = split_qualified(full_name).ok_or_else(|| {
            GenError::InvalidSpec(format!("'{full_name}' is not package-qualified"))
        })?;
        Ok(format!("{}.{package}.msg.{name}", self.package_prefix))
    }

    /// Fully-qualified runtime class `name`.
    pub fn runtime_class(&self, name: &str) -> String {
        format!("{}.{name}", self.runtime_package)
    }
}

impl Default for JavaTarget {
    fn default() -> Self {
        Self::new("ros.pkg", "ros.communication")
    }
}

/// Element type of a field as seen by the generated Java.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JvmType {
    Primitive {
        primitive: Primitive,
        java: String,
    },
    Message {
        full_name: String,
        java: String,
    },
}

impl JvmType {
    /// Java spelling of the element type.
    pub fn java(&self) -> &str {
        match self {
            JvmType::Primitive { java, .. } | JvmType::Message { java, .. } => java,
        }
    }

    /// Whether this is a Java reference type, so new arrays of it hold nulls.
    pub fn is_reference(&self) -> bool {
        match self {
            JvmType::Primitive { primitive, .. } => {
                matches!(primitive, Primitive::String | Primitive::Time | Primitive::Duration)
            }
            JvmType::Message { .. } => true,
        }
    }

    /// Expression creating a default element value.
    pub fn default_value(&self) -> String {
        match self {
            JvmType::Primitive {
                primitive: Primitive::Bool,
                ..
            } => "false".to_string(),
            JvmType::Primitive {
                primitive: Primitive::String,
                ..
            } => "\"\"".to_string(),
            JvmType::Primitive {
                primitive: Primitive::F32,
                ..
            } => "0.0f".to_string(),
            JvmType::Primitive {
                primitive: Primitive::F64,
                ..
            } => "0.0".to_string(),
            JvmType::Primitive {
                primitive: Primitive::I64 | Primitive::U64 | Primitive::U32,
                ..
            } => "0L".to_string(),
            JvmType::Primitive {
                primitive: Primitive::I8,
                ..
            } => "(byte) 0".to_string(),
            JvmType::Primitive {
                primitive: Primitive::U8 | Primitive::I16,
                ..
            } => "(short) 0".to_string(),
            JvmType::Primitive {
                primitive: Primitive::Time | Primitive::Duration,
                java,
            } => format!("new {java}()"),
            JvmType::Primitive { .. } => "0".to_string(),
            JvmType::Message { java, .. } => format!("new {java}()"),
        }
    }
}

/// Maps schema fields to Java types.
pub struct JvmTypeMapper<'a> {
    types: &'a TypeTable,
    target: &'a JavaTarget,
}

impl<'a> JvmTypeMapper<'a> {
    pub fn new(types: &'a TypeTable, target: &'a JavaTarget) -> Self {
        Self { types, target }
    }

    /// Element type of `field`, resolving struct references from `package`.
    pub fn element(&self, field: &FieldSpec, package: &str) -> GenResult<JvmType> {
        if let Some(primitive) = self.types.lookup(&field.type_name) {
            return Ok(JvmType::Primitive {
                primitive,
                java: self.primitive_java(primitive),
            });
        }
        let full_name = self
            .types
            .qualify(&field.type_name, package)
            .ok_or_else(|| GenError::InvalidSpec(format!("bad type '{}'", field.type_name)))?;
        let java = self.target.message_class(&full_name)?;
        Ok(JvmType::Message { full_name, java })
    }

    /// Java type of the whole field, with `[]` for arrays.
    pub fn field_type(&self, field: &FieldSpec, package: &str) -> GenResult<String> {
        let element = self.element(field, package)?;
        Ok(if field.is_array {
            format!("{}[]", element.java())
        } else {
            element.java().to_string()
        })
    }

    /// Java spelling of a primitive.
    pub fn primitive_java(&self, primitive: Primitive) -> String {
        match primitive {
            Primitive::Bool => "boolean".to_string(),
            Primitive::I8 => "byte".to_string(),
            Primitive::U8 | Primitive::I16 => "short".to_string(),
            Primitive::U16 | Primitive::I32 => "int".to_string(),
            Primitive::U32 | Primitive::I64 | Primitive::U64 => "long".to_string(),
            Primitive::F32 => "float".to_string(),
            Primitive::F64 => "double".to_string(),
            Primitive::String => "java.lang.String".to_string(),
            Primitive::Time => self.target.runtime_class("Time"),
            Primitive::Duration => self.target.runtime_class("Duration"),
        }
    }
}

/// Statement writing primitive `value` to the `ByteBuffer` named `bb`.
pub fn write_statement(primitive: Primitive, value: &str) -> String {
    match primitive {
        Primitive::Bool => format!("bb.put((byte) ({value} ? 1 : 0));"),
        Primitive::I8 => format!("bb.put({value});"),
        Primitive::U8 => format!("bb.put((byte) {value});"),
        Primitive::I16 => format!("bb.putShort({value});"),
        Primitive::U16 => format!("bb.putShort((short) {value});"),
        Primitive::I32 => format!("bb.putInt({value});"),
        Primitive::U32 => format!("bb.putInt((int) {value});"),
        Primitive::I64 | Primitive::U64 => format!("bb.putLong({value});"),
        Primitive::F32 => format!("bb.putFloat({value});"),
        Primitive::F64 => format!("bb.putDouble({value});"),
        Primitive::String => format!("__putString(bb, {value});"),
        Primitive::Time | Primitive::Duration => {
            format!("bb.putInt({value}.secs); bb.putInt({value}.nsecs);")
        }
    }
}

/// Expression reading one primitive from `bb`.
///
/// Fixed-width reads assume the caller already checked the remaining length.
pub fn read_expression(primitive: Primitive, target: &JavaTarget) -> String {
    match primitive {
        Primitive::Bool => "bb.get() != 0".to_string(),
        Primitive::I8 => "bb.get()".to_string(),
        Primitive::U8 => "(short) (bb.get() & 0xff)".to_string(),
        Primitive::I16 => "bb.getShort()".to_string(),
        Primitive::U16 => "bb.getShort() & 0xffff".to_string(),
        Primitive::I32 => "bb.getInt()".to_string(),
        Primitive::U32 => "bb.getInt() & 0xffffffffL".to_string(),
        Primitive::I64 | Primitive::U64 => "bb.getLong()".to_string(),
        Primitive::F32 => "bb.getFloat()".to_string(),
        Primitive::F64 => "bb.getDouble()".to_string(),
        Primitive::String => "__getString(bb)".to_string(),
        Primitive::Time => {
            format!("new {}(bb.getInt(), bb.getInt())", target.runtime_class("Time"))
        }
        Primitive::Duration => {
            format!("new {}(bb.getInt(), bb.getInt())", target.runtime_class("Duration"))
        }
    }
}

/// Java literal for a constant `value` of `primitive`, as accepted by the parser.
pub fn constant_literal(primitive: Primitive, value: &str) -> String {
    match primitive {
        Primitive::Bool => match value {
            "true" | "True" | "1" => "true".to_string(),
            _ => "false".to_string(),
        },
        Primitive::I8 => format!("(byte) {value}"),
        Primitive::U8 | Primitive::I16 => format!("(short) {value}"),
        Primitive::U16 | Primitive::I32 => value.to_string(),
        Primitive::U32 | Primitive::I64 => format!("{value}L"),
        // uint64 above i64::MAX keeps its bit pattern
        Primitive::U64 => match value.parse::<u64>() {
            Ok(v) => format!("{}L", v as i64),
            Err(_) => format!("{value}L"),
        },
        Primitive::F32 => float_literal(value, "Float", "f"),
        Primitive::F64 => float_literal(value, "Double", ""),
        Primitive::String => super::naming::java_string_literal(value),
        Primitive::Time | Primitive::Duration => value.to_string(),
    }
}

fn float_literal(value: &str, class: &str, suffix: &str) -> String {
    match value.to_ascii_lowercase().trim_start_matches('+') {
        "inf" | "infinity" => format!("{class}.POSITIVE_INFINITY"),
        "-inf" | "-infinity" => format!("{class}.NEGATIVE_INFINITY"),
        "nan" | "-nan" => format!("{class}.NaN"),
        _ if value.contains(['.', 'e', 'E']) => format!("{value}{suffix}"),
        _ => format!("{value}.0{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use test_case::test_case;

    fn mapper_java(type_name: &str) -> String {
        let types = TypeTable::standard();
        let target = JavaTarget::default();
        let mapper = JvmTypeMapper::new(&types, &target);
        mapper
            .field_type(&FieldSpec::scalar(type_name, "f"), "my_pkg")
            .unwrap()
    }

    #[test_case("bool", "boolean")]
    #[test_case("int8", "byte")]
    #[test_case("byte", "byte")]
    #[test_case("uint8", "short")]
    #[test_case("char", "short")]
    #[test_case("int16", "short")]
    #[test_case("uint16", "int")]
    #[test_case("int32", "int")]
    #[test_case("uint32", "long")]
    #[test_case("int64", "long")]
    #[test_case("uint64", "long")]
    #[test_case("float32", "float")]
    #[test_case("float64", "double")]
    #[test_case("string", "java.lang.String")]
    #[test_case("time", "ros.communication.Time")]
    #[test_case("duration", "ros.communication.Duration")]
    fn JvmTypeMapper___primitive___maps_to_java(type_name: &str, expected: &str) {
        assert_eq!(mapper_java(type_name), expected);
    }

    #[test]
    fn JvmTypeMapper___qualified_message___uses_msg_package() {
        assert_eq!(mapper_java("geometry_msgs/Point"), "ros.pkg.geometry_msgs.msg.Point");
    }

    #[test]
    fn JvmTypeMapper___bare_message___uses_current_package() {
        assert_eq!(mapper_java("Thing"), "ros.pkg.my_pkg.msg.Thing");
    }

    #[test]
    fn JvmTypeMapper___header___maps_to_std_msgs() {
        assert_eq!(mapper_java("Header"), "ros.pkg.std_msgs.msg.Header");
    }

    #[test]
    fn JvmTypeMapper___array_field___appends_brackets() {
        let types = TypeTable::standard();
        let target = JavaTarget::default();
        let mapper = JvmTypeMapper::new(&types, &target);

        let java = mapper
            .field_type(&FieldSpec::fixed_array("float64", "xyz", 3), "p")
            .unwrap();

        assert_eq!(java, "double[]");
    }

    #[test]
    fn JavaTarget___custom_prefix___changes_packages() {
        let target = JavaTarget::new("org.example", "org.example.rt");

        assert_eq!(target.service_package("nav"), "org.example.nav.srv");
        assert_eq!(target.message_class("nav/Goal").unwrap(), "org.example.nav.msg.Goal");
        assert_eq!(target.runtime_class("Service"), "org.example.rt.Service");
    }

    #[test]
    fn JvmType___default_value___per_kind() {
        let target = JavaTarget::default();
        let types = TypeTable::standard();
        let mapper = JvmTypeMapper::new(&types, &target);
        let default_of = |t: &str| {
            mapper
                .element(&FieldSpec::scalar(t, "f"), "p")
                .unwrap()
                .default_value()
        };

        assert_eq!(default_of("bool"), "false");
        assert_eq!(default_of("string"), "\"\"");
        assert_eq!(default_of("uint32"), "0L");
        assert_eq!(default_of("int8"), "(byte) 0");
        assert_eq!(default_of("time"), "new ros.communication.Time()");
        assert_eq!(default_of("geometry_msgs/Point"), "new ros.pkg.geometry_msgs.msg.Point()");
    }

    #[test_case(Primitive::U8, "(short) (bb.get() & 0xff)" ; "uint8 widens")]
    #[test_case(Primitive::U32, "bb.getInt() & 0xffffffffL" ; "uint32 widens")]
    #[test_case(Primitive::String, "__getString(bb)" ; "string helper")]
    fn read_expression___unsigned_and_string(primitive: Primitive, expected: &str) {
        assert_eq!(read_expression(primitive, &JavaTarget::default()), expected);
    }

    #[test]
    fn write_statement___bool___writes_one_byte() {
        assert_eq!(write_statement(Primitive::Bool, "ok"), "bb.put((byte) (ok ? 1 : 0));");
    }

    #[test_case(Primitive::Bool, "True", "true")]
    #[test_case(Primitive::Bool, "0", "false")]
    #[test_case(Primitive::I8, "-3", "(byte) -3")]
    #[test_case(Primitive::U32, "4294967295", "4294967295L")]
    #[test_case(Primitive::U64, "18446744073709551615", "-1L")]
    #[test_case(Primitive::F32, "1", "1.0f")]
    #[test_case(Primitive::F64, "2.5", "2.5")]
    #[test_case(Primitive::F64, "-inf", "Double.NEGATIVE_INFINITY")]
    #[test_case(Primitive::String, "a \"b\"", "\"a \\\"b\\\"\"")]
    fn constant_literal___formats_java_literal(primitive: Primitive, value: &str, expected: &str) {
        assert_eq!(constant_literal(primitive, value), expected);
    }
}
