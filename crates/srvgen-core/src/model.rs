//! Schema model.
//!
//! Immutable representation of a parsed service: a package, a short name and
//! two structured types (request, response), each an ordered list of typed
//! fields. Field order is the serialized byte order.

use std::fmt;

/// A service definition: request and response sharing one wire identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSpec {
    /// Package the service belongs to.
    pub package: String,

    /// Service name, a valid identifier.
    pub short_name: String,

    /// Request type, named `<short_name>Request`.
    pub request: StructSpec,

    /// Response type, named `<short_name>Response`.
    pub response: StructSpec,
}

impl ServiceSpec {
    /// `package/short_name`, always derived.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.package, self.short_name)
    }
}

/// A structured type: an ordered sequence of fields plus constants.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructSpec {
    pub short_name: String,
    pub fields: Vec<FieldSpec>,
    pub constants: Vec<ConstantSpec>,

    /// Source text as written, when parsed from a file.
    pub source: Option<String>,
}

impl StructSpec {
    pub fn new(short_name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            short_name: short_name.into(),
            fields,
            constants: Vec::new(),
            source: None,
        }
    }

    pub fn with_constants(mut self, constants: Vec<ConstantSpec>) -> Self {
        self.constants = constants;
        self
    }

    /// The declaration text: the original source, or a rendering of the
    /// constants and fields when the struct was built in code.
    pub fn definition_text(&self) -> String {
        if let Some(source) = &self.source {
            return source.clone();
        }
        let mut text = String::new();
        for constant in &self.constants {
            text.push_str(&constant.to_string());
            text.push('\n');
        }
        for field in &self.fields {
            text.push_str(&field.to_string());
            text.push('\n');
        }
        text
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One typed field of a [`StructSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,

    /// Element type without array suffix: a primitive or a struct reference,
    /// optionally `pkg/`-qualified.
    pub type_name: String,

    pub is_array: bool,

    /// Length of a fixed-size array.
    pub array_len: Option<usize>,
}

impl FieldSpec {
    /// A scalar field.
    pub fn scalar(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_array: false,
            array_len: None,
        }
    }

    /// A variable-length array field.
    pub fn array(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            is_array: true,
            ..Self::scalar(type_name, name)
        }
    }

    /// A fixed-length array field.
    pub fn fixed_array(type_name: impl Into<String>, name: impl Into<String>, len: usize) -> Self {
        Self {
            is_array: true,
            array_len: Some(len),
            ..Self::scalar(type_name, name)
        }
    }

    /// `""`, `"[]"` or `"[N]"`.
    pub fn array_suffix(&self) -> String {
        match (self.is_array, self.array_len) {
            (false, _) => String::new(),
            (true, None) => "[]".to_string(),
            (true, Some(len)) => format!("[{len}]"),
        }
    }

    /// Type as written, including the array suffix.
    pub fn full_type(&self) -> String {
        format!("{}{}", self.type_name, self.array_suffix())
    }

    /// Whether the field is a variable-length array.
    pub fn is_variable_array(&self) -> bool {
        self.is_array && self.array_len.is_none()
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.full_type(), self.name)
    }
}

/// A named constant declared alongside the fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantSpec {
    pub type_name: String,
    pub name: String,

    /// Value text; trimmed for every type except `string`.
    pub value: String,
}

impl ConstantSpec {
    pub fn new(
        type_name: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for ConstantSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}={}", self.type_name, self.name, self.value)
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn ServiceSpec___full_name___joins_package_and_name() {
        let spec = ServiceSpec {
            package: "my_pkg".into(),
            short_name: "AddTwoInts".into(),
            request: StructSpec::new("AddTwoIntsRequest", vec![]),
            response: StructSpec::new("AddTwoIntsResponse", vec![]),
        };

        assert_eq!(spec.full_name(), "my_pkg/AddTwoInts");
    }

    #[test]
    fn FieldSpec___full_type___renders_array_suffix() {
        assert_eq!(FieldSpec::scalar("int32", "a").full_type(), "int32");
        assert_eq!(FieldSpec::array("int32", "a").full_type(), "int32[]");
        assert_eq!(FieldSpec::fixed_array("int32", "a", 3).full_type(), "int32[3]");
    }

    #[test]
    fn StructSpec___definition_text___renders_constants_then_fields() {
        let spec = StructSpec::new(
            "Mode",
            vec![FieldSpec::scalar("uint8", "mode"), FieldSpec::array("string", "names")],
        )
        .with_constants(vec![ConstantSpec::new("uint8", "AUTO", "1")]);

        assert_eq!(spec.definition_text(), "uint8 AUTO=1\nuint8 mode\nstring[] names\n");
    }

    #[test]
    fn StructSpec___definition_text___prefers_source() {
        let mut spec = StructSpec::new("A", vec![FieldSpec::scalar("int32", "a")]);
        spec.source = Some("# comment\nint32 a\n".into());

        assert_eq!(spec.definition_text(), "# comment\nint32 a\n");
    }
}
