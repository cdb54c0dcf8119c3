//! Reference codec for the binding wire layout.
//!
//! Fields are written in declaration order:
//!
//! - fixed-width primitives: little-endian, natural width
//! - `bool`: one byte, 0 or 1
//! - `string`: `u32` byte length + UTF-8 bytes
//! - `time` / `duration`: secs + nsecs, 4 bytes each
//! - variable array: `u32` element count + elements
//! - fixed array: elements only
//! - nested struct: its fields, recursively
//!
//! Decoding checks the remaining length before every read and validates
//! length prefixes against what is left, so a short buffer always yields
//! [`WireError::TruncatedBuffer`] and never an out-of-bounds read.

use crate::error::WireError;
use srvgen_core::{DependencyClosure, FieldSpec, Primitive, StructSpec, TypeTable};
use std::collections::HashSet;

const LENGTH_PREFIX: usize = 4;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Time { secs: u32, nsecs: u32 },
    Duration { secs: i32, nsecs: i32 },
    Array(Vec<Value>),
    /// Field values in declaration order.
    Struct(Vec<Value>),
}

impl Value {
    /// Field values of a struct value.
    pub fn as_struct(&self) -> Option<&[Value]> {
        match self {
            Value::Struct(fields) => Some(fields),
            _ => None,
        }
    }
}

/// Default limit on struct nesting, counting the root value as one level.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Element type of a field after resolution.
enum Element<'a> {
    Primitive(Primitive),
    Struct {
        full_name: String,
        package: &'a str,
        spec: &'a StructSpec,
    },
}

/// A struct being decoded: the fields read so far and any array in progress.
struct DecodeFrame<'s> {
    spec: &'s StructSpec,
    package: &'s str,
    values: Vec<Value>,
    /// Items of the current array field and how many are still due
    array: Option<(Vec<Value>, usize)>,
}

impl<'s> DecodeFrame<'s> {
    fn new(spec: &'s StructSpec, package: &'s str) -> Self {
        Self {
            spec,
            package,
            values: Vec::with_capacity(spec.fields.len()),
            array: None,
        }
    }

    fn current_field(&self) -> Option<&'s FieldSpec> {
        self.spec.fields.get(self.values.len())
    }

    fn push(&mut self, value: Value) {
        match &mut self.array {
            Some((items, due)) => {
                items.push(value);
                *due -= 1;
            }
            None => self.values.push(value),
        }
    }
}

/// Encodes and decodes values of structs in a resolved closure.
///
/// Every entry point first checks that `spec` has a finite encoding, so a
/// struct containing itself without an array in between is rejected with
/// [`WireError::UnboundedRecursion`] before any bytes are touched. Values
/// nesting deeper than the depth limit fail with
/// [`WireError::NestingTooDeep`].
pub struct WireCodec<'a> {
    types: &'a TypeTable,
    closure: &'a DependencyClosure,
    max_depth: usize,
}

impl<'a> WireCodec<'a> {
    pub fn new(types: &'a TypeTable, closure: &'a DependencyClosure) -> Self {
        Self {
            types,
            closure,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Replace the nesting limit; at least the root level is always allowed.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Encode `value`, a [`Value::Struct`] of `spec`.
    pub fn encode(
        &self,
        spec: &StructSpec,
        package: &str,
        value: &Value,
    ) -> Result<Vec<u8>, WireError> {
        self.min_len(spec, package)?;
        let mut out = Vec::with_capacity(self.struct_len(spec, package, value, 1)?);
        self.write_struct(&mut out, spec, package, value, 1)?;
        Ok(out)
    }

    /// Decode exactly one value of `spec` from `bytes`.
    pub fn decode(
        &self,
        spec: &StructSpec,
        package: &str,
        bytes: &[u8],
    ) -> Result<Value, WireError> {
        let mut reader = WireReader::new(bytes);
        let value = self.decode_from(&mut reader, spec, package)?;
        if reader.remaining() > 0 {
            return Err(WireError::TrailingBytes {
                remaining: reader.remaining(),
            });
        }
        Ok(value)
    }

    /// Decode one value of `spec` from the reader's current position.
    pub fn decode_from(
        &self,
        reader: &mut WireReader<'_>,
        spec: &StructSpec,
        package: &str,
    ) -> Result<Value, WireError> {
        self.min_len(spec, package)?;
        self.read_struct(reader, spec, package)
    }

    /// Encoded size of `value` in bytes.
    pub fn serialized_len(
        &self,
        spec: &StructSpec,
        package: &str,
        value: &Value,
    ) -> Result<usize, WireError> {
        self.min_len(spec, package)?;
        self.struct_len(spec, package, value, 1)
    }

    /// A zeroed value: empty strings and variable arrays, filled fixed arrays.
    pub fn default_value(&self, spec: &StructSpec, package: &str) -> Result<Value, WireError> {
        let mut on_path = HashSet::new();
        self.default_struct(spec, package, &mut on_path)
    }

    /// Smallest possible encoding of `spec`.
    pub fn min_len(&self, spec: &StructSpec, package: &str) -> Result<usize, WireError> {
        let mut on_path = HashSet::new();
        self.min_struct_len(spec, package, &mut on_path)
    }

    fn element(&self, field: &FieldSpec, package: &str) -> Result<Element<'a>, WireError> {
        if let Some(primitive) = self.types.lookup(&field.type_name) {
            return Ok(Element::Primitive(primitive));
        }
        let full_name = self
            .types
            .qualify(&field.type_name, package)
            .ok_or_else(|| WireError::UnknownType(field.type_name.clone()))?;
        let entry = self
            .closure
            .get(&full_name)
            .ok_or_else(|| WireError::UnknownType(full_name.clone()))?;
        Ok(Element::Struct {
            full_name,
            package: &entry.package,
            spec: &entry.spec,
        })
    }

    /// Depth of a struct nested one level below `depth`.
    fn nested(&self, depth: usize) -> Result<usize, WireError> {
        if depth >= self.max_depth {
            return Err(WireError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        Ok(depth + 1)
    }

    fn struct_len(
        &self,
        spec: &StructSpec,
        package: &str,
        value: &Value,
        depth: usize,
    ) -> Result<usize, WireError> {
        let fields = struct_fields(spec, value)?;
        let mut len = 0;
        for (field, field_value) in spec.fields.iter().zip(fields) {
            let element = self.element(field, package)?;
            if field.is_array {
                let items = array_items(field, field_value)?;
                if field.is_variable_array() {
                    len += LENGTH_PREFIX;
                }
                for item in items {
                    len += self.element_len(field, &element, item, depth)?;
                }
            } else {
                len += self.element_len(field, &element, field_value, depth)?;
            }
        }
        Ok(len)
    }

    fn element_len(
        &self,
        field: &FieldSpec,
        element: &Element<'_>,
        value: &Value,
        depth: usize,
    ) -> Result<usize, WireError> {
        match element {
            Element::Primitive(Primitive::String) => match value {
                Value::String(s) => Ok(LENGTH_PREFIX + s.len()),
                _ => Err(mismatch(field, "string")),
            },
            Element::Primitive(primitive) => {
                check_primitive(field, *primitive, value)?;
                Ok(primitive.min_wire_size())
            }
            Element::Struct { spec, package, .. } => {
                self.struct_len(spec, package, value, self.nested(depth)?)
            }
        }
    }

    fn write_struct(
        &self,
        out: &mut Vec<u8>,
        spec: &StructSpec,
        package: &str,
        value: &Value,
        depth: usize,
    ) -> Result<(), WireError> {
        let fields = struct_fields(spec, value)?;
        for (field, field_value) in spec.fields.iter().zip(fields) {
            let element = self.element(field, package)?;
            if field.is_array {
                let items = array_items(field, field_value)?;
                if field.is_variable_array() {
                    write_length(out, field, items.len())?;
                }
                for item in items {
                    self.write_element(out, field, &element, item, depth)?;
                }
            } else {
                self.write_element(out, field, &element, field_value, depth)?;
            }
        }
        Ok(())
    }

    fn write_element(
        &self,
        out: &mut Vec<u8>,
        field: &FieldSpec,
        element: &Element<'_>,
        value: &Value,
        depth: usize,
    ) -> Result<(), WireError> {
        match element {
            Element::Struct { spec, package, .. } => {
                self.write_struct(out, spec, package, value, self.nested(depth)?)
            }
            Element::Primitive(primitive) => write_primitive(out, field, *primitive, value),
        }
    }

    /// Decode with an explicit stack of frames; nesting depth is bounded by
    /// the limit, not by the call stack.
    fn read_struct<'s>(
        &self,
        reader: &mut WireReader<'_>,
        spec: &'s StructSpec,
        package: &'s str,
    ) -> Result<Value, WireError>
    where
        'a: 's,
    {
        let mut parents: Vec<DecodeFrame<'s>> = Vec::new();
        let mut frame = DecodeFrame::new(spec, package);

        loop {
            if matches!(frame.array, Some((_, 0))) {
                if let Some((items, _)) = frame.array.take() {
                    frame.values.push(Value::Array(items));
                }
                continue;
            }

            let Some(field) = frame.current_field() else {
                let value = Value::Struct(std::mem::take(&mut frame.values));
                match parents.pop() {
                    Some(parent) => {
                        frame = parent;
                        frame.push(value);
                        continue;
                    }
                    None => return Ok(value),
                }
            };

            let element = self.element(field, frame.package)?;
            if field.is_array && frame.array.is_none() {
                let count = match field.array_len {
                    Some(len) => len,
                    None => reader.read_count(self.element_min_len(&element)?)?,
                };
                frame.array = Some((Vec::with_capacity(count.min(reader.remaining())), count));
                continue;
            }

            match element {
                Element::Primitive(primitive) => frame.push(reader.read_primitive(primitive)?),
                Element::Struct { spec, package, .. } => {
                    self.nested(parents.len() + 1)?;
                    let child = DecodeFrame::new(spec, package);
                    parents.push(std::mem::replace(&mut frame, child));
                }
            }
        }
    }

    fn element_min_len(&self, element: &Element<'_>) -> Result<usize, WireError> {
        match element {
            Element::Primitive(primitive) => Ok(primitive.min_wire_size()),
            Element::Struct { spec, package, .. } => self.min_len(spec, package),
        }
    }

    fn min_struct_len(
        &self,
        spec: &StructSpec,
        package: &str,
        on_path: &mut HashSet<String>,
    ) -> Result<usize, WireError> {
        let mut len = 0;
        for field in &spec.fields {
            if field.is_variable_array() {
                len += LENGTH_PREFIX;
                continue;
            }
            let count = field.array_len.unwrap_or(1);
            let element_len = match self.element(field, package)? {
                Element::Primitive(primitive) => primitive.min_wire_size(),
                Element::Struct {
                    full_name,
                    package,
                    spec,
                } => {
                    if !on_path.insert(full_name.clone()) {
                        return Err(WireError::UnboundedRecursion(full_name));
                    }
                    let nested = self.min_struct_len(spec, package, on_path)?;
                    on_path.remove(&full_name);
                    nested
                }
            };
            len += count * element_len;
        }
        Ok(len)
    }

    fn default_struct(
        &self,
        spec: &StructSpec,
        package: &str,
        on_path: &mut HashSet<String>,
    ) -> Result<Value, WireError> {
        let mut values = Vec::with_capacity(spec.fields.len());
        for field in &spec.fields {
            if field.is_variable_array() {
                values.push(Value::Array(Vec::new()));
                continue;
            }
            let element = match self.element(field, package)? {
                Element::Primitive(primitive) => default_primitive(primitive),
                Element::Struct {
                    full_name,
                    package,
                    spec,
                } => {
                    if !on_path.insert(full_name.clone()) {
                        return Err(WireError::UnboundedRecursion(full_name));
                    }
                    let nested = self.default_struct(spec, package, on_path)?;
                    on_path.remove(&full_name);
                    nested
                }
            };
            values.push(match field.array_len {
                Some(len) => Value::Array(vec![element; len]),
                None => element,
            });
        }
        Ok(Value::Struct(values))
    }
}

/// Bounds-checked little-endian reader over a byte slice.
pub struct WireReader<'b> {
    buf: &'b [u8],
    pos: usize,
}

impl<'b> WireReader<'b> {
    pub fn new(buf: &'b [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'b [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::TruncatedBuffer {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    /// Read a length prefix for items of at least `min_item_len` bytes and
    /// reject it when the rest of the buffer cannot hold that many.
    pub fn read_count(&mut self, min_item_len: usize) -> Result<usize, WireError> {
        let offset = self.pos;
        let count = self.read_u32()? as usize;
        let needed = count.saturating_mul(min_item_len);
        if needed > self.remaining() {
            return Err(WireError::TruncatedBuffer {
                offset,
                needed: needed.saturating_add(LENGTH_PREFIX),
                remaining: self.remaining() + LENGTH_PREFIX,
            });
        }
        Ok(count)
    }

    pub fn read_primitive(&mut self, primitive: Primitive) -> Result<Value, WireError> {
        Ok(match primitive {
            Primitive::Bool => Value::Bool(self.take_array::<1>()?[0] != 0),
            Primitive::I8 => Value::I8(i8::from_le_bytes(self.take_array()?)),
            Primitive::U8 => Value::U8(u8::from_le_bytes(self.take_array()?)),
            Primitive::I16 => Value::I16(i16::from_le_bytes(self.take_array()?)),
            Primitive::U16 => Value::U16(u16::from_le_bytes(self.take_array()?)),
            Primitive::I32 => Value::I32(i32::from_le_bytes(self.take_array()?)),
            Primitive::U32 => Value::U32(u32::from_le_bytes(self.take_array()?)),
            Primitive::I64 => Value::I64(i64::from_le_bytes(self.take_array()?)),
            Primitive::U64 => Value::U64(u64::from_le_bytes(self.take_array()?)),
            Primitive::F32 => Value::F32(f32::from_le_bytes(self.take_array()?)),
            Primitive::F64 => Value::F64(f64::from_le_bytes(self.take_array()?)),
            Primitive::String => {
                let len = self.read_count(1)?;
                let offset = self.pos;
                let bytes = self.take(len)?;
                let s =
                    std::str::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8 { offset })?;
                Value::String(s.to_string())
            }
            Primitive::Time => Value::Time {
                secs: u32::from_le_bytes(self.take_array()?),
                nsecs: u32::from_le_bytes(self.take_array()?),
            },
            Primitive::Duration => Value::Duration {
                secs: i32::from_le_bytes(self.take_array()?),
                nsecs: i32::from_le_bytes(self.take_array()?),
            },
        })
    }
}

fn struct_fields<'v>(spec: &StructSpec, value: &'v Value) -> Result<&'v [Value], WireError> {
    match value {
        Value::Struct(fields) if fields.len() == spec.fields.len() => Ok(fields),
        _ => Err(WireError::TypeMismatch {
            field: spec.short_name.clone(),
            expected: format!("struct with {} fields", spec.fields.len()),
        }),
    }
}

fn array_items<'v>(field: &FieldSpec, value: &'v Value) -> Result<&'v [Value], WireError> {
    let Value::Array(items) = value else {
        return Err(mismatch(field, "array"));
    };
    if let Some(expected) = field.array_len {
        if items.len() != expected {
            return Err(WireError::FixedLengthMismatch {
                field: field.name.clone(),
                expected,
                actual: items.len(),
            });
        }
    }
    Ok(items)
}

fn write_length(out: &mut Vec<u8>, field: &FieldSpec, len: usize) -> Result<(), WireError> {
    let len = u32::try_from(len).map_err(|_| WireError::LengthOverflow {
        field: field.name.clone(),
        len,
    })?;
    out.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

fn write_primitive(
    out: &mut Vec<u8>,
    field: &FieldSpec,
    primitive: Primitive,
    value: &Value,
) -> Result<(), WireError> {
    check_primitive(field, primitive, value)?;
    match value {
        Value::Bool(v) => out.push(u8::from(*v)),
        Value::I8(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::U8(v) => out.push(*v),
        Value::I16(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::I32(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::I64(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::U64(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::F32(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::F64(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::String(s) => {
            write_length(out, field, s.len())?;
            out.extend_from_slice(s.as_bytes());
        }
        Value::Time { secs, nsecs } => {
            out.extend_from_slice(&secs.to_le_bytes());
            out.extend_from_slice(&nsecs.to_le_bytes());
        }
        Value::Duration { secs, nsecs } => {
            out.extend_from_slice(&secs.to_le_bytes());
            out.extend_from_slice(&nsecs.to_le_bytes());
        }
        Value::Array(_) | Value::Struct(_) => return Err(mismatch(field, "primitive")),
    }
    Ok(())
}

fn check_primitive(
    field: &FieldSpec,
    primitive: Primitive,
    value: &Value,
) -> Result<(), WireError> {
    let ok = matches!(
        (primitive, value),
        (Primitive::Bool, Value::Bool(_))
            | (Primitive::I8, Value::I8(_))
            | (Primitive::U8, Value::U8(_))
            | (Primitive::I16, Value::I16(_))
            | (Primitive::U16, Value::U16(_))
            | (Primitive::I32, Value::I32(_))
            | (Primitive::U32, Value::U32(_))
            | (Primitive::I64, Value::I64(_))
            | (Primitive::U64, Value::U64(_))
            | (Primitive::F32, Value::F32(_))
            | (Primitive::F64, Value::F64(_))
            | (Primitive::String, Value::String(_))
            | (Primitive::Time, Value::Time { .. })
            | (Primitive::Duration, Value::Duration { .. })
    );
    if ok {
        Ok(())
    } else {
        Err(mismatch(field, &field.type_name))
    }
}

fn default_primitive(primitive: Primitive) -> Value {
    match primitive {
        Primitive::Bool => Value::Bool(false),
        Primitive::I8 => Value::I8(0),
        Primitive::U8 => Value::U8(0),
        Primitive::I16 => Value::I16(0),
        Primitive::U16 => Value::U16(0),
        Primitive::I32 => Value::I32(0),
        Primitive::U32 => Value::U32(0),
        Primitive::I64 => Value::I64(0),
        Primitive::U64 => Value::U64(0),
        Primitive::F32 => Value::F32(0.0),
        Primitive::F64 => Value::F64(0.0),
        Primitive::String => Value::String(String::new()),
        Primitive::Time => Value::Time { secs: 0, nsecs: 0 },
        Primitive::Duration => Value::Duration { secs: 0, nsecs: 0 },
    }
}

fn mismatch(field: &FieldSpec, expected: &str) -> WireError {
    WireError::TypeMismatch {
        field: field.name.clone(),
        expected: expected.to_string(),
    }
}
