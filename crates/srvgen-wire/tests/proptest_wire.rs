//! Property-based tests for the wire codec
//!
//! Tests that encoded values decode to themselves, that the computed length
//! matches the encoding, and that every truncation of a valid encoding is
//! reported as a truncated buffer.

use proptest::prelude::*;
use srvgen_core::{
    DependencyClosure, MemorySource, StructSpec, TypeResolver, TypeTable, parse_message,
};
use srvgen_wire::{Value, WireCodec, WireError};

const SCHEMA: &str = "\
int32 a
string b
uint8[3] rgb
float64[] samples
bool flag
time stamp
geometry_msgs/Point[] points
";

fn schema() -> (TypeTable, StructSpec, DependencyClosure) {
    let types = TypeTable::standard();
    let source = MemorySource::new()
        .with_text(&types, "geometry_msgs", "Point", "float64 x\nfloat64 y\nfloat64 z\n")
        .expect("Point should parse");
    let spec = parse_message(&types, "Sample", SCHEMA).expect("schema should parse");
    let closure = TypeResolver::new(&types, &source)
        .resolve(&spec, "test_pkg")
        .expect("schema should resolve");
    (types, spec, closure)
}

// Strategy: finite floats so equality holds after a round trip
fn arb_f64() -> impl Strategy<Value = f64> {
    -1.0e9f64..1.0e9f64
}

fn arb_point() -> impl Strategy<Value = Value> {
    (arb_f64(), arb_f64(), arb_f64())
        .prop_map(|(x, y, z)| Value::Struct(vec![Value::F64(x), Value::F64(y), Value::F64(z)]))
}

// Strategy: values matching SCHEMA
fn arb_sample() -> impl Strategy<Value = Value> {
    (
        any::<i32>(),
        ".{0,16}",
        any::<[u8; 3]>(),
        prop::collection::vec(arb_f64(), 0..4),
        any::<bool>(),
        (any::<u32>(), 0u32..1_000_000_000),
        prop::collection::vec(arb_point(), 0..3),
    )
        .prop_map(|(a, b, rgb, samples, flag, (secs, nsecs), points)| {
            Value::Struct(vec![
                Value::I32(a),
                Value::String(b),
                Value::Array(rgb.into_iter().map(Value::U8).collect()),
                Value::Array(samples.into_iter().map(Value::F64).collect()),
                Value::Bool(flag),
                Value::Time { secs, nsecs },
                Value::Array(points),
            ])
        })
}

proptest! {
    /// Property: decode(encode(v)) == v
    #[test]
    fn proptest_encode_decode_roundtrip(value in arb_sample()) {
        let (types, spec, closure) = schema();
        let codec = WireCodec::new(&types, &closure);

        let bytes = codec.encode(&spec, "test_pkg", &value).expect("encode should succeed");
        let decoded = codec.decode(&spec, "test_pkg", &bytes).expect("decode should succeed");

        prop_assert_eq!(decoded, value);
    }

    /// Property: serialized_len matches the encoded byte count
    #[test]
    fn proptest_serialized_len_matches_encoding(value in arb_sample()) {
        let (types, spec, closure) = schema();
        let codec = WireCodec::new(&types, &closure);

        let bytes = codec.encode(&spec, "test_pkg", &value).expect("encode should succeed");
        let len = codec.serialized_len(&spec, "test_pkg", &value).expect("len should succeed");

        prop_assert_eq!(len, bytes.len());
    }

    /// Property: every strict prefix of an encoding is a truncated buffer
    #[test]
    fn proptest_truncation_is_always_reported(value in arb_sample()) {
        let (types, spec, closure) = schema();
        let codec = WireCodec::new(&types, &closure);
        let bytes = codec.encode(&spec, "test_pkg", &value).expect("encode should succeed");

        for cut in 0..bytes.len() {
            let result = codec.decode(&spec, "test_pkg", &bytes[..cut]);
            prop_assert!(
                matches!(result, Err(WireError::TruncatedBuffer { .. })),
                "cut at {} of {}: {:?}",
                cut,
                bytes.len(),
                result
            );
        }
    }

    /// Property: arbitrary bytes never panic the decoder
    #[test]
    fn proptest_decode_arbitrary_bytes_does_not_panic(
        bytes in prop::collection::vec(any::<u8>(), 0..256)
    ) {
        let (types, spec, closure) = schema();
        let codec = WireCodec::new(&types, &closure);

        let _ = codec.decode(&spec, "test_pkg", &bytes);
    }
}
