#![allow(non_snake_case)]

use super::*;
use srvgen_core::{MemorySource, parse_service};
use test_case::test_case;

fn emit(
    package: &str,
    short_name: &str,
    text: &str,
    source: &MemorySource,
) -> GenResult<ServiceBinding> {
    let types = TypeTable::standard();
    let target = JavaTarget::default();
    let spec = parse_service(&types, package, short_name, text)?;
    ServiceEmitter::new(&types, source, &target, HashAlgorithm::Md5).emit_service(&spec)
}

#[test]
fn ServiceEmitter___int_request_string_response___shares_identity() {
    let binding = emit("my_pkg", "Echo", "int32 a\n---\nstring b\n", &MemorySource::new()).unwrap();
    let code = &binding.text;
    let hash = binding.analysis.hash.as_str();

    assert!(code.contains("public Echo.Request createRequest() {"));
    assert!(code.contains("public Echo.Response createResponse() {"));
    assert_eq!(code.matches("\"my_pkg/Echo\"").count(), 3, "{code}");
    assert_eq!(
        code.matches(&format!("return \"{hash}\";")).count(),
        5,
        "service MD5Sum plus MD5Sum and ServerMD5Sum in each sub-binding"
    );
    assert!(code.contains("public int a = 0;"));
    assert!(code.contains("public java.lang.String b = \"\";"));
}

#[test]
fn ServiceEmitter___class_layout___matches_runtime_contract() {
    let binding = emit("my_pkg", "Echo", "int32 a\n---\nstring b\n", &MemorySource::new()).unwrap();
    let code = &binding.text;

    assert!(code.starts_with("package ros.pkg.my_pkg.srv;\n\n"));
    assert!(code.contains(
        "public class Echo extends ros.communication.Service<Echo.Request, Echo.Response> {"
    ));
    assert!(code.contains(
        "public java.lang.String getDataType() { return Echo.__s_getDataType(); }"
    ));
    assert!(code.contains("  public static class Request extends ros.communication.Message {"));
    assert!(code.contains("  public static class Response extends ros.communication.Message {"));
    assert!(code.ends_with("} //class\n"));
}

#[test]
fn ServiceEmitter___add_two_ints___reference_hash() {
    let binding = emit(
        "test_ros",
        "AddTwoInts",
        "int64 a\nint64 b\n---\nint64 sum\n",
        &MemorySource::new(),
    )
    .unwrap();

    assert_eq!(binding.analysis.hash.as_str(), "6a2e34150c00229791cc89ff309fff21");
}

#[test]
fn ServiceEmitter___sub_binding_definition___only_its_own_dependencies() {
    let types = TypeTable::standard();
    let source = MemorySource::new()
        .with_text(&types, "geometry_msgs", "Point", "float64 x\nfloat64 y\nfloat64 z\n")
        .unwrap();

    let text = "string name\n---\ngeometry_msgs/Point where\n";
    let binding = emit("nav", "Locate", text, &source).unwrap();
    let code = &binding.text;

    assert_eq!(binding.analysis.closure.names(), vec!["geometry_msgs/Point"]);
    assert_eq!(code.matches("MSG: geometry_msgs/Point").count(), 1);
    assert!(code.contains("__s_getMessageDefinition() { return \"string name\\n\"; }"));
}

#[test]
fn ServiceEmitter___unresolved_type___keeps_error_kind() {
    let result = emit("p", "Broken", "missing_pkg/Thing t\n---\n", &MemorySource::new());

    match result {
        Err(GenError::UnresolvedType { type_name, .. }) => {
            assert_eq!(type_name, "missing_pkg/Thing")
        }
        other => panic!("expected UnresolvedType, got {other:?}"),
    }
}

#[test_case("cyc/A[] items\n---\n" ; "array of self-containing struct")]
#[test_case("cyc/A a\n---\n" ; "self-containing request field")]
#[test_case("---\nint32 code\ncyc/B b\n" ; "self-containing response field")]
fn ServiceEmitter___unserializable_struct___invalid_spec_names_service(text: &str) {
    let types = TypeTable::standard();
    let source = MemorySource::new()
        .with_text(&types, "cyc", "A", "cyc/B b\n")
        .unwrap()
        .with_text(&types, "cyc", "B", "cyc/A a\n")
        .unwrap();

    let result = emit("cyc", "Loop", text, &source);

    match result {
        Err(GenError::InvalidSpec(message)) => {
            assert!(message.starts_with("cyc/Loop: "), "{message}")
        }
        other => panic!("expected InvalidSpec, got {other:?}"),
    }
}

#[test]
fn ServiceEmitter___analyze___cycle_hash_is_defined() {
    let types = TypeTable::standard();
    let target = JavaTarget::default();
    let source = MemorySource::new()
        .with_text(&types, "cyc", "A", "cyc/B b\n")
        .unwrap()
        .with_text(&types, "cyc", "B", "cyc/A[] a\n")
        .unwrap();
    let spec = parse_service(&types, "cyc", "Walk", "cyc/A start\n---\n").unwrap();
    let emitter = ServiceEmitter::new(&types, &source, &target, HashAlgorithm::Md5);

    let first = emitter.analyze(&spec).unwrap();
    let second = emitter.analyze(&spec).unwrap();

    assert_eq!(first.hash, second.hash);
    assert_eq!(first.closure.len(), 2);
}

#[test]
fn ServiceEmitter___sha256___longer_hash() {
    let types = TypeTable::standard();
    let target = JavaTarget::default();
    let source = MemorySource::new();
    let spec = parse_service(&types, "p", "S", "int32 a\n---\n").unwrap();

    let analysis = ServiceEmitter::new(&types, &source, &target, HashAlgorithm::Sha256)
        .analyze(&spec)
        .unwrap();

    assert_eq!(analysis.hash.as_str().len(), 64);
}

#[test]
fn ServiceEmitter___same_input___byte_identical() {
    let text = "int32 a\nstring[] tags\n---\nbool ok\n";

    let first = emit("p", "Tag", text, &MemorySource::new()).unwrap();
    let second = emit("p", "Tag", text, &MemorySource::new()).unwrap();

    assert_eq!(first.text, second.text);
}
