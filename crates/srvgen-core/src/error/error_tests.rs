#![allow(non_snake_case)]

use super::*;
use test_case::test_case;

#[test]
fn GenError___unresolved_type___displays_reference() {
    let err = GenError::UnresolvedType {
        type_name: "geometry_msgs/Point".into(),
        referenced_from: "my_pkg/GetPoint".into(),
    };

    let display = err.to_string();

    assert_eq!(
        display,
        "unresolved type 'geometry_msgs/Point' referenced from my_pkg/GetPoint"
    );
}

#[test]
fn GenError___invalid_spec___displays_message() {
    let err = GenError::InvalidSpec("duplicate field 'a'".into());

    assert_eq!(err.to_string(), "invalid spec: duplicate field 'a'");
}

#[test]
fn GenError___output_write___names_path() {
    let err = GenError::OutputWrite {
        path: PathBuf::from("/out/pkg/srv/Foo.java"),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    };

    let display = err.to_string();

    assert!(display.contains("/out/pkg/srv/Foo.java"));
    assert!(display.contains("denied"));
}

#[test_case(
    GenError::UnresolvedType { type_name: "a".into(), referenced_from: "b".into() },
    1,
    true
)]
#[test_case(GenError::InvalidSpec("x".into()), 2, true)]
#[test_case(
    GenError::OutputWrite { path: PathBuf::new(), source: std::io::Error::other("x") },
    3,
    false
)]
#[test_case(
    GenError::Io { path: PathBuf::new(), source: std::io::Error::other("x") },
    4,
    false
)]
#[test_case(GenError::Config("x".into()), 5, false)]
fn GenError___variant___maps_code_and_scope(err: GenError, code: u32, per_file: bool) {
    assert_eq!(err.error_code(), code);
    assert_eq!(err.is_per_file(), per_file);
}

#[test]
fn GenError___from_toml_error___converts_to_config() {
    let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();

    let err: GenError = toml_err.into();

    assert!(matches!(err, GenError::Config(_)));
}
