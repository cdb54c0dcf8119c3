//! Naming convention utilities for Java code generation.
//!
//! | Input | Function | Output |
//! |-------|----------|--------|
//! | `word` | [`capitalize`] | `Word` |
//! | `class` | [`java_identifier`] | `class_` |
//! | `xyz` | [`length_constant`] | `XYZ_LENGTH` |

/// Java reserved words and literals that cannot name a field.
const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "null", "package", "private", "protected", "public", "return", "short",
    "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "true", "try", "void", "volatile", "while",
];

/// Capitalize the first letter of a string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(capitalize("hello"), "Hello");
/// assert_eq!(capitalize(""), "");
/// ```
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Schema field name as a Java identifier.
///
/// Schema names are already `[A-Za-z][A-Za-z0-9_]*`; only keywords and
/// names starting with the generator's reserved `__` prefix need escaping.
pub fn java_identifier(name: &str) -> String {
    if JAVA_KEYWORDS.contains(&name) || name.starts_with("__") {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Name of the length constant emitted for a fixed-size array field.
pub fn length_constant(field_name: &str) -> String {
    format!("{}_LENGTH", field_name.to_uppercase())
}

/// Escape `s` as the body of a Java string literal.
pub fn java_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use test_case::test_case;

    #[test]
    fn capitalize___capitalizes_first_letter() {
        assert_eq!(capitalize("hello"), "Hello");
        assert_eq!(capitalize("MD5Sum"), "MD5Sum");
        assert_eq!(capitalize("a"), "A");
        assert_eq!(capitalize(""), "");
    }

    #[test_case("class", "class_" ; "keyword")]
    #[test_case("null", "null_" ; "literal")]
    #[test_case("__bb", "__bb_" ; "reserved prefix")]
    #[test_case("frame_id", "frame_id" ; "plain name")]
    #[test_case("Class", "Class" ; "case sensitive")]
    fn java_identifier___escapes_only_when_needed(name: &str, expected: &str) {
        assert_eq!(java_identifier(name), expected);
    }

    #[test]
    fn length_constant___uppercases_field_name() {
        assert_eq!(length_constant("xyz"), "XYZ_LENGTH");
        assert_eq!(length_constant("joint_names"), "JOINT_NAMES_LENGTH");
    }

    #[test]
    fn java_string_literal___escapes_specials() {
        assert_eq!(java_string_literal("a\"b"), "\"a\\\"b\"");
        assert_eq!(java_string_literal("x\ny"), "\"x\\ny\"");
        assert_eq!(java_string_literal("c:\\d"), "\"c:\\\\d\"");
        assert_eq!(java_string_literal("\u{1}"), "\"\\u0001\"");
    }
}
