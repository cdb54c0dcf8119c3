//! Parser for `.msg` and `.srv` schema files.
//!
//! The grammar is line oriented:
//!
//! ```text
//! # comment
//! int32 a                 # scalar field
//! float64[3] xyz          # fixed-size array
//! geometry_msgs/Point[] p # variable array of a qualified struct
//! uint8 MODE_AUTO=1       # constant
//! string GREETING=hi # not a comment
//! ---                     # request/response separator (.srv only)
//! ```

use crate::error::{GenError, GenResult};
use crate::model::{ConstantSpec, FieldSpec, ServiceSpec, StructSpec};
use crate::types::{Primitive, TypeTable};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const SERVICE_SEPARATOR: &str = "---";
/// Files marking a package directory
pub(crate) const PACKAGE_MARKERS: &[&str] = &["package.xml", "manifest.xml"];

/// A service parsed from disk, with the package directory it lives in.
#[derive(Debug, Clone)]
pub struct LoadedService {
    pub path: PathBuf,
    pub package_dir: PathBuf,
    pub spec: ServiceSpec,
}

/// Parse the body of a `.msg` file.
pub fn parse_message(types: &TypeTable, short_name: &str, text: &str) -> GenResult<StructSpec> {
    if !is_identifier(short_name) {
        return Err(GenError::invalid(format!(
            "'{short_name}' is not a valid type name"
        )));
    }

    let mut spec = StructSpec::new(short_name, Vec::new());
    let mut seen = HashSet::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        match parse_line(types, line).map_err(|e| at_line(e, short_name, line_no))? {
            Line::Blank => {}
            Line::Field(field) => {
                if !seen.insert(field.name.clone()) {
                    return Err(GenError::invalid(format!(
                        "{short_name}:{line_no}: duplicate field name '{}'",
                        field.name
                    )));
                }
                spec.fields.push(field);
            }
            Line::Constant(constant) => {
                if !seen.insert(constant.name.clone()) {
                    return Err(GenError::invalid(format!(
                        "{short_name}:{line_no}: duplicate constant name '{}'",
                        constant.name
                    )));
                }
                spec.constants.push(constant);
            }
        }
    }

    spec.source = Some(text.to_string());
    Ok(spec)
}

/// Parse the body of a `.srv` file.
pub fn parse_service(
    types: &TypeTable,
    package: &str,
    short_name: &str,
    text: &str,
) -> GenResult<ServiceSpec> {
    if !is_identifier(short_name) {
        return Err(GenError::invalid(format!(
            "'{short_name}' is not a valid service name"
        )));
    }
    if !is_identifier(package) {
        return Err(GenError::invalid(format!(
            "'{package}' is not a valid package name"
        )));
    }

    let mut request_lines = Vec::new();
    let mut response_lines = Vec::new();
    let mut separators = 0;

    for line in text.lines() {
        let code = line.split_once('#').map_or(line, |(code, _)| code);
        if code.trim() == SERVICE_SEPARATOR {
            separators += 1;
            continue;
        }
        if separators == 0 {
            request_lines.push(line);
        } else {
            response_lines.push(line);
        }
    }

    if separators != 1 {
        return Err(GenError::invalid(format!(
            "{package}/{short_name}: expected exactly one '{SERVICE_SEPARATOR}' separator, \
             found {separators}"
        )));
    }

    let request = parse_message(
        types,
        &format!("{short_name}Request"),
        &join_lines(&request_lines),
    )?;
    let response = parse_message(
        types,
        &format!("{short_name}Response"),
        &join_lines(&response_lines),
    )?;

    Ok(ServiceSpec {
        package: package.to_string(),
        short_name: short_name.to_string(),
        request,
        response,
    })
}

/// Read and parse a `.srv` file, deriving package and name from its path.
pub fn load_service_file(types: &TypeTable, path: &Path) -> GenResult<LoadedService> {
    let text = std::fs::read_to_string(path).map_err(|source| GenError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let short_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| GenError::invalid(format!("cannot derive service name from {path:?}")))?;

    let package_dir = find_package_dir(path)
        .ok_or_else(|| GenError::invalid(format!("cannot determine package of {path:?}")))?;
    let package = package_dir
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| GenError::invalid(format!("cannot determine package of {path:?}")))?;

    let spec = parse_service(types, package, short_name, &text)?;

    Ok(LoadedService {
        path: path.to_path_buf(),
        package_dir,
        spec,
    })
}

/// Locate the package directory a schema file belongs to.
///
/// The nearest ancestor holding a package manifest wins; otherwise the
/// parent of the `srv`/`msg` directory, otherwise the file's own directory.
pub fn find_package_dir(path: &Path) -> Option<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    let parent = absolute.parent()?;

    for dir in parent.ancestors() {
        if PACKAGE_MARKERS.iter().any(|m| dir.join(m).is_file()) {
            return Some(dir.to_path_buf());
        }
    }

    match parent.file_name().and_then(|s| s.to_str()) {
        Some("srv") | Some("msg") => parent.parent().map(Path::to_path_buf),
        _ => Some(parent.to_path_buf()),
    }
}

/// Whether `s` is `[A-Za-z][A-Za-z0-9_]*`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

enum Line {
    Blank,
    Field(FieldSpec),
    Constant(ConstantSpec),
}

fn parse_line(types: &TypeTable, line: &str) -> GenResult<Line> {
    let content = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
    .trim();

    if content.is_empty() {
        return Ok(Line::Blank);
    }

    if let Some((decl, value)) = content.split_once('=') {
        let mut parts = decl.split_whitespace();
        let (Some(type_name), Some(name), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(GenError::invalid(format!(
                "malformed constant declaration '{content}'"
            )));
        };
        // String constants run to the end of the line, '#' included.
        let value = if type_name == "string" {
            line.split_once('=').map_or(value, |(_, raw)| raw)
        } else {
            value
        };
        return constant(types, type_name, name, value.trim());
    }

    let mut parts = content.split_whitespace();
    let (Some(type_token), Some(name), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(GenError::invalid(format!(
            "malformed field declaration '{content}'"
        )));
    };

    if !is_identifier(name) {
        return Err(GenError::invalid(format!("'{name}' is not a valid field name")));
    }

    let (type_name, is_array, array_len) = parse_type_token(type_token)?;

    Ok(Line::Field(FieldSpec {
        name: name.to_string(),
        type_name,
        is_array,
        array_len,
    }))
}

fn constant(types: &TypeTable, type_name: &str, name: &str, value: &str) -> GenResult<Line> {
    if !is_identifier(name) {
        return Err(GenError::invalid(format!(
            "'{name}' is not a valid constant name"
        )));
    }

    let primitive = types
        .lookup(type_name)
        .filter(|p| p.allows_constant())
        .ok_or_else(|| {
            GenError::invalid(format!(
                "constant '{name}' must have a non-array builtin type, got '{type_name}'"
            ))
        })?;

    if !constant_value_fits(primitive, value) {
        return Err(GenError::invalid(format!(
            "constant '{name}': '{value}' is not a valid {type_name}"
        )));
    }

    Ok(Line::Constant(ConstantSpec::new(type_name, name, value)))
}

fn constant_value_fits(primitive: Primitive, value: &str) -> bool {
    match primitive {
        Primitive::Bool => matches!(value, "true" | "false" | "True" | "False" | "0" | "1"),
        Primitive::I8 => value.parse::<i8>().is_ok(),
        Primitive::U8 => value.parse::<u8>().is_ok(),
        Primitive::I16 => value.parse::<i16>().is_ok(),
        Primitive::U16 => value.parse::<u16>().is_ok(),
        Primitive::I32 => value.parse::<i32>().is_ok(),
        Primitive::U32 => value.parse::<u32>().is_ok(),
        Primitive::I64 => value.parse::<i64>().is_ok(),
        Primitive::U64 => value.parse::<u64>().is_ok(),
        Primitive::F32 | Primitive::F64 => value.parse::<f64>().is_ok(),
        Primitive::String => true,
        Primitive::Time | Primitive::Duration => false,
    }
}

/// Split `base[len]` / `base[]` / `base` into its parts.
fn parse_type_token(token: &str) -> GenResult<(String, bool, Option<usize>)> {
    let (base, is_array, array_len) = match token.find('[') {
        None => (token, false, None),
        Some(open) => {
            let Some(inner) = token[open + 1..].strip_suffix(']') else {
                return Err(GenError::invalid(format!(
                    "malformed array type '{token}'"
                )));
            };
            let len = if inner.is_empty() {
                None
            } else {
                if !inner.chars().all(|c| c.is_ascii_digit()) {
                    return Err(GenError::invalid(format!(
                        "malformed array length in '{token}'"
                    )));
                }
                let len = inner.parse::<usize>().map_err(|_| {
                    GenError::invalid(format!("array length out of range in '{token}'"))
                })?;
                if len == 0 {
                    return Err(GenError::invalid(format!(
                        "array length must be positive in '{token}'"
                    )));
                }
                Some(len)
            };
            (&token[..open], true, len)
        }
    };

    if !is_type_reference(base) {
        return Err(GenError::invalid(format!("'{base}' is not a valid type")));
    }

    Ok((base.to_string(), is_array, array_len))
}

fn is_type_reference(s: &str) -> bool {
    match s.split_once('/') {
        Some((package, name)) => is_identifier(package) && is_identifier(name),
        None => is_identifier(s),
    }
}

fn at_line(err: GenError, short_name: &str, line_no: usize) -> GenError {
    match err {
        GenError::InvalidSpec(message) => {
            GenError::InvalidSpec(format!("{short_name}:{line_no}: {message}"))
        }
        other => other,
    }
}

fn join_lines(lines: &[&str]) -> String {
    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}
