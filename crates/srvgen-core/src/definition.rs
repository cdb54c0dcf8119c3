//! Full message definition text.
//!
//! The root's declaration followed by every dependency, each introduced by a
//! rule of `=` and a `MSG: pkg/Type` line. Bindings embed it so a receiver
//! can decode a type it has no generated code for.

use crate::model::StructSpec;
use crate::resolve::DependencyClosure;

const SECTION_RULE_WIDTH: usize = 80;

/// Render the definition of `root` with its dependencies in closure order.
pub fn full_definition(root: &StructSpec, closure: &DependencyClosure) -> String {
    let mut text = root.definition_text();
    ensure_newline(&mut text);

    for entry in closure.iter() {
        text.push_str(&"=".repeat(SECTION_RULE_WIDTH));
        text.push('\n');
        text.push_str(&format!("MSG: {}\n", entry.full_name));
        text.push_str(&entry.spec.definition_text());
        ensure_newline(&mut text);
    }

    text
}

fn ensure_newline(text: &mut String) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}
