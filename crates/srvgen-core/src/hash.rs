//! Compatibility hash derivation.
//!
//! Two bindings agree on a wire contract exactly when their compatibility
//! hashes are equal. The hash is a digest over a canonical text:
//!
//! ```text
//! <type> <NAME>=<value>      one line per constant
//! <type>[<suffix>] <name>    one line per primitive field
//! <nested-hash> <name>       one line per struct field (array suffix dropped)
//! ```
//!
//! Lines are joined with `\n` without a trailing newline. A nested type
//! contributes its own hash, so changing any nested shape changes every
//! hash above it. A service hashes the request text immediately followed
//! by the response text.
//!
//! The canonical grammar and the digest algorithm are a fixed contract with
//! the consuming runtime; [`HashAlgorithm::Md5`] is what it compares.

use crate::error::{GenError, GenResult};
use crate::model::{ServiceSpec, StructSpec};
use crate::resolve::DependencyClosure;
use crate::types::TypeTable;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Digest used for compatibility hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha256,
}

impl HashAlgorithm {
    /// Lowercase hex digest of `data`.
    pub fn digest(self, data: &[u8]) -> String {
        match self {
            HashAlgorithm::Md5 => hex::encode(Md5::digest(data)),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        }
    }

    /// Number of hex characters in a digest.
    pub fn hex_len(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 32,
            HashAlgorithm::Sha256 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Md5 => write!(f, "md5"),
            HashAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}

/// A fixed-width lowercase hex digest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CompatibilityHash(String);

impl CompatibilityHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompatibilityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives canonical texts and hashes over resolved closures.
#[derive(Debug, Clone, Copy)]
pub struct HashDeriver<'a> {
    types: &'a TypeTable,
    algorithm: HashAlgorithm,
}

struct Frame<'s> {
    full_name: String,
    package: &'s str,
    spec: &'s StructSpec,
    next_field: usize,
}

impl<'a> HashDeriver<'a> {
    pub fn new(types: &'a TypeTable, algorithm: HashAlgorithm) -> Self {
        Self { types, algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash of `root` declared in `package`.
    pub fn compute_hash(
        &self,
        root: &StructSpec,
        package: &str,
        closure: &DependencyClosure,
    ) -> GenResult<CompatibilityHash> {
        let text = self.canonical_text(root, package, closure)?;
        Ok(self.hash_text(&text))
    }

    /// One hash over request and response.
    pub fn service_hash(
        &self,
        spec: &ServiceSpec,
        closure: &DependencyClosure,
    ) -> GenResult<CompatibilityHash> {
        let mut text = self.canonical_text(&spec.request, &spec.package, closure)?;
        text.push_str(&self.canonical_text(&spec.response, &spec.package, closure)?);
        Ok(self.hash_text(&text))
    }

    /// Hash of every closure entry, ordered by fully-qualified name.
    pub fn dependency_hashes(
        &self,
        closure: &DependencyClosure,
    ) -> GenResult<BTreeMap<String, CompatibilityHash>> {
        let ordered: BTreeMap<&str, _> = closure
            .iter()
            .map(|entry| (entry.full_name.as_str(), entry))
            .collect();

        ordered
            .into_iter()
            .map(|(name, entry)| {
                self.compute_hash(&entry.spec, &entry.package, closure)
                    .map(|hash| (name.to_string(), hash))
            })
            .collect()
    }

    /// Canonical text of `root`.
    ///
    /// Nested hashes are computed bottom-up with an explicit stack. A field
    /// whose type is still being rendered further up the stack closes a
    /// cycle and contributes that type's fully-qualified name instead of a
    /// hash.
    pub fn canonical_text(
        &self,
        root: &StructSpec,
        package: &str,
        closure: &DependencyClosure,
    ) -> GenResult<String> {
        let mut hashes: BTreeMap<String, String> = BTreeMap::new();
        let mut on_path: HashSet<String> = HashSet::new();

        let root_name = format!("{package}/{}", root.short_name);
        on_path.insert(root_name.clone());
        let mut stack = vec![Frame {
            full_name: root_name,
            package,
            spec: root,
            next_field: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            if let Some(field) = frame.spec.fields.get(frame.next_field) {
                frame.next_field += 1;
                let Some(full_name) = self.types.qualify(&field.type_name, frame.package) else {
                    continue;
                };
                if hashes.contains_key(&full_name) || on_path.contains(&full_name) {
                    continue;
                }
                let entry = closure
                    .get(&full_name)
                    .ok_or_else(|| GenError::UnresolvedType {
                        type_name: full_name.clone(),
                        referenced_from: frame.full_name.clone(),
                    })?;
                on_path.insert(full_name.clone());
                stack.push(Frame {
                    full_name,
                    package: &entry.package,
                    spec: &entry.spec,
                    next_field: 0,
                });
                continue;
            }

            let text = self.render(frame.spec, frame.package, &hashes);
            let full_name = frame.full_name.clone();
            stack.pop();
            on_path.remove(&full_name);

            if stack.is_empty() {
                return Ok(text);
            }
            hashes.insert(full_name, self.algorithm.digest(text.as_bytes()));
        }

        Ok(String::new())
    }

    fn render(
        &self,
        spec: &StructSpec,
        package: &str,
        hashes: &BTreeMap<String, String>,
    ) -> String {
        let constants = spec.constants.iter().map(|c| c.to_string());
        let fields = spec.fields.iter().map(|field| {
            match self.types.qualify(&field.type_name, package) {
                None => format!("{} {}", field.full_type(), field.name),
                Some(full_name) => match hashes.get(&full_name) {
                    Some(hash) => format!("{hash} {}", field.name),
                    None => format!("{full_name} {}", field.name),
                },
            }
        });
        constants.chain(fields).collect::<Vec<_>>().join("\n")
    }

    fn hash_text(&self, text: &str) -> CompatibilityHash {
        CompatibilityHash(self.algorithm.digest(text.as_bytes()))
    }
}
