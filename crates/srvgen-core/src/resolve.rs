//! Type resolution.
//!
//! Expands struct references into the flat [`DependencyClosure`] of every
//! type that influences wire compatibility. Resolution walks an explicit
//! worklist with a visited set keyed by fully-qualified name, so cyclic and
//! deeply nested graphs neither loop nor grow the call stack.
//!
//! Other packages' types come from a [`TypeSource`]:
//! - [`MemorySource`]: types registered in code
//! - [`PackagePathSource`]: `<root>/<pkg>/msg/<Type>.msg` under search roots

use crate::error::{GenError, GenResult};
use crate::model::{ServiceSpec, StructSpec};
use crate::parser::{PACKAGE_MARKERS, parse_message};
use crate::types::{TypeTable, split_qualified};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

const MAX_SEARCH_DEPTH: usize = 5;

/// Lookup of message types by package and name.
pub trait TypeSource {
    /// Load `package/name`; `Ok(None)` when the package or type does not exist.
    fn load(&self, types: &TypeTable, package: &str, name: &str) -> GenResult<Option<StructSpec>>;
}

/// A resolved dependency: the struct and where it lives.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedType {
    pub full_name: String,
    pub package: String,
    pub spec: StructSpec,
}

/// Every struct reachable from a root, deduplicated by fully-qualified name.
///
/// Entries keep first-encounter order of a depth-first walk over fields in
/// declaration order.
#[derive(Debug, Clone, Default)]
pub struct DependencyClosure {
    entries: Vec<ResolvedType>,
    index: HashMap<String, usize>,
}

impl DependencyClosure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.index.contains_key(full_name)
    }

    pub fn get(&self, full_name: &str) -> Option<&ResolvedType> {
        self.index.get(full_name).map(|&i| &self.entries[i])
    }

    /// Entries in first-encounter order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedType> {
        self.entries.iter()
    }

    /// Fully-qualified names in first-encounter order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.full_name.as_str()).collect()
    }

    /// Insert an entry; returns `false` if the name was already present.
    pub fn insert(&mut self, entry: ResolvedType) -> bool {
        if self.index.contains_key(&entry.full_name) {
            return false;
        }
        self.index
            .insert(entry.full_name.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }
}

/// Resolves struct references against a [`TypeSource`].
pub struct TypeResolver<'a> {
    types: &'a TypeTable,
    source: &'a dyn TypeSource,
}

impl<'a> TypeResolver<'a> {
    pub fn new(types: &'a TypeTable, source: &'a dyn TypeSource) -> Self {
        Self { types, source }
    }

    /// Resolve the closure of `root` as declared in `current_package`.
    pub fn resolve(
        &self,
        root: &StructSpec,
        current_package: &str,
    ) -> GenResult<DependencyClosure> {
        let mut closure = DependencyClosure::new();
        self.extend(&mut closure, root, current_package)?;
        Ok(closure)
    }

    /// Resolve request and response into one shared closure.
    pub fn resolve_service(&self, spec: &ServiceSpec) -> GenResult<DependencyClosure> {
        let mut closure = DependencyClosure::new();
        self.extend(&mut closure, &spec.request, &spec.package)?;
        self.extend(&mut closure, &spec.response, &spec.package)?;
        Ok(closure)
    }

    fn extend(
        &self,
        closure: &mut DependencyClosure,
        root: &StructSpec,
        package: &str,
    ) -> GenResult<()> {
        let root_name = format!("{package}/{}", root.short_name);

        // (referencing type, its package, referenced type name); popped LIFO
        // so fields are visited in declaration order.
        let mut pending: Vec<(String, String, String)> = root
            .fields
            .iter()
            .rev()
            .map(|f| (root_name.clone(), package.to_string(), f.type_name.clone()))
            .collect();

        while let Some((referenced_from, from_package, type_name)) = pending.pop() {
            let Some(full_name) = self.types.qualify(&type_name, &from_package) else {
                continue;
            };
            if closure.contains(&full_name) {
                continue;
            }

            let (dep_package, dep_name) =
                split_qualified(&full_name).ok_or_else(|| GenError::UnresolvedType {
                    type_name: full_name.clone(),
                    referenced_from: referenced_from.clone(),
                })?;

            let spec = self
                .source
                .load(self.types, dep_package, dep_name)?
                .ok_or_else(|| GenError::UnresolvedType {
                    type_name: full_name.clone(),
                    referenced_from: referenced_from.clone(),
                })?;

            tracing::trace!(%full_name, %referenced_from, "resolved dependency");

            pending.extend(spec.fields.iter().rev().map(|f| {
                (
                    full_name.clone(),
                    dep_package.to_string(),
                    f.type_name.clone(),
                )
            }));

            closure.insert(ResolvedType {
                full_name: full_name.clone(),
                package: dep_package.to_string(),
                spec,
            });
        }

        Ok(())
    }
}

/// Types registered in memory, keyed by fully-qualified name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    specs: HashMap<String, StructSpec>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `spec` under `package/<spec.short_name>`.
    pub fn insert(&mut self, package: &str, spec: StructSpec) {
        self.specs
            .insert(format!("{package}/{}", spec.short_name), spec);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, package: &str, spec: StructSpec) -> Self {
        self.insert(package, spec);
        self
    }

    /// Parse `text` as a message and register it.
    pub fn with_text(
        self,
        types: &TypeTable,
        package: &str,
        name: &str,
        text: &str,
    ) -> GenResult<Self> {
        let spec = parse_message(types, name, text)?;
        Ok(self.with(package, spec))
    }
}

impl TypeSource for MemorySource {
    fn load(&self, _types: &TypeTable, package: &str, name: &str) -> GenResult<Option<StructSpec>> {
        Ok(self.specs.get(&format!("{package}/{name}")).cloned())
    }
}

/// Message files found under package search roots.
#[derive(Debug, Clone, Default)]
pub struct PackagePathSource {
    packages: HashMap<String, PathBuf>,
}

impl PackagePathSource {
    /// Index the packages below `roots`. Earlier roots win on name clashes.
    pub fn new(roots: &[PathBuf]) -> Self {
        let mut packages = HashMap::new();
        for root in roots {
            index_packages(root, &mut packages);
        }
        tracing::debug!(count = packages.len(), "indexed packages");
        Self { packages }
    }

    /// Pin `package` to `dir`, overriding anything found on the search path.
    pub fn with_package(mut self, package: &str, dir: impl Into<PathBuf>) -> Self {
        self.packages.insert(package.to_string(), dir.into());
        self
    }

    /// Directory of `package`, if known.
    pub fn package_dir(&self, package: &str) -> Option<&Path> {
        self.packages.get(package).map(PathBuf::as_path)
    }
}

impl TypeSource for PackagePathSource {
    fn load(&self, types: &TypeTable, package: &str, name: &str) -> GenResult<Option<StructSpec>> {
        let Some(dir) = self.packages.get(package) else {
            return Ok(None);
        };
        let path = dir.join("msg").join(format!("{name}.msg"));
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).map_err(|source| GenError::Io {
            path: path.clone(),
            source,
        })?;
        parse_message(types, name, &text).map(Some)
    }
}

fn is_package_dir(dir: &Path) -> bool {
    PACKAGE_MARKERS.iter().any(|m| dir.join(m).is_file()) || dir.join("msg").is_dir()
}

/// Breadth-first walk below `root`; package directories are not descended.
fn index_packages(root: &Path, packages: &mut HashMap<String, PathBuf>) {
    let mut queue = VecDeque::from([(root.to_path_buf(), 0usize)]);

    while let Some((dir, depth)) = queue.pop_front() {
        if is_package_dir(&dir) {
            if let Some(name) = dir.file_name().and_then(|s| s.to_str()) {
                packages.entry(name.to_string()).or_insert_with(|| dir.clone());
            }
            continue;
        }
        if depth >= MAX_SEARCH_DEPTH {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut children: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .filter(|p| {
                p.file_name()
                    .and_then(|s| s.to_str())
                    .is_some_and(|s| !s.starts_with('.'))
            })
            .collect();
        children.sort();
        queue.extend(children.into_iter().map(|c| (c, depth + 1)));
    }
}

#[cfg(test)]
#[path = "resolve/resolve_tests.rs"]
mod resolve_tests;
