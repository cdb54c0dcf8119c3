//! Batch driver for `srvgen generate` and `srvgen check`

use crate::codegen::{JavaTarget, ServiceEmitter};
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use serde::Serialize;
use srvgen_core::{
    GenError, GenResult, GeneratorConfig, LoadedService, PACKAGE_PATH_ENV, PackagePathSource,
    TypeTable, load_service_file,
};
use std::path::{Path, PathBuf};

/// Options shared by both subcommands.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub config: GeneratorConfig,
    /// Extra package search roots from `-I`
    pub include: Vec<PathBuf>,
    /// `ROS_PACKAGE_PATH`-style list
    pub env_path: Option<String>,
}

impl BatchOptions {
    /// Options from a config file (or defaults) and the process environment.
    pub fn load(config: Option<&Path>, include: Vec<PathBuf>) -> Result<Self> {
        let config = GeneratorConfig::load(config).context("Failed to load configuration")?;
        Ok(Self {
            config,
            include,
            env_path: std::env::var(PACKAGE_PATH_ENV).ok(),
        })
    }

    fn search_roots(&self) -> Vec<PathBuf> {
        self.config.search_roots(&self.include, self.env_path.as_deref())
    }

    fn target(&self) -> JavaTarget {
        JavaTarget::new(
            &self.config.generator.java_package_prefix,
            &self.config.generator.runtime_package,
        )
    }
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub generated: Vec<PathBuf>,
    /// Schema files that failed, with the diagnostic
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Split `generate` arguments into schema files and an optional output root.
///
/// The last argument is the output root when it is a directory or does not
/// exist; otherwise every argument is a schema file.
pub fn split_output_root(args: &[PathBuf]) -> (Vec<PathBuf>, Option<PathBuf>) {
    match args.split_last() {
        Some((last, rest)) if args.len() > 1 && (!last.exists() || last.is_dir()) => {
            (rest.to_vec(), Some(last.clone()))
        }
        _ => (args.to_vec(), None),
    }
}

/// Generate bindings for `args` (schema files, optionally followed by an output root).
///
/// Per-file failures are logged and recorded; output write failures abort.
pub fn run(args: &[PathBuf], options: &BatchOptions) -> Result<BatchSummary> {
    let (files, root) = split_output_root(args);
    if files.is_empty() {
        anyhow::bail!("No schema files given");
    }

    let types = TypeTable::standard();
    let target = options.target();
    let roots = options.search_roots();
    let packages = PackagePathSource::new(&roots);
    let generator = &options.config.generator;
    let writer = OutputWriter::new(root, &generator.extension, &generator.java_package_prefix);
    let mut summary = BatchSummary::default();

    tracing::info!(
        files = files.len(),
        output_root = ?writer.root(),
        search_roots = roots.len(),
        "generating service bindings"
    );

    for file in &files {
        match generate_file(&types, &target, &packages, &writer, options, file) {
            Ok(path) => summary.generated.push(path),
            Err(err) if err.is_per_file() => {
                tracing::error!(file = %file.display(), code = err.error_code(), "{err}");
                summary.failed.push((file.clone(), err.to_string()));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to generate {}", file.display()));
            }
        }
    }

    tracing::info!(
        generated = summary.generated.len(),
        failed = summary.failed.len(),
        "done"
    );
    Ok(summary)
}

fn generate_file(
    types: &TypeTable,
    target: &JavaTarget,
    packages: &PackagePathSource,
    writer: &OutputWriter,
    options: &BatchOptions,
    file: &Path,
) -> GenResult<PathBuf> {
    let loaded = load_service_file(types, file)?;
    tracing::debug!(file = %file.display(), service = %loaded.spec.full_name(), "parsed schema");

    let source = source_for(packages, &loaded);
    let algorithm = options.config.generator.hash_algorithm;
    let emitter = ServiceEmitter::new(types, &source, target, algorithm);
    let binding = emitter.emit_service(&loaded.spec)?;

    let spec = &loaded.spec;
    let destination = writer.destination(&spec.package, &loaded.package_dir, &spec.short_name);
    writer.write(&destination, file, &binding.text)?;

    tracing::info!(
        service = %binding.analysis.full_name,
        hash = %binding.analysis.hash,
        dependencies = binding.analysis.closure.len(),
        path = %destination.display(),
        "generated"
    );
    Ok(destination)
}

/// Search path source with the service's own package pinned to its directory.
fn source_for(packages: &PackagePathSource, loaded: &LoadedService) -> PackagePathSource {
    packages
        .clone()
        .with_package(&loaded.spec.package, &loaded.package_dir)
}

/// One line of a `check` report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckEntry {
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of `srvgen check`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub algorithm: String,
    pub services: Vec<CheckEntry>,
}

impl CheckReport {
    pub fn failures(&self) -> usize {
        self.services.iter().filter(|e| e.error.is_some()).count()
    }

    /// `<full_name> <hash>` per service, or `<file>: error: <message>`.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.services {
            match (&entry.service, &entry.hash, &entry.error) {
                (Some(service), Some(hash), None) => out.push_str(&format!("{service} {hash}\n")),
                (_, _, Some(error)) => {
                    out.push_str(&format!("{}: error: {error}\n", entry.file.display()))
                }
                _ => {}
            }
        }
        out
    }
}

/// Parse, resolve and hash `files` without writing anything.
pub fn check(files: &[PathBuf], options: &BatchOptions) -> CheckReport {
    let types = TypeTable::standard();
    let target = options.target();
    let packages = PackagePathSource::new(&options.search_roots());
    let algorithm = options.config.generator.hash_algorithm;

    let services = files
        .iter()
        .map(|file| {
            let analyzed = load_service_file(&types, file).and_then(|loaded| {
                let source = source_for(&packages, &loaded);
                ServiceEmitter::new(&types, &source, &target, algorithm).analyze(&loaded.spec)
            });
            match analyzed {
                Ok(analysis) => CheckEntry {
                    file: file.clone(),
                    service: Some(analysis.full_name),
                    hash: Some(analysis.hash.to_string()),
                    dependencies: analysis.closure.names().into_iter().map(String::from).collect(),
                    error: None,
                },
                Err(err) => {
                    tracing::warn!(file = %file.display(), "{err}");
                    CheckEntry {
                        file: file.clone(),
                        service: None,
                        hash: None,
                        dependencies: Vec::new(),
                        error: Some(describe(&err)),
                    }
                }
            }
        })
        .collect();

    CheckReport {
        algorithm: algorithm.to_string(),
        services,
    }
}

fn describe(err: &GenError) -> String {
    format!("[{}] {err}", err.error_code())
}
