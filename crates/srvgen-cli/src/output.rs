//! Output file placement and writing

use srvgen_core::{GenError, GenResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Places generated service bindings on disk.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: Option<PathBuf>,
    extension: String,
    /// Java package prefix as directories, e.g. `ros/pkg`
    prefix_dir: PathBuf,
}

impl OutputWriter {
    /// `root` is the shared output root; `None` writes next to each package
    /// under a source tree matching `package_prefix`.
    pub fn new(root: Option<PathBuf>, extension: impl Into<String>, package_prefix: &str) -> Self {
        Self {
            root,
            extension: extension.into(),
            prefix_dir: package_prefix.split('.').filter(|s| !s.is_empty()).collect(),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Destination of service `short_name` in `package`.
    ///
    /// `<root>/<package>/srv/<Short>.<ext>` with an output root, else
    /// `<package_dir>/srv_gen/<ext>/<prefix dirs>/<package>/srv/<Short>.<ext>`
    /// so the default tree is a source root for the generated Java package.
    pub fn destination(&self, package: &str, package_dir: &Path, short_name: &str) -> PathBuf {
        let base = match &self.root {
            Some(root) => root.clone(),
            None => package_dir
                .join("srv_gen")
                .join(&self.extension)
                .join(&self.prefix_dir),
        };
        base.join(package)
            .join("srv")
            .join(format!("{short_name}.{}", self.extension))
    }

    /// Write `text` to `destination` behind the generated-file marker,
    /// replacing any existing file.
    pub fn write(&self, destination: &Path, schema_path: &Path, text: &str) -> GenResult<()> {
        if let Some(dir) = destination.parent() {
            create_dir_tolerant(dir)?;
        }

        let mut content = marker(schema_path);
        content.push_str(text);
        fs::write(destination, content).map_err(|source| GenError::OutputWrite {
            path: destination.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %destination.display(), "wrote binding");
        Ok(())
    }
}

/// First line of every generated file.
pub fn marker(schema_path: &Path) -> String {
    format!(
        "/* Auto-generated by srvgen for file {} */\n\n",
        schema_path.display()
    )
}

/// Create `dir` and its parents; another process creating it first is fine.
fn create_dir_tolerant(dir: &Path) -> GenResult<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(source) => Err(GenError::OutputWrite {
            path: dir.to_path_buf(),
            source,
        }),
    }
}
