//! Plan files.
//!
//! A plan file is a TOML document declaring the build context, toolchain
//! settings, and the ordered target list:
//!
//! ```toml
//! [context]
//! temp_dir = "build/temp"
//! prefix_dir = "build/lib"
//!
//! [[target]]
//! kind = "library"
//! name = "dep_fmt"
//! source = "extern/fmt"
//! install_dir = "$${temp:prefix/fmt}"
//!
//! [[target]]
//! kind = "extension"
//! name = "pkg._core"
//! source = "src/ext"
//! configure = { fmt_ROOT = "$${temp:prefix/fmt}" }
//! ```

mod types;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::{DEFAULT_PREFIX_DIR, DEFAULT_TEMP_DIR};
use crate::context::normalize;
use crate::execute::types::BuildError;

pub use types::*;

/// Read and parse a plan file.
///
/// # Errors
///
/// Returns [`BuildError::Manifest`] if the file cannot be read or parsed,
/// and target construction errors for malformed targets.
pub fn load(path: &Path) -> Result<Plan, BuildError> {
  let content = std::fs::read_to_string(path).map_err(|e| BuildError::Manifest {
    path: path.to_path_buf(),
    message: e.to_string(),
  })?;

  let path = normalize(&std::path::absolute(path)?);
  let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
  parse(&content, &base_dir, &path)
}

/// Parse plan file content, anchoring relative paths at `base_dir`.
pub fn parse(content: &str, base_dir: &Path, origin: &Path) -> Result<Plan, BuildError> {
  let file: PlanFile = toml::from_str(content).map_err(|e| BuildError::Manifest {
    path: origin.to_path_buf(),
    message: e.to_string(),
  })?;

  let context = file.context;
  let temp_dir = context.temp_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_TEMP_DIR));
  let prefix_dir = context.prefix_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_PREFIX_DIR));

  let targets = file
    .targets
    .into_iter()
    .map(|spec| spec.into_target(base_dir))
    .collect::<Result<Vec<_>, _>>()?;

  debug!(path = ?origin, targets = targets.len(), "loaded plan");

  Ok(Plan {
    base_dir: base_dir.to_path_buf(),
    temp_dir: anchor(base_dir, &temp_dir),
    prefix_dir: anchor(base_dir, &prefix_dir),
    develop_root: context.develop_root.map(|p| anchor(base_dir, &p)),
    toolchain: file.toolchain,
    targets,
  })
}

fn anchor(base_dir: &Path, path: &Path) -> PathBuf {
  normalize(&base_dir.join(path))
}
