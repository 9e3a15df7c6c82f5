//! Develop-mode synchronization of auxiliary files.
//!
//! After an extension installs into the staged tree, the shared libraries it
//! ships beside itself are copied next to the in-place module so the source
//! tree can import it without a full install.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::context::normalize;
use crate::execute::types::BuildError;
use crate::target::{BuildTarget, module_dir};

/// Copy an extension's auxiliary files from `staged_dir` into the matching
/// directory under `develop_root`.
///
/// The destination keeps the staged dir's position below `prefix_dir`; a
/// staged dir outside the prefix falls back to the dotted name's directory.
/// Files missing from the staged output are optional and skipped. Returns the
/// destination paths that were written.
pub fn sync_auxiliary_files(
  target: &BuildTarget,
  staged_dir: &Path,
  prefix_dir: &Path,
  develop_root: &Path,
) -> Result<Vec<PathBuf>, BuildError> {
  let relative = staged_dir
    .strip_prefix(prefix_dir)
    .map(Path::to_path_buf)
    .unwrap_or_else(|_| module_dir(target.name()));
  let dest_dir = develop_root.join(relative);
  let mut synced = Vec::new();

  for file in target.auxiliary_files() {
    let src = staged_dir.join(file);
    let dest = dest_dir.join(file);

    if !src.is_file() {
      warn!(name = target.name(), file = ?src, "auxiliary file not found, skipping");
      continue;
    }

    if normalize(&src) == normalize(&dest) {
      debug!(name = target.name(), file = ?src, "auxiliary file already in place");
      continue;
    }

    if let Some(parent) = dest.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(&src, &dest)?;
    debug!(name = target.name(), from = ?src, to = ?dest, "synced auxiliary file");
    synced.push(dest);
  }

  if !synced.is_empty() {
    info!(name = target.name(), count = synced.len(), "synced auxiliary files");
  }

  Ok(synced)
}
