//! Runtime library search paths.
//!
//! Helpers for running something against freshly installed libraries before
//! their rpaths are in effect, such as a test binary or an interpreter
//! importing an in-place extension.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::execute::types::BuildError;
use crate::platform::os::Os;

/// Subdirectories probed for shared libraries, in order.
const LIB_SUBDIRS: &[&str] = &["lib64", "lib"];

/// The directory holding a library's shared objects: `lib64` or `lib` under
/// `install_dir` if either exists, else `install_dir` itself.
pub fn locate_lib_dir(install_dir: &Path) -> PathBuf {
  LIB_SUBDIRS
    .iter()
    .map(|sub| install_dir.join(sub))
    .find(|dir| dir.is_dir())
    .unwrap_or_else(|| install_dir.to_path_buf())
}

/// Prepend `dir` to the search-path variable `var` in `env`.
///
/// The current value is taken from `env`, falling back to the process
/// environment. An entry equal to `dir` is not added twice.
///
/// # Errors
///
/// Returns [`BuildError::InvalidTarget`] if `dir` contains the platform's
/// path-list separator.
pub fn prepend_path(env: &mut BTreeMap<String, String>, var: &str, dir: &Path) -> Result<(), BuildError> {
  let current: OsString = match env.get(var) {
    Some(value) => value.into(),
    None => std::env::var_os(var).unwrap_or_default(),
  };

  let existing: Vec<PathBuf> = std::env::split_paths(&current)
    .filter(|p| !p.as_os_str().is_empty())
    .collect();
  if existing.iter().any(|p| p == dir) {
    env.insert(var.to_string(), current.to_string_lossy().into_owned());
    return Ok(());
  }

  let joined = std::env::join_paths(std::iter::once(dir.to_path_buf()).chain(existing))
    .map_err(|e| BuildError::InvalidTarget(format!("cannot add {} to {var}: {e}", dir.display())))?;
  env.insert(var.to_string(), joined.to_string_lossy().into_owned());
  Ok(())
}

/// Environment additions that make each library in `install_dirs` loadable
/// on `os`, later entries taking precedence.
pub fn library_env(install_dirs: &[PathBuf], os: Os) -> Result<BTreeMap<String, String>, BuildError> {
  let var = os.library_path_var();
  let mut env = BTreeMap::new();
  for install_dir in install_dirs {
    prepend_path(&mut env, var, &locate_lib_dir(install_dir))?;
  }
  Ok(env)
}
