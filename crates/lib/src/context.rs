//! Build context and path resolution.
//!
//! A [`BuildContext`] holds the two directories that are only fixed once a
//! build run starts: the temp/scratch directory and the staged (or in-place)
//! library root. Every [`PathValue`] is turned into a concrete path against
//! one context through a single pure function, [`BuildContext::resolve`].

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::execute::types::BuildError;
use crate::placeholder::{PathToken, PathValue, TokenKind};
use crate::target::TargetKind;

/// The directories for one orchestrator run.
///
/// `temp_dir` and `prefix_dir` are absolute, normalized, and never nested in
/// one another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildContext {
  temp_dir: PathBuf,
  prefix_dir: PathBuf,
}

impl BuildContext {
  /// Create a context from two absolute directories.
  ///
  /// # Errors
  ///
  /// Returns [`BuildError::InvalidContext`] if either path is relative, or if
  /// the directories are equal or nested.
  pub fn new(temp_dir: impl AsRef<Path>, prefix_dir: impl AsRef<Path>) -> Result<Self, BuildError> {
    let (temp_dir, prefix_dir) = (temp_dir.as_ref(), prefix_dir.as_ref());

    for dir in [temp_dir, prefix_dir] {
      if !dir.is_absolute() {
        return Err(BuildError::InvalidContext(format!(
          "directory must be absolute: {}",
          dir.display()
        )));
      }
    }

    let temp_dir = normalize(temp_dir);
    let prefix_dir = normalize(prefix_dir);

    if temp_dir.starts_with(&prefix_dir) || prefix_dir.starts_with(&temp_dir) {
      return Err(BuildError::InvalidContext(format!(
        "temp dir {} and prefix dir {} overlap",
        temp_dir.display(),
        prefix_dir.display()
      )));
    }

    Ok(Self { temp_dir, prefix_dir })
  }

  pub fn temp_dir(&self) -> &Path {
    &self.temp_dir
  }

  pub fn prefix_dir(&self) -> &Path {
    &self.prefix_dir
  }

  /// Resolve any value to a normalized absolute path.
  ///
  /// Absolute literals are only normalized, relative literals are anchored at
  /// the prefix dir, and tokens are anchored at the directory they name.
  /// Resolving an already-resolved path returns it unchanged.
  pub fn resolve(&self, value: &PathValue) -> PathBuf {
    match value {
      PathValue::Concrete(s) => self.resolve_path(Path::new(s)),
      PathValue::Token(token) => self.resolve_token(token),
    }
  }

  pub fn resolve_token(&self, token: &PathToken) -> PathBuf {
    let base = match token.kind() {
      TokenKind::Temp => &self.temp_dir,
      TokenKind::Staged => &self.prefix_dir,
    };
    normalize(&base.join(token.offset()))
  }

  pub fn resolve_path(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      normalize(path)
    } else {
      normalize(&self.prefix_dir.join(path))
    }
  }

  /// Per-target working directory: `temp_dir/<namespace>/<name>`, normalized
  /// like every resolved path so the two compare component by component.
  pub fn work_dir(&self, kind: TargetKind, name: &str) -> PathBuf {
    normalize(&self.temp_dir.join(kind.namespace()).join(name))
  }
}

/// Lexically normalize a path: drop `.`, fold `..` into its parent, and
/// case-fold on case-insensitive filesystems. Never touches the filesystem.
///
/// A `..` that would climb above the root is dropped; on a relative path it
/// is kept.
pub fn normalize(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();

  for component in dunce::simplified(path).components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => match normalized.components().next_back() {
        Some(Component::Normal(_)) => {
          normalized.pop();
        }
        Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
        _ => normalized.push(".."),
      },
      other => normalized.push(other.as_os_str()),
    }
  }

  case_fold(normalized)
}

#[cfg(windows)]
fn case_fold(path: PathBuf) -> PathBuf {
  PathBuf::from(path.to_string_lossy().to_lowercase())
}

#[cfg(not(windows))]
fn case_fold(path: PathBuf) -> PathBuf {
  path
}
