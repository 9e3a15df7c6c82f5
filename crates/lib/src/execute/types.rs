//! Types for build execution.
//!
//! This module defines the error type, run options, and the report returned
//! by a successful run.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::placeholder::PlaceholderError;
use crate::target::TargetKind;

/// Errors that can occur while orchestrating a build.
#[derive(Debug, Error)]
pub enum BuildError {
  /// `cmake <source>` exited unsuccessfully. `code` is `None` when the
  /// process was terminated by a signal.
  #[error("configure failed for '{target}' with exit code {code:?}")]
  ConfigureFailed { target: String, code: Option<i32> },

  /// `cmake --build` exited unsuccessfully.
  #[error("build failed for '{target}' with exit code {code:?}")]
  BuildFailed { target: String, code: Option<i32> },

  /// `cmake --install` exited unsuccessfully.
  #[error("install failed for '{target}' with exit code {code:?}")]
  InstallFailed { target: String, code: Option<i32> },

  /// A target refers to a path owned by a target that is not built before it.
  #[error("'{target}' references '{reference}' before '{dependency}' has been built")]
  UnresolvedPathReference {
    target: String,
    reference: String,
    dependency: String,
  },

  /// The host or requested platform cannot be built for.
  #[error("unsupported platform: {0}")]
  UnsupportedPlatform(String),

  /// Two targets share a name.
  #[error("duplicate target name: {0}")]
  DuplicateTarget(String),

  /// The temp and prefix directories are unusable.
  #[error("invalid build context: {0}")]
  InvalidContext(String),

  /// A target declaration is malformed.
  #[error("invalid target: {0}")]
  InvalidTarget(String),

  /// The plan file could not be read or parsed.
  #[error("invalid plan file {path}: {message}")]
  Manifest { path: PathBuf, message: String },

  /// A path token could not be parsed.
  #[error("placeholder error: {0}")]
  Placeholder(#[from] PlaceholderError),

  /// I/O error during execution.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Per-run options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
  /// In develop mode, the package root that auxiliary files are copied
  /// into after each extension builds.
  pub develop_root: Option<PathBuf>,
}

/// A target that was configured, built and installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltTarget {
  pub name: String,
  pub kind: TargetKind,
  pub install_dir: PathBuf,
}

/// Result of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
  /// Targets in the order they were built.
  pub built: Vec<BuiltTarget>,

  /// Files copied into the source tree by develop mode.
  pub synced: Vec<PathBuf>,
}

impl RunReport {
  pub fn total(&self) -> usize {
    self.built.len()
  }

  pub fn libraries(&self) -> usize {
    self.count(TargetKind::Library)
  }

  pub fn extensions(&self) -> usize {
    self.count(TargetKind::Extension)
  }

  fn count(&self, kind: TargetKind) -> usize {
    self.built.iter().filter(|t| t.kind == kind).count()
  }
}
