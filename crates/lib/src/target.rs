//! Declarative build targets.
//!
//! A [`BuildTarget`] describes one CMake project: where its sources live,
//! where it installs, and which cache definitions it is configured with.
//! Targets are immutable once built and carry no context-specific state, so
//! the same list can be resolved against a staged run and an in-place run.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{EXTENSION_NAMESPACE, LIBRARY_NAMESPACE};
use crate::context::normalize;
use crate::execute::types::BuildError;
use crate::placeholder::{PathToken, PathValue};

/// What a target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
  /// A shared/static library installed into its own prefix.
  Library,
  /// A loadable extension module named by a dotted path.
  Extension,
}

impl TargetKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      TargetKind::Library => "library",
      TargetKind::Extension => "extension",
    }
  }

  /// Working-directory namespace under the temp dir.
  pub fn namespace(&self) -> &'static str {
    match self {
      TargetKind::Library => LIBRARY_NAMESPACE,
      TargetKind::Extension => EXTENSION_NAMESPACE,
    }
  }
}

impl fmt::Display for TargetKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// An extension's runtime dependency on an earlier library target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryLink {
  /// Name of the library target.
  pub library: String,

  /// Directory below the library's install dir holding the shared objects
  /// (for example `lib`). Defaults to the install dir itself.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subdir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Payload {
  Library,
  Extension {
    links: Vec<LibraryLink>,
    auxiliary_files: Vec<PathBuf>,
  },
}

/// One native build unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
  name: String,
  source_dir: PathBuf,
  install_dir: PathValue,
  generator: Option<String>,
  configure_args: BTreeMap<String, PathValue>,
  build_args: BTreeMap<String, String>,
  payload: Payload,
}

impl BuildTarget {
  /// Declare a library that installs into `install_dir`.
  ///
  /// # Errors
  ///
  /// Returns an error if the name is empty, is `.`/`..` or contains a path
  /// separator, or if the source dir cannot be made absolute.
  pub fn library(
    name: impl Into<String>,
    source_dir: impl AsRef<Path>,
    install_dir: impl Into<PathValue>,
  ) -> Result<Self, BuildError> {
    let name = name.into();
    validate_library_name(&name)?;

    Ok(Self {
      name,
      source_dir: absolute_source(source_dir.as_ref())?,
      install_dir: install_dir.into(),
      generator: None,
      configure_args: BTreeMap::new(),
      build_args: BTreeMap::new(),
      payload: Payload::Library,
    })
  }

  /// Declare an extension module by its fully qualified dotted name.
  ///
  /// The install dir is the staged root joined with every segment but the
  /// last, e.g. `pkg.ext._core` installs into `$${staged:pkg/ext}`.
  ///
  /// # Errors
  ///
  /// Returns an error if a dotted segment is empty or contains a path
  /// separator, or if the source dir cannot be made absolute.
  pub fn extension(name: impl Into<String>, source_dir: impl AsRef<Path>) -> Result<Self, BuildError> {
    let name = name.into();
    validate_dotted_name(&name)?;
    let install_dir = PathToken::staged(module_dir(&name))?;

    Ok(Self {
      source_dir: absolute_source(source_dir.as_ref())?,
      install_dir: install_dir.into(),
      name,
      generator: None,
      configure_args: BTreeMap::new(),
      build_args: BTreeMap::new(),
      payload: Payload::Extension {
        links: Vec::new(),
        auxiliary_files: Vec::new(),
      },
    })
  }

  /// Add a configure-time cache definition (`-D<key>=<value>`).
  pub fn configure(mut self, key: impl Into<String>, value: impl Into<PathValue>) -> Self {
    self.configure_args.insert(key.into(), value.into());
    self
  }

  /// Add a build-time setting, exported to the build and install phases.
  pub fn build_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.build_args.insert(key.into(), value.into());
    self
  }

  /// Force a CMake generator for this target.
  pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
    self.generator = Some(generator.into());
    self
  }

  /// Override the install dir. Extensions normally keep the derived one.
  pub fn with_install_dir(mut self, install_dir: impl Into<PathValue>) -> Self {
    self.install_dir = install_dir.into();
    self
  }

  /// Link an extension against an earlier library. Ignored for libraries.
  pub fn link(self, library: impl Into<String>, subdir: Option<&str>) -> Self {
    self.with_link(LibraryLink {
      library: library.into(),
      subdir: subdir.map(PathBuf::from),
    })
  }

  pub fn with_link(mut self, link: LibraryLink) -> Self {
    if let Payload::Extension { links, .. } = &mut self.payload {
      links.push(link);
    }
    self
  }

  /// Declare a file copied beside the in-place module in develop mode.
  /// Ignored for libraries.
  pub fn auxiliary_file(mut self, file: impl Into<PathBuf>) -> Self {
    if let Payload::Extension { auxiliary_files, .. } = &mut self.payload {
      auxiliary_files.push(file.into());
    }
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn kind(&self) -> TargetKind {
    match self.payload {
      Payload::Library => TargetKind::Library,
      Payload::Extension { .. } => TargetKind::Extension,
    }
  }

  pub fn source_dir(&self) -> &Path {
    &self.source_dir
  }

  pub fn install_dir(&self) -> &PathValue {
    &self.install_dir
  }

  pub fn generator(&self) -> Option<&str> {
    self.generator.as_deref()
  }

  pub fn configure_args(&self) -> &BTreeMap<String, PathValue> {
    &self.configure_args
  }

  pub fn build_args(&self) -> &BTreeMap<String, String> {
    &self.build_args
  }

  pub fn links(&self) -> &[LibraryLink] {
    match &self.payload {
      Payload::Library => &[],
      Payload::Extension { links, .. } => links,
    }
  }

  pub fn auxiliary_files(&self) -> &[PathBuf] {
    match &self.payload {
      Payload::Library => &[],
      Payload::Extension { auxiliary_files, .. } => auxiliary_files,
    }
  }
}

/// Directory part of a dotted module name: `a.b.c` -> `a/b`.
pub fn module_dir(dotted_name: &str) -> PathBuf {
  let mut segments: Vec<&str> = dotted_name.split('.').collect();
  segments.pop();
  segments.iter().collect()
}

/// A library name is one directory below its work-dir namespace.
fn validate_library_name(name: &str) -> Result<(), BuildError> {
  if name.is_empty() {
    return Err(BuildError::InvalidTarget("target name is empty".to_string()));
  }
  if matches!(name, "." | "..") || name.contains(['/', '\\']) {
    return Err(BuildError::InvalidTarget(format!("invalid library name '{name}'")));
  }
  Ok(())
}

fn validate_dotted_name(name: &str) -> Result<(), BuildError> {
  let bad = name.is_empty()
    || name
      .split('.')
      .any(|segment| segment.is_empty() || segment.contains(['/', '\\']) || segment == "..");
  if bad {
    return Err(BuildError::InvalidTarget(format!("invalid extension name '{name}'")));
  }
  Ok(())
}

fn absolute_source(source_dir: &Path) -> Result<PathBuf, BuildError> {
  Ok(normalize(&std::path::absolute(source_dir)?))
}
