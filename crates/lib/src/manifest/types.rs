//! Plan file schema.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::BuildContext;
use crate::execute::types::BuildError;
use crate::placeholder::PathValue;
use crate::target::{BuildTarget, LibraryLink};
use crate::toolchain::ToolchainConfig;

/// The `[context]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextConfig {
  pub temp_dir: Option<PathBuf>,
  pub prefix_dir: Option<PathBuf>,
  pub develop_root: Option<PathBuf>,
}

/// One `[[target]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TargetSpec {
  Library {
    name: String,
    source: PathBuf,
    install_dir: PathValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    generator: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    configure: BTreeMap<String, PathValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    build: BTreeMap<String, String>,
  },
  Extension {
    /// Fully qualified dotted module name.
    name: String,
    source: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    install_dir: Option<PathValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    generator: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    configure: BTreeMap<String, PathValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    build: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    links: Vec<LibraryLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    auxiliary_files: Vec<PathBuf>,
  },
}

impl TargetSpec {
  /// Build the target, anchoring a relative source dir at `base_dir`.
  pub fn into_target(self, base_dir: &Path) -> Result<BuildTarget, BuildError> {
    match self {
      TargetSpec::Library {
        name,
        source,
        install_dir,
        generator,
        configure,
        build,
      } => {
        let target = BuildTarget::library(name, base_dir.join(source), install_dir)?;
        Ok(apply_common(target, generator, configure, build))
      }
      TargetSpec::Extension {
        name,
        source,
        install_dir,
        generator,
        configure,
        build,
        links,
        auxiliary_files,
      } => {
        let mut target = BuildTarget::extension(name, base_dir.join(source))?;
        if let Some(install_dir) = install_dir {
          target = target.with_install_dir(install_dir);
        }
        target = links.into_iter().fold(target, BuildTarget::with_link);
        target = auxiliary_files.into_iter().fold(target, BuildTarget::auxiliary_file);
        Ok(apply_common(target, generator, configure, build))
      }
    }
  }
}

fn apply_common(
  mut target: BuildTarget,
  generator: Option<String>,
  configure: BTreeMap<String, PathValue>,
  build: BTreeMap<String, String>,
) -> BuildTarget {
  if let Some(generator) = generator {
    target = target.with_generator(generator);
  }
  target = configure.into_iter().fold(target, |t, (k, v)| t.configure(k, v));
  build.into_iter().fold(target, |t, (k, v)| t.build_arg(k, v))
}

/// A plan file as written on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanFile {
  #[serde(default)]
  pub context: ContextConfig,

  #[serde(default)]
  pub toolchain: ToolchainConfig,

  /// Targets in build order.
  #[serde(default, rename = "target")]
  pub targets: Vec<TargetSpec>,
}

/// A loaded plan with every directory made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
  /// Directory of the plan file; relative paths were anchored here.
  pub base_dir: PathBuf,
  pub temp_dir: PathBuf,
  pub prefix_dir: PathBuf,
  pub develop_root: Option<PathBuf>,
  pub toolchain: ToolchainConfig,
  pub targets: Vec<BuildTarget>,
}

impl Plan {
  /// The build context for this plan's directories.
  pub fn context(&self) -> Result<BuildContext, BuildError> {
    BuildContext::new(&self.temp_dir, &self.prefix_dir)
  }
}
