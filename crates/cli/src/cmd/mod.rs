mod build;
mod env;
mod info;
mod plan;
mod rpath;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use stagebuild_lib::BuildContext;
use stagebuild_lib::manifest::{self, Plan};
use stagebuild_lib::toolchain::Toolchain;

pub use build::cmd_build;
pub use env::cmd_env;
pub use info::cmd_info;
pub use plan::cmd_plan;
pub use rpath::cmd_rpath;

/// Plan file and the settings that override it.
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
  /// Path to the plan file
  #[arg(default_value = "stagebuild.toml")]
  pub file: PathBuf,

  /// Scratch directory for per-target working directories
  #[arg(long, value_name = "DIR")]
  pub temp_dir: Option<PathBuf>,

  /// Root of the staged package tree
  #[arg(long, value_name = "DIR")]
  pub prefix_dir: Option<PathBuf>,

  /// Build with the Debug configuration
  #[arg(long)]
  pub debug: bool,

  /// Build parallelism (default: host core count)
  #[arg(short = 'j', long, value_name = "N")]
  pub parallel: Option<usize>,

  /// CMake generator to use
  #[arg(short = 'G', long)]
  pub generator: Option<String>,
}

/// A plan with command-line overrides applied, plus its toolchain and context.
pub struct Loaded {
  pub plan: Plan,
  pub toolchain: Toolchain,
  pub ctx: BuildContext,
}

impl PlanArgs {
  pub fn load(&self) -> Result<Loaded> {
    let mut plan =
      manifest::load(&self.file).with_context(|| format!("Failed to load plan: {}", self.file.display()))?;

    if let Some(dir) = &self.temp_dir {
      plan.temp_dir = cwd_absolute(dir)?;
    }
    if let Some(dir) = &self.prefix_dir {
      plan.prefix_dir = cwd_absolute(dir)?;
    }
    if self.debug {
      plan.toolchain.debug = true;
    }
    if self.parallel.is_some() {
      plan.toolchain.parallel = self.parallel;
    }
    if self.generator.is_some() {
      plan.toolchain.generator = self.generator.clone();
    }

    let toolchain = Toolchain::detect(&plan.toolchain).context("Failed to detect toolchain")?;
    let ctx = plan.context().context("Invalid build directories")?;

    Ok(Loaded { plan, toolchain, ctx })
  }
}

/// Make a command-line path absolute against the current directory.
fn cwd_absolute(path: &Path) -> Result<PathBuf> {
  let absolute = std::path::absolute(path).with_context(|| format!("Invalid path: {}", path.display()))?;
  Ok(dunce::simplified(&absolute).to_path_buf())
}
