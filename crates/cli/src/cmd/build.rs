//! Implementation of the `stagebuild build` command.
//!
//! This command loads a plan file and configures, builds and installs every
//! target in declaration order.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use stagebuild_lib::cmake::ProcessRunner;
use stagebuild_lib::{RunOptions, execute_targets};

use super::{PlanArgs, cwd_absolute};
use crate::output::{print_note, print_summary};

/// Execute the build command.
///
/// In develop mode, auxiliary files of each extension are copied into the
/// source tree: `develop_root` if given, else the plan's `develop_root`,
/// else the plan file's directory.
pub fn cmd_build(args: &PlanArgs, develop: bool, develop_root: Option<PathBuf>) -> Result<()> {
  let loaded = args.load()?;
  let plan = &loaded.plan;

  let develop_root = match (develop, develop_root) {
    (false, _) => None,
    (true, Some(dir)) => Some(cwd_absolute(&dir)?),
    (true, None) => Some(plan.develop_root.clone().unwrap_or_else(|| plan.base_dir.clone())),
  };
  let options = RunOptions { develop_root };

  print_note(&format!(
    "Building {} target(s) into {}",
    plan.targets.len(),
    loaded.ctx.prefix_dir().display()
  ));

  let started = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(execute_targets(
      &plan.targets,
      &loaded.ctx,
      &loaded.toolchain,
      &ProcessRunner,
      &options,
    ))
    .context("Build failed")?;

  println!();
  print_summary(&report, started.elapsed(), options.develop_root.is_some());

  for target in &report.built {
    info!(name = %target.name, install_dir = %target.install_dir.display(), "installed");
  }

  Ok(())
}
