//! Build execution module.
//!
//! This module provides the main entry point for building a declared target
//! list. It handles:
//! - Sequential execution in declaration order
//! - Per-target path substitution and rpath injection
//! - Develop-mode synchronization of auxiliary files

pub mod develop;
pub mod resolver;
pub mod types;

use tracing::{error, info};

use crate::cmake::{CommandRunner, run_pipeline};
use crate::context::BuildContext;
use crate::target::{BuildTarget, TargetKind};
use crate::toolchain::Toolchain;

use develop::sync_auxiliary_files;
use resolver::Resolution;

pub use resolver::ResolvedTarget;
pub use types::{BuildError, BuiltTarget, RunOptions, RunReport};

/// Build every target in declaration order.
///
/// Declaration order is the dependency order: each target is resolved only
/// after every target before it has installed, and the first failure stops
/// the run. Targets already installed are left in place.
///
/// # Arguments
///
/// * `targets` - The targets to build, dependencies first
/// * `ctx` - Temp and prefix directories for this run
/// * `toolchain` - The detected toolchain
/// * `runner` - Executes the cmake invocations
/// * `options` - Develop-mode settings
pub async fn execute_targets<R: CommandRunner>(
  targets: &[BuildTarget],
  ctx: &BuildContext,
  toolchain: &Toolchain,
  runner: &R,
  options: &RunOptions,
) -> Result<RunReport, BuildError> {
  info!(target_count = targets.len(), "starting build");

  let resolution = Resolution::new(targets, ctx, toolchain.platform.os)?;
  let mut report = RunReport::default();

  for index in 0..targets.len() {
    let resolved = resolution.resolve(index).inspect_err(|e| {
      error!(name = targets[index].name(), error = %e, "resolution failed");
    })?;
    let target = resolved.target;

    info!(name = target.name(), kind = %target.kind(), "building target");

    run_pipeline(&resolved, toolchain, runner).await.inspect_err(|e| {
      error!(name = target.name(), error = %e, "target failed");
    })?;

    if target.kind() == TargetKind::Extension
      && let Some(develop_root) = &options.develop_root
    {
      let synced = sync_auxiliary_files(target, &resolved.install_dir, ctx.prefix_dir(), develop_root)?;
      report.synced.extend(synced);
    }

    report.built.push(BuiltTarget {
      name: target.name().to_string(),
      kind: target.kind(),
      install_dir: resolved.install_dir,
    });
  }

  info!(
    built = report.total(),
    libraries = report.libraries(),
    extensions = report.extensions(),
    synced = report.synced.len(),
    "build complete"
  );

  Ok(report)
}
