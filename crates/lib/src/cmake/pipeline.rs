//! The configure, build and install sequence for one target.

use std::path::Path;

use tracing::{debug, info};

use super::args::assemble;
use super::runner::{CommandRunner, Invocation, Phase};
use crate::consts::CMAKE_CACHE_FILE;
use crate::execute::resolver::ResolvedTarget;
use crate::execute::types::BuildError;
use crate::toolchain::Toolchain;

/// Make sure the working directory exists and holds no stale cache.
///
/// An existing `CMakeCache.txt` pins the generator and prefix of an earlier
/// run, so it is removed before every configure.
pub fn prepare_work_dir(work_dir: &Path) -> Result<(), BuildError> {
  if work_dir.is_dir() {
    let cache = work_dir.join(CMAKE_CACHE_FILE);
    if cache.exists() {
      debug!(path = ?cache, "removing stale cmake cache");
      std::fs::remove_file(&cache)?;
    }
  } else {
    std::fs::create_dir_all(work_dir)?;
  }
  Ok(())
}

/// Run configure, build and install for a resolved target.
///
/// Phases run strictly in order inside the target's working directory. The
/// first phase that exits unsuccessfully stops the target with an error
/// naming that phase; later phases are not started.
pub async fn run_pipeline<R: CommandRunner>(
  resolved: &ResolvedTarget<'_>,
  toolchain: &Toolchain,
  runner: &R,
) -> Result<(), BuildError> {
  let name = resolved.target.name();
  prepare_work_dir(&resolved.work_dir)?;
  let args = assemble(resolved, toolchain)?;

  let phases = [
    (Phase::Configure, args.configure, Default::default()),
    (Phase::Build, args.build, args.env.clone()),
    (Phase::Install, args.install, args.env),
  ];

  for (phase, args, env) in phases {
    let invocation = Invocation {
      target: name.to_string(),
      phase,
      program: toolchain.cmake.clone(),
      args,
      cwd: resolved.work_dir.clone(),
      env,
    };

    match runner.run(&invocation).await? {
      Some(0) => debug!(name, %phase, "phase complete"),
      code => return Err(phase.failure(name, code)),
    }
  }

  info!(name, install_dir = ?resolved.install_dir, "installed");
  Ok(())
}
