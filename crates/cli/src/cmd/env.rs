//! Implementation of the `stagebuild env` command.
//!
//! Prints shell assignments that put the plan's installed libraries on the
//! loader's search path, for running tests against an unstaged build.

use anyhow::{Result, bail};

use stagebuild_lib::TargetKind;
use stagebuild_lib::platform::os::Os;
use stagebuild_lib::runtime_env::library_env;

use super::PlanArgs;

pub fn cmd_env(args: &PlanArgs, libraries: &[String]) -> Result<()> {
  let loaded = args.load()?;
  let targets = &loaded.plan.targets;

  for name in libraries {
    if !targets.iter().any(|t| t.kind() == TargetKind::Library && t.name() == name) {
      bail!("Unknown library: {name}");
    }
  }

  let install_dirs: Vec<_> = targets
    .iter()
    .filter(|t| t.kind() == TargetKind::Library)
    .filter(|t| libraries.is_empty() || libraries.iter().any(|n| n == t.name()))
    .map(|t| loaded.ctx.resolve(t.install_dir()))
    .collect();

  let os = loaded.toolchain.platform.os;
  for (var, value) in library_env(&install_dirs, os)? {
    match os {
      Os::Windows => println!("$env:{var} = \"{value}\""),
      _ => println!("export {var}=\"{value}\""),
    }
  }

  Ok(())
}
