//! Implementation of the `stagebuild plan` command.
//!
//! This command resolves every target against the build context exactly as
//! `build` would, and prints the result without running cmake.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use stagebuild_lib::TargetKind;
use stagebuild_lib::cmake::{Phase, assemble};
use stagebuild_lib::execute::resolver::Resolution;

use super::PlanArgs;
use crate::output::{OutputFormat, print_field, print_json, print_note, print_phase, print_target};

#[derive(Debug, Serialize)]
struct PlanOutput {
  platform: String,
  temp_dir: PathBuf,
  prefix_dir: PathBuf,
  targets: Vec<PlannedTarget>,
}

#[derive(Debug, Serialize)]
struct PlannedTarget {
  name: String,
  kind: TargetKind,
  install_dir: PathBuf,
  work_dir: PathBuf,
  configure: Vec<String>,
  build: Vec<String>,
  install: Vec<String>,
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  env: BTreeMap<String, String>,
}

pub fn cmd_plan(args: &PlanArgs, output: OutputFormat) -> Result<()> {
  let loaded = args.load()?;
  let resolution = Resolution::new(&loaded.plan.targets, &loaded.ctx, loaded.toolchain.platform.os)?;

  let mut targets = Vec::new();
  for index in 0..loaded.plan.targets.len() {
    let resolved = resolution.resolve(index)?;
    let name = resolved.target.name();
    let cmake = assemble(&resolved, &loaded.toolchain).with_context(|| format!("Cannot plan target '{name}'"))?;

    targets.push(PlannedTarget {
      name: name.to_string(),
      kind: resolved.target.kind(),
      install_dir: resolved.install_dir,
      work_dir: resolved.work_dir,
      configure: cmake.configure,
      build: cmake.build,
      install: cmake.install,
      env: cmake.env,
    });
  }

  let plan = PlanOutput {
    platform: loaded.toolchain.platform.to_string(),
    temp_dir: loaded.ctx.temp_dir().to_path_buf(),
    prefix_dir: loaded.ctx.prefix_dir().to_path_buf(),
    targets,
  };

  if output.is_json() {
    return print_json(&plan);
  }

  let cmake = loaded.toolchain.cmake.display().to_string();
  print_note(&format!("Plan for {} ({} target(s))", plan.platform, plan.targets.len()));
  print_field("Temp dir", plan.temp_dir.display());
  print_field("Prefix dir", plan.prefix_dir.display());

  for target in &plan.targets {
    println!();
    print_target(&target.name, target.kind);
    print_field("Install dir", target.install_dir.display());
    print_field("Work dir", target.work_dir.display());
    for (phase, args) in [
      (Phase::Configure, &target.configure),
      (Phase::Build, &target.build),
      (Phase::Install, &target.install),
    ] {
      print_phase(phase, &cmake, args);
    }
    for (key, value) in &target.env {
      print_field("env", format!("{key}={value}"));
    }
  }

  Ok(())
}
