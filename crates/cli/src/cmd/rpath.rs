//! Implementation of the `stagebuild rpath` command.

use anyhow::Result;
use serde::Serialize;

use stagebuild_lib::TargetKind;
use stagebuild_lib::execute::resolver::Resolution;
use stagebuild_lib::rpath::relpath_key;

use super::PlanArgs;
use crate::output::{OutputFormat, print_field, print_json, print_link, print_note};

#[derive(Debug, Serialize)]
struct LinkRpath {
  extension: String,
  library: String,
  variable: String,
  offset: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  loader_path: Option<String>,
}

/// Print the offset and loader path from every extension to each library
/// it links, for the plan's current context. Links are checked exactly as
/// `build` checks them.
pub fn cmd_rpath(args: &PlanArgs, output: OutputFormat) -> Result<()> {
  let loaded = args.load()?;
  let targets = &loaded.plan.targets;
  let resolution = Resolution::new(targets, &loaded.ctx, loaded.toolchain.platform.os)?;

  let mut rows = Vec::new();
  for (index, ext) in targets.iter().enumerate() {
    if ext.kind() != TargetKind::Extension {
      continue;
    }
    for (link, rpath) in resolution.link_rpaths(index)? {
      rows.push(LinkRpath {
        extension: ext.name().to_string(),
        library: link.library.clone(),
        variable: relpath_key(&link.library),
        offset: rpath.offset_string(),
        loader_path: rpath.loader_path,
      });
    }
  }

  if output.is_json() {
    return print_json(&rows);
  }

  if rows.is_empty() {
    print_note("No extension links declared");
    return Ok(());
  }

  for row in &rows {
    print_link(&row.extension, &row.library);
    print_field(&row.variable, &row.offset);
    if let Some(loader_path) = &row.loader_path {
      print_field("rpath", loader_path);
    }
  }

  Ok(())
}
