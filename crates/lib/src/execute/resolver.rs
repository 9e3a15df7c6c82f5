//! Per-target path substitution.
//!
//! Targets are declared with [`PathValue`]s whose tokens only become concrete
//! paths once a [`BuildContext`] exists. [`Resolution`] turns each target
//! into a [`ResolvedTarget`] for one context, checking that every token it
//! uses points into a directory owned by a target declared before it.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::INSTALL_RPATH_KEY;
use crate::context::{BuildContext, normalize};
use crate::execute::types::BuildError;
use crate::placeholder::{PathToken, PathValue};
use crate::platform::os::Os;
use crate::rpath::{self, Rpath, relpath_key};
use crate::target::{BuildTarget, LibraryLink, TargetKind};

/// A target with every path made concrete for one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget<'a> {
  pub target: &'a BuildTarget,
  pub install_dir: PathBuf,
  pub work_dir: PathBuf,
  /// Configure definitions with tokens substituted and rpath values injected.
  pub configure_args: BTreeMap<String, String>,
}

/// Resolves a declared target list against one context.
///
/// Built per run: nothing here is valid for another context.
#[derive(Debug)]
pub struct Resolution<'a> {
  targets: &'a [BuildTarget],
  ctx: &'a BuildContext,
  os: Os,
  install_dirs: Vec<PathBuf>,
  work_dirs: Vec<PathBuf>,
}

impl<'a> Resolution<'a> {
  /// # Errors
  ///
  /// Returns [`BuildError::DuplicateTarget`] if two targets share a name.
  pub fn new(targets: &'a [BuildTarget], ctx: &'a BuildContext, os: Os) -> Result<Self, BuildError> {
    let mut seen = HashSet::new();
    for target in targets {
      if !seen.insert(target.name()) {
        return Err(BuildError::DuplicateTarget(target.name().to_string()));
      }
    }

    Ok(Self {
      targets,
      ctx,
      os,
      install_dirs: targets.iter().map(|t| ctx.resolve(t.install_dir())).collect(),
      work_dirs: targets.iter().map(|t| ctx.work_dir(t.kind(), t.name())).collect(),
    })
  }

  pub fn targets(&self) -> &'a [BuildTarget] {
    self.targets
  }

  pub fn context(&self) -> &'a BuildContext {
    self.ctx
  }

  /// Resolve the target at `index` in declaration order.
  ///
  /// # Errors
  ///
  /// Returns [`BuildError::UnresolvedPathReference`] when a token points
  /// into a directory owned by a later target, or a link names a library
  /// that is unknown or declared later.
  ///
  /// # Panics
  ///
  /// Panics if `index` is out of bounds.
  pub fn resolve(&self, index: usize) -> Result<ResolvedTarget<'a>, BuildError> {
    let target = &self.targets[index];
    let mut configure_args = BTreeMap::new();

    for (key, value) in target.configure_args() {
      let resolved = match value {
        PathValue::Concrete(s) => s.clone(),
        PathValue::Token(token) => self.substitute(index, token)?,
      };
      configure_args.insert(key.clone(), resolved);
    }

    if target.kind() == TargetKind::Extension {
      self.inject_links(index, &mut configure_args)?;
    }

    Ok(ResolvedTarget {
      target,
      install_dir: self.install_dirs[index].clone(),
      work_dir: self.work_dirs[index].clone(),
      configure_args,
    })
  }

  fn substitute(&self, index: usize, token: &PathToken) -> Result<String, BuildError> {
    let path = self.ctx.resolve_token(token);

    if let Some(owner) = self.later_owner(index, &path) {
      return Err(BuildError::UnresolvedPathReference {
        target: self.targets[index].name().to_string(),
        reference: token.to_string(),
        dependency: self.targets[owner].name().to_string(),
      });
    }

    debug!(name = self.targets[index].name(), %token, path = ?path, "substituted token");
    Ok(path.to_string_lossy().into_owned())
  }

  /// The later target owning `path`, if the most specific owner comes
  /// after `index`.
  ///
  /// Library install dirs and every target's working dir count as owned
  /// areas; the deepest one containing `path` is its owner.
  fn later_owner(&self, index: usize, path: &Path) -> Option<usize> {
    let areas = self.targets.iter().enumerate().flat_map(|(i, target)| {
      let install = (target.kind() == TargetKind::Library).then(|| (i, &self.install_dirs[i]));
      install.into_iter().chain(std::iter::once((i, &self.work_dirs[i])))
    });

    let mut best: Option<(usize, usize)> = None;
    let mut later = None;

    for (i, area) in areas {
      if i == index || !path.starts_with(area) {
        continue;
      }
      let depth = area.components().count();
      match best {
        Some((_, d)) if d > depth => continue,
        Some((_, d)) if d == depth => {}
        _ => later = None,
      }
      best = Some((i, depth));
      if i > index {
        later = later.or(Some(i));
      }
    }

    later
  }

  /// The rpath from the extension at `index` to each library it links, in
  /// link order. Offsets start at the extension's resolved install dir.
  ///
  /// # Errors
  ///
  /// Returns [`BuildError::UnresolvedPathReference`] when a link names a
  /// library that is unknown or declared later.
  pub fn link_rpaths(&self, index: usize) -> Result<Vec<(&'a LibraryLink, Rpath)>, BuildError> {
    let target = &self.targets[index];

    target
      .links()
      .iter()
      .map(|link| {
        let library_dir = self.link_dir(index, link)?;
        let rpath = rpath::compute(&self.install_dirs[index], &library_dir, self.ctx, self.os)?;
        debug!(
          name = target.name(),
          library = %link.library,
          offset = %rpath.offset_string(),
          "computed rpath"
        );
        Ok((link, rpath))
      })
      .collect()
  }

  fn inject_links(&self, index: usize, configure_args: &mut BTreeMap<String, String>) -> Result<(), BuildError> {
    let mut loader_paths = Vec::new();

    for (link, rpath) in self.link_rpaths(index)? {
      configure_args
        .entry(relpath_key(&link.library))
        .or_insert_with(|| rpath.offset_string());
      loader_paths.extend(rpath.loader_path);
    }

    if !loader_paths.is_empty() && !self.targets[index].configure_args().contains_key(INSTALL_RPATH_KEY) {
      configure_args.insert(INSTALL_RPATH_KEY.to_string(), loader_paths.join(";"));
    }

    Ok(())
  }

  fn link_dir(&self, index: usize, link: &LibraryLink) -> Result<PathBuf, BuildError> {
    let position = self.targets[..index]
      .iter()
      .position(|t| t.kind() == TargetKind::Library && t.name() == link.library);

    let Some(position) = position else {
      return Err(BuildError::UnresolvedPathReference {
        target: self.targets[index].name().to_string(),
        reference: format!("link:{}", link.library),
        dependency: link.library.clone(),
      });
    };

    let dir = &self.install_dirs[position];
    Ok(match &link.subdir {
      Some(subdir) => normalize(&dir.join(subdir)),
      None => dir.clone(),
    })
  }
}
