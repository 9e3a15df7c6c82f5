//! Loader-relative runtime search paths for extension modules.
//!
//! An extension must find the shared libraries it links at load time no
//! matter whether it sits in the staged tree or in the source tree. Instead of
//! baking in absolute paths, the relative distance from the module's directory
//! to each library directory is encoded behind the platform's loader-origin
//! token (`$ORIGIN`, `@loader_path`).
//!
//! Results depend on the context's prefix dir, so they are computed per run
//! and never cached.

use std::path::{Path, PathBuf};

use crate::context::{BuildContext, normalize};
use crate::execute::types::BuildError;
use crate::platform::os::Os;
use crate::target::module_dir;

/// The runtime search path from one extension to one library directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rpath {
  /// Normalized relative path from the module's directory to the library
  /// directory. `.` when they are the same directory.
  pub offset: PathBuf,

  /// The offset behind the loader-origin token, or `None` on platforms
  /// without one (Windows searches beside the module instead).
  pub loader_path: Option<String>,
}

impl Rpath {
  /// The offset with `/` separators, as CMake expects.
  pub fn offset_string(&self) -> String {
    slash_path(&self.offset)
  }
}

/// Compute the rpath from an extension installed in `extension_dir` to
/// `library_dir`.
///
/// Both directories are resolved against the context, so relative paths are
/// anchored at its prefix dir.
///
/// # Errors
///
/// Returns [`BuildError::InvalidTarget`] when no relative path exists between
/// the two directories (different drives on Windows).
pub fn compute(extension_dir: &Path, library_dir: &Path, ctx: &BuildContext, os: Os) -> Result<Rpath, BuildError> {
  let ext_dir = ctx.resolve_path(extension_dir);
  let library_dir = ctx.resolve_path(library_dir);

  let offset = pathdiff::diff_paths(&library_dir, &ext_dir).ok_or_else(|| {
    BuildError::InvalidTarget(format!(
      "no relative path from {} to {}",
      ext_dir.display(),
      library_dir.display()
    ))
  })?;

  let mut offset = normalize(&offset);
  if offset.as_os_str().is_empty() {
    offset = PathBuf::from(".");
  }

  let loader_path = os.loader_origin().map(|origin| {
    if offset == Path::new(".") {
      origin.to_string()
    } else {
      format!("{}/{}", origin, slash_path(&offset))
    }
  });

  Ok(Rpath { offset, loader_path })
}

/// [`compute`] for an extension in its default location: the dotted name
/// minus its last segment, below the prefix dir.
pub fn for_module(extension_name: &str, library_dir: &Path, ctx: &BuildContext, os: Os) -> Result<Rpath, BuildError> {
  compute(&module_dir(extension_name), library_dir, ctx, os)
}

/// Cache variable carrying the relative offset to a linked library:
/// `libtcomplex` -> `LIBTCOMPLEX_RELPATH`.
pub fn relpath_key(library: &str) -> String {
  let stem: String = library
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
    .collect();
  format!("{stem}_RELPATH")
}

fn slash_path(path: &Path) -> String {
  path
    .components()
    .map(|c| c.as_os_str().to_string_lossy().into_owned())
    .collect::<Vec<_>>()
    .join("/")
}
