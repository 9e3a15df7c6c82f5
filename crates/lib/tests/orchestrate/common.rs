//! Shared helpers: an isolated workspace and a shell script standing in for
//! cmake.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use stagebuild_lib::cmake::ProcessRunner;
use stagebuild_lib::platform::Platform;
use stagebuild_lib::toolchain::{CompilerFamily, Toolchain};
use stagebuild_lib::{BuildContext, BuildError, BuildTarget, RunOptions, RunReport, execute_targets};
use tempfile::TempDir;

/// Records `<phase>|<cwd>|<args>` per call. Configure remembers the source
/// and prefix in the working directory; install drops a marker into the
/// prefix and copies `<source>/aux/*` there. A `fail-<phase>` file in the
/// source dir makes that phase exit 1.
const FAKE_CMAKE: &str = r#"#!/bin/sh
log="__LOG__"
case "$1" in
  --build) phase=build ;;
  --install) phase=install ;;
  *) phase=configure ;;
esac
echo "$phase|$PWD|$*" >> "$log"
echo "fake cmake $phase"

if [ "$phase" = configure ]; then
  printf %s "$1" > source.txt
  for arg in "$@"; do
    case "$arg" in
      -DCMAKE_INSTALL_PREFIX=*) printf %s "${arg#-DCMAKE_INSTALL_PREFIX=}" > prefix.txt ;;
    esac
  done
  echo fresh > CMakeCache.txt
fi

src=$(cat source.txt)
if [ -e "$src/fail-$phase" ]; then
  echo "forced $phase failure" >&2
  exit 1
fi

if [ "$phase" = install ]; then
  prefix=$(cat prefix.txt)
  mkdir -p "$prefix"
  touch "$prefix/installed.marker"
  if [ -d "$src/aux" ]; then
    cp "$src"/aux/* "$prefix"/
  fi
fi
exit 0
"#;

/// An isolated source tree, build directories, and fake cmake.
pub struct Workspace {
  _temp: TempDir,
  root: PathBuf,
  pub ctx: BuildContext,
  pub toolchain: Toolchain,
  log: PathBuf,
}

impl Workspace {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();

    let log = root.join("cmake.log");
    let cmake = root.join("fake-cmake");
    std::fs::write(&cmake, FAKE_CMAKE.replace("__LOG__", &log.to_string_lossy())).unwrap();
    std::fs::set_permissions(&cmake, std::fs::Permissions::from_mode(0o755)).unwrap();

    let ctx = BuildContext::new(root.join("build/temp"), root.join("build/lib")).unwrap();
    let platform = Platform::host().unwrap();
    let toolchain = Toolchain {
      compiler: CompilerFamily::default_for(platform.os),
      debug: false,
      platform,
      parallel: Some(2),
      generator: None,
      ninja_available: false,
      archflags: None,
      cmake,
    };

    Self {
      _temp: temp,
      root,
      ctx,
      toolchain,
      log,
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Create a source directory and return its path.
  pub fn source(&self, name: &str) -> PathBuf {
    let dir = self.root().join("src").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
  }

  pub fn write(&self, relative: &str, content: &str) -> PathBuf {
    let path = self.root().join(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Every fake cmake call so far, as `(phase, cwd, args)`.
  pub fn calls(&self) -> Vec<(String, PathBuf, String)> {
    let Ok(log) = std::fs::read_to_string(&self.log) else {
      return Vec::new();
    };
    log
      .lines()
      .map(|line| {
        let mut parts = line.splitn(3, '|');
        let phase = parts.next().unwrap().to_string();
        let cwd = PathBuf::from(parts.next().unwrap());
        let args = parts.next().unwrap_or_default().to_string();
        (phase, cwd, args)
      })
      .collect()
  }

  pub async fn run(&self, targets: &[BuildTarget], options: &RunOptions) -> Result<RunReport, BuildError> {
    execute_targets(targets, &self.ctx, &self.toolchain, &ProcessRunner, options).await
  }
}
