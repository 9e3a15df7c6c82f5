//! Argument assembly for the configure, build and install phases.

use std::collections::BTreeMap;
use std::path::{MAIN_SEPARATOR, Path};

use serde::Serialize;

use crate::consts::{BUILD_TYPE_KEY, INSTALL_PREFIX_KEY, OSX_ARCHITECTURES_KEY, PARALLEL_LEVEL_KEY};
use crate::execute::resolver::ResolvedTarget;
use crate::execute::types::BuildError;
use crate::platform::os::Os;
use crate::toolchain::{CompilerFamily, Toolchain, num_cpus};

/// Generator names that build a single configuration per build tree.
const SINGLE_CONFIG_MARKERS: &[&str] = &["NMake", "Ninja", "Makefiles"];

/// Legacy Visual Studio generator names that already encode the architecture.
const ARCH_IN_GENERATOR_MARKERS: &[&str] = &["ARM", "Win64"];

/// Command-line arguments for the three phases of one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CmakeArgs {
  /// `<source_dir> [-A ..] [-G ..] -D<key>=<value>...`
  pub configure: Vec<String>,

  /// `--build . [--config <type>] -j<n>`
  pub build: Vec<String>,

  /// `--install . [--config <type>]`
  pub install: Vec<String>,

  /// Environment exported to the build and install phases.
  pub env: BTreeMap<String, String>,
}

/// Assemble the phase arguments for a resolved target.
///
/// Policy:
/// - build type: the target's own `CMAKE_BUILD_TYPE`, else `Debug`/`Release`
/// - generator: the target's, else the toolchain's; non-MSVC toolchains
///   prefer Ninja when it is installed
/// - MSVC with a Visual Studio generator gets `-A <arch>` unless the
///   generator name already carries one
/// - multi-config generators move the build type to `--config`
/// - macOS forwards `ARCHFLAGS` as `CMAKE_OSX_ARCHITECTURES`
/// - `-j`: `CMAKE_BUILD_PARALLEL_LEVEL` build arg, else the toolchain's
///   parallelism, else the host core count
/// - `CMAKE_INSTALL_PREFIX` is always the resolved install dir with a
///   trailing separator, whatever the target configured
///
/// # Errors
///
/// Returns [`BuildError::UnsupportedPlatform`] for an MSVC toolchain on a
/// non-Windows platform.
pub fn assemble(resolved: &ResolvedTarget<'_>, toolchain: &Toolchain) -> Result<CmakeArgs, BuildError> {
  let target = resolved.target;
  let mut defs = resolved.configure_args.clone();

  let mut configure = vec![target.source_dir().to_string_lossy().into_owned()];
  let mut build = vec!["--build".to_string(), ".".to_string()];
  let mut install = vec!["--install".to_string(), ".".to_string()];

  let build_type = defs
    .entry(BUILD_TYPE_KEY.to_string())
    .or_insert_with(|| toolchain.default_build_type().to_string())
    .clone();

  let mut generator = target
    .generator()
    .map(str::to_string)
    .or_else(|| toolchain.generator.clone());

  if toolchain.compiler == CompilerFamily::Msvc {
    if !toolchain.platform.is_windows() {
      return Err(BuildError::UnsupportedPlatform(format!(
        "msvc toolchain cannot target {}",
        toolchain.platform
      )));
    }

    let is_visual_studio = generator.as_deref().is_none_or(|g| g.contains("Visual Studio"));
    let has_arch = generator
      .as_deref()
      .is_some_and(|g| ARCH_IN_GENERATOR_MARKERS.iter().any(|m| g.contains(m)));

    if is_visual_studio && !has_arch {
      configure.push("-A".to_string());
      configure.push(toolchain.platform.arch.msvc_platform().to_string());
    }
  } else if generator.is_none() && toolchain.ninja_available {
    generator = Some("Ninja".to_string());
  }

  if is_multi_config(toolchain.compiler, generator.as_deref()) {
    defs.remove(BUILD_TYPE_KEY);
    for args in [&mut build, &mut install] {
      args.push("--config".to_string());
      args.push(build_type.clone());
    }
  }

  if let Some(generator) = generator {
    configure.push("-G".to_string());
    configure.push(generator);
  }

  if toolchain.platform.is_apple() {
    let archs = toolchain.osx_architectures();
    if !archs.is_empty() {
      defs.insert(OSX_ARCHITECTURES_KEY.to_string(), archs.join(";"));
    }
  }

  let jobs = match target.build_args().get(PARALLEL_LEVEL_KEY) {
    Some(level) => level.clone(),
    None => toolchain.parallel.unwrap_or_else(num_cpus).to_string(),
  };
  build.push(format!("-j{jobs}"));

  defs.insert(
    INSTALL_PREFIX_KEY.to_string(),
    with_trailing_separator(&resolved.install_dir),
  );

  configure.extend(defs.iter().map(|(key, value)| format!("-D{key}={value}")));

  Ok(CmakeArgs {
    configure,
    build,
    install,
    env: target.build_args().clone(),
  })
}

/// Whether the generator keeps every configuration in one build tree.
///
/// MSVC without an explicit generator defaults to Visual Studio, which is
/// multi-config; everything else without a generator defaults to Makefiles.
pub fn is_multi_config(compiler: CompilerFamily, generator: Option<&str>) -> bool {
  match generator {
    None => compiler == CompilerFamily::Msvc,
    Some(g) if g.contains("Multi-Config") => true,
    Some(g) => !SINGLE_CONFIG_MARKERS.iter().any(|m| g.contains(m)),
  }
}

fn with_trailing_separator(dir: &Path) -> String {
  let mut dir = dir.to_string_lossy().into_owned();
  if !dir.ends_with(MAIN_SEPARATOR) {
    dir.push(MAIN_SEPARATOR);
  }
  dir
}

#[cfg(test)]
#[cfg(not(windows))]
mod tests {
  use super::*;
  use crate::platform::Platform;
  use crate::platform::arch::Arch;
  use crate::target::BuildTarget;
  use std::path::PathBuf;

  fn toolchain(compiler: CompilerFamily, os: Os) -> Toolchain {
    Toolchain {
      compiler,
      debug: false,
      platform: Platform::new(Arch::X86_64, os),
      parallel: Some(6),
      generator: None,
      ninja_available: false,
      archflags: None,
      cmake: PathBuf::from("cmake"),
    }
  }

  fn resolved<'a>(target: &'a BuildTarget, defs: &[(&str, &str)]) -> ResolvedTarget<'a> {
    ResolvedTarget {
      target,
      install_dir: PathBuf::from("/work/build/lib/pkg"),
      work_dir: PathBuf::from("/work/build/temp/cmake_clib/dep"),
      configure_args: defs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    }
  }

  fn lib() -> BuildTarget {
    BuildTarget::library("dep", "/src/dep", "pkg").unwrap()
  }

  #[test]
  fn release_build_with_defaults() {
    let target = lib();
    let args = assemble(&resolved(&target, &[]), &toolchain(CompilerFamily::Gnu, Os::Linux)).unwrap();

    assert_eq!(
      args.configure,
      vec![
        "/src/dep",
        "-DCMAKE_BUILD_TYPE=Release",
        "-DCMAKE_INSTALL_PREFIX=/work/build/lib/pkg/",
      ]
    );
    assert_eq!(args.build, vec!["--build", ".", "-j6"]);
    assert_eq!(args.install, vec!["--install", "."]);
    assert!(args.env.is_empty());
  }

  #[test]
  fn debug_toolchain_selects_debug() {
    let target = lib();
    let mut tc = toolchain(CompilerFamily::Gnu, Os::Linux);
    tc.debug = true;
    let args = assemble(&resolved(&target, &[]), &tc).unwrap();
    assert!(args.configure.contains(&"-DCMAKE_BUILD_TYPE=Debug".to_string()));
  }

  #[test]
  fn explicit_build_type_wins() {
    let target = lib();
    let mut tc = toolchain(CompilerFamily::Gnu, Os::Linux);
    tc.debug = true;
    let args = assemble(&resolved(&target, &[("CMAKE_BUILD_TYPE", "RelWithDebInfo")]), &tc).unwrap();
    assert!(args.configure.contains(&"-DCMAKE_BUILD_TYPE=RelWithDebInfo".to_string()));
    assert!(!args.configure.contains(&"-DCMAKE_BUILD_TYPE=Debug".to_string()));
  }

  #[test]
  fn install_prefix_cannot_be_overridden() {
    let target = lib();
    let args = assemble(
      &resolved(&target, &[("CMAKE_INSTALL_PREFIX", "/usr/local")]),
      &toolchain(CompilerFamily::Gnu, Os::Linux),
    )
    .unwrap();

    let prefixes: Vec<_> = args
      .configure
      .iter()
      .filter(|a| a.starts_with("-DCMAKE_INSTALL_PREFIX="))
      .collect();
    assert_eq!(prefixes, vec!["-DCMAKE_INSTALL_PREFIX=/work/build/lib/pkg/"]);
  }

  #[test]
  fn ninja_preferred_when_available() {
    let target = lib();
    let mut tc = toolchain(CompilerFamily::Clang, Os::Linux);
    tc.ninja_available = true;
    let args = assemble(&resolved(&target, &[]), &tc).unwrap();
    assert_eq!(&args.configure[1..3], &["-G", "Ninja"]);
  }

  #[test]
  fn configured_generator_is_kept() {
    let target = lib();
    let mut tc = toolchain(CompilerFamily::Gnu, Os::Linux);
    tc.ninja_available = true;
    tc.generator = Some("Unix Makefiles".to_string());
    let args = assemble(&resolved(&target, &[]), &tc).unwrap();
    assert_eq!(&args.configure[1..3], &["-G", "Unix Makefiles"]);
  }

  #[test]
  fn target_generator_beats_toolchain_generator() {
    let target = lib().with_generator("Unix Makefiles");
    let mut tc = toolchain(CompilerFamily::Gnu, Os::Linux);
    tc.generator = Some("Ninja".to_string());
    let args = assemble(&resolved(&target, &[]), &tc).unwrap();
    assert_eq!(&args.configure[1..3], &["-G", "Unix Makefiles"]);
  }

  #[test]
  fn msvc_default_generator_gets_platform_and_config() {
    let target = lib();
    let mut tc = toolchain(CompilerFamily::Msvc, Os::Windows);
    tc.debug = true;
    let args = assemble(&resolved(&target, &[]), &tc).unwrap();

    assert_eq!(&args.configure[1..3], &["-A", "x64"]);
    assert!(!args.configure.iter().any(|a| a.starts_with("-DCMAKE_BUILD_TYPE")));
    assert_eq!(args.build, vec!["--build", ".", "--config", "Debug", "-j6"]);
    assert_eq!(args.install, vec!["--install", ".", "--config", "Debug"]);
  }

  #[test]
  fn msvc_never_switches_to_ninja() {
    let target = lib();
    let mut tc = toolchain(CompilerFamily::Msvc, Os::Windows);
    tc.ninja_available = true;
    let args = assemble(&resolved(&target, &[]), &tc).unwrap();
    assert!(!args.configure.contains(&"-G".to_string()));
  }

  #[test]
  fn msvc_legacy_generator_with_arch_gets_no_platform_flag() {
    let target = lib().with_generator("Visual Studio 15 2017 Win64");
    let args = assemble(&resolved(&target, &[]), &toolchain(CompilerFamily::Msvc, Os::Windows)).unwrap();

    assert!(!args.configure.contains(&"-A".to_string()));
    assert!(args.build.contains(&"--config".to_string()));
  }

  #[test]
  fn msvc_single_config_generator_is_handled_normally() {
    let target = lib().with_generator("NMake Makefiles");
    let args = assemble(&resolved(&target, &[]), &toolchain(CompilerFamily::Msvc, Os::Windows)).unwrap();

    assert!(!args.configure.contains(&"-A".to_string()));
    assert!(args.configure.contains(&"-DCMAKE_BUILD_TYPE=Release".to_string()));
    assert_eq!(args.install, vec!["--install", "."]);
  }

  #[test]
  fn msvc_on_linux_is_unsupported() {
    let target = lib();
    let result = assemble(&resolved(&target, &[]), &toolchain(CompilerFamily::Msvc, Os::Linux));
    assert!(matches!(result, Err(BuildError::UnsupportedPlatform(_))));
  }

  #[test]
  fn macos_forwards_archflags() {
    let target = lib();
    let mut tc = toolchain(CompilerFamily::Clang, Os::MacOs);
    tc.archflags = Some("-arch x86_64 -arch arm64".to_string());
    let args = assemble(&resolved(&target, &[]), &tc).unwrap();
    assert!(
      args
        .configure
        .contains(&"-DCMAKE_OSX_ARCHITECTURES=x86_64;arm64".to_string())
    );
  }

  #[test]
  fn archflags_ignored_off_macos() {
    let target = lib();
    let mut tc = toolchain(CompilerFamily::Gnu, Os::Linux);
    tc.archflags = Some("-arch arm64".to_string());
    let args = assemble(&resolved(&target, &[]), &tc).unwrap();
    assert!(!args.configure.iter().any(|a| a.contains("OSX_ARCHITECTURES")));
  }

  #[test]
  fn explicit_parallel_level_wins() {
    let target = lib().build_arg("CMAKE_BUILD_PARALLEL_LEVEL", "2").build_arg("VERBOSE", "1");
    let args = assemble(&resolved(&target, &[]), &toolchain(CompilerFamily::Gnu, Os::Linux)).unwrap();

    assert_eq!(args.build.last().map(String::as_str), Some("-j2"));
    assert_eq!(args.env.get("VERBOSE").map(String::as_str), Some("1"));
  }

  #[test]
  fn host_cores_when_no_parallelism_requested() {
    let target = lib();
    let mut tc = toolchain(CompilerFamily::Gnu, Os::Linux);
    tc.parallel = None;
    let args = assemble(&resolved(&target, &[]), &tc).unwrap();
    assert_eq!(args.build.last(), Some(&format!("-j{}", num_cpus())));
  }

  #[test]
  fn configure_definitions_pass_through() {
    let target = lib();
    let args = assemble(
      &resolved(&target, &[("fmt_ROOT", "/work/build/temp/prefix/fmt")]),
      &toolchain(CompilerFamily::Gnu, Os::Linux),
    )
    .unwrap();
    assert!(
      args
        .configure
        .contains(&"-Dfmt_ROOT=/work/build/temp/prefix/fmt".to_string())
    );
  }

  #[test]
  fn multi_config_classification() {
    assert!(is_multi_config(CompilerFamily::Msvc, None));
    assert!(!is_multi_config(CompilerFamily::Gnu, None));
    assert!(is_multi_config(CompilerFamily::Gnu, Some("Ninja Multi-Config")));
    assert!(is_multi_config(CompilerFamily::Clang, Some("Xcode")));
    assert!(!is_multi_config(CompilerFamily::Msvc, Some("Ninja")));
    assert!(is_multi_config(CompilerFamily::Msvc, Some("Visual Studio 17 2022")));
  }
}
