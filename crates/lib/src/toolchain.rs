//! The ambient native toolchain a build runs against.
//!
//! A [`Toolchain`] is detected once per run from the host platform, the plan
//! file's `[toolchain]` table, and a few environment variables honoured by
//! the CMake ecosystem (`CMAKE_GENERATOR`, `CMAKE`, `ARCHFLAGS`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::execute::types::BuildError;
use crate::platform::Platform;
use crate::platform::os::Os;

/// Compiler family driving the generator policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerFamily {
  Gnu,
  Clang,
  /// The multi-config Windows toolchain (Visual Studio generators).
  Msvc,
}

impl CompilerFamily {
  /// The family a platform builds with when none is configured.
  pub fn default_for(os: Os) -> Self {
    match os {
      Os::Linux => Self::Gnu,
      Os::MacOs => Self::Clang,
      Os::Windows => Self::Msvc,
    }
  }
}

/// User-facing toolchain settings, as written in a plan file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainConfig {
  pub compiler: Option<CompilerFamily>,
  pub debug: bool,
  pub parallel: Option<usize>,
  pub generator: Option<String>,
  pub cmake: Option<PathBuf>,
}

/// A fully detected toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toolchain {
  pub compiler: CompilerFamily,
  pub debug: bool,
  pub platform: Platform,

  /// Requested build parallelism. `None` falls back to the host core count.
  pub parallel: Option<usize>,

  /// Explicit generator, if any.
  pub generator: Option<String>,

  /// Whether `ninja` is on `PATH`.
  pub ninja_available: bool,

  /// Raw `ARCHFLAGS` (`-arch x86_64 -arch arm64`), honoured on macOS.
  pub archflags: Option<String>,

  /// The cmake program.
  pub cmake: PathBuf,
}

impl Toolchain {
  /// Detect the toolchain for the host platform.
  ///
  /// # Errors
  ///
  /// Returns [`BuildError::UnsupportedPlatform`] if the host OS or
  /// architecture is unknown, or the compiler family cannot target it.
  pub fn detect(config: &ToolchainConfig) -> Result<Self, BuildError> {
    Self::for_platform(Platform::host()?, config)
  }

  /// Detect the toolchain for an explicit platform.
  pub fn for_platform(platform: Platform, config: &ToolchainConfig) -> Result<Self, BuildError> {
    let compiler = config.compiler.unwrap_or(CompilerFamily::default_for(platform.os));
    if compiler == CompilerFamily::Msvc && !platform.is_windows() {
      return Err(BuildError::UnsupportedPlatform(format!(
        "msvc toolchain cannot target {platform}"
      )));
    }

    let generator = config.generator.clone().or_else(|| env_var("CMAKE_GENERATOR"));

    let cmake = config
      .cmake
      .clone()
      .or_else(|| env_var("CMAKE").map(PathBuf::from))
      .or_else(|| which::which("cmake").ok())
      .unwrap_or_else(|| PathBuf::from("cmake"));

    let toolchain = Self {
      compiler,
      debug: config.debug,
      platform,
      parallel: config.parallel.filter(|&n| n > 0),
      generator,
      ninja_available: which::which("ninja").is_ok(),
      archflags: env_var("ARCHFLAGS"),
      cmake,
    };

    debug!(
      compiler = ?toolchain.compiler,
      platform = %toolchain.platform,
      generator = ?toolchain.generator,
      ninja = toolchain.ninja_available,
      cmake = %toolchain.cmake.display(),
      "detected toolchain"
    );

    Ok(toolchain)
  }

  /// `Debug` or `Release`, used when a target does not set its own build type.
  pub fn default_build_type(&self) -> &'static str {
    if self.debug { "Debug" } else { "Release" }
  }

  /// Architectures requested through `ARCHFLAGS`, or empty.
  pub fn osx_architectures(&self) -> Vec<String> {
    self.archflags.as_deref().map(parse_archflags).unwrap_or_default()
  }
}

/// Collect every `<name>` of `-arch <name>` pairs.
pub fn parse_archflags(flags: &str) -> Vec<String> {
  let mut archs = Vec::new();
  let mut words = flags.split_whitespace();

  while let Some(word) = words.next() {
    if word == "-arch"
      && let Some(arch) = words.next()
    {
      archs.push(arch.to_string());
    }
  }

  archs
}

/// Get the number of CPUs for default parallelism.
pub fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

fn env_var(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|v| !v.is_empty())
}
