//! The host a build runs on and targets.

pub mod arch;
pub mod os;

use std::fmt;

use serde::Serialize;

use crate::execute::types::BuildError;
use arch::Arch;
use os::Os;

/// Architecture and OS pair, written `<arch>-<os>` (`aarch64-darwin`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

impl Platform {
  pub fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// The platform of the running process.
  ///
  /// # Errors
  ///
  /// Returns [`BuildError::UnsupportedPlatform`] naming the raw host pair
  /// when either half has no mapping.
  pub fn host() -> Result<Self, BuildError> {
    match (Arch::current(), Os::current()) {
      (Some(arch), Some(os)) => Ok(Self { arch, os }),
      _ => Err(BuildError::UnsupportedPlatform(format!(
        "{}-{}",
        std::env::consts::ARCH,
        std::env::consts::OS
      ))),
    }
  }

  /// Whether CMake expects `CMAKE_OSX_ARCHITECTURES` here.
  pub fn is_apple(&self) -> bool {
    self.os == Os::MacOs
  }

  pub fn is_windows(&self) -> bool {
    self.os == Os::Windows
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.arch, self.os)
  }
}

impl Serialize for Platform {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}
